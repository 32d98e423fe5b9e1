//! Query-dialect parsers
//!
//! Raw connector bytes are interpreted under one of three dialects, selected
//! by the declared response type: dotted-path JSON, CSS selectors over HTML,
//! or an XPath 1.0 subset. A [`Document`] is a parsed scope exposing the three
//! primitives the evaluator needs: scalar extraction, scope narrowing and
//! sequence resolution.

pub mod html;
pub mod json;
pub mod xpath;

use bytes::Bytes;

use crate::config::ResponseType;
use crate::{Error, Result};

/// A parsed scope under one query dialect.
///
/// Scopes are owned values so array items and object fields can be evaluated
/// concurrently; HTML scopes carry the fragment text and re-parse on access,
/// which keeps them `Send` at the cost of repeating the (CPU-only) parse.
#[derive(Debug, Clone)]
pub enum Document {
    /// Parsed JSON document
    Json(serde_json::Value),
    /// HTML text, queried with CSS selectors
    Html(String),
    /// HTML/XML text, queried with XPath
    Xpath(String),
}

impl Document {
    /// Interpret raw bytes under the declared response type.
    ///
    /// Malformed JSON is a parse error; the HTML dialects accept any bytes
    /// (lossy UTF-8) and let selectors decide what matches.
    pub fn parse(response_type: ResponseType, body: &Bytes) -> Result<Self> {
        match response_type {
            ResponseType::Json => serde_json::from_slice(body)
                .map(Self::Json)
                .map_err(|e| Error::parse(format!("invalid json body: {e}"))),
            ResponseType::Html => Ok(Self::Html(String::from_utf8_lossy(body).into_owned())),
            ResponseType::Xpath => Ok(Self::Xpath(String::from_utf8_lossy(body).into_owned())),
        }
    }

    /// Raw text at `path`; `None` when the path selects nothing.
    ///
    /// An empty path selects the whole scope.
    pub fn scalar(&self, path: &str) -> Option<String> {
        match self {
            Self::Json(value) => json::scalar(value, path),
            Self::Html(text) => html::scalar(text, path),
            Self::Xpath(text) => xpath::scalar(text, path),
        }
    }

    /// Narrow the scope for a nested object. A path that selects nothing
    /// yields an empty scope of the same dialect.
    pub fn scoped(&self, path: &str) -> Self {
        if path.is_empty() {
            return self.clone();
        }
        match self {
            Self::Json(value) => {
                Self::Json(json::resolve(value, path).unwrap_or(serde_json::Value::Null))
            }
            Self::Html(text) => Self::Html(html::scoped(text, path).unwrap_or_default()),
            Self::Xpath(text) => Self::Xpath(xpath::scoped(text, path).unwrap_or_default()),
        }
    }

    /// Resolve `root_path` to the item sequence of an array model.
    ///
    /// An empty path means the whole document; a missing path yields an empty
    /// sequence; a non-sequence resolution yields a single-item scope.
    pub fn items(&self, root_path: &str) -> Vec<Self> {
        match self {
            Self::Json(value) => json::items(value, root_path)
                .into_iter()
                .map(Self::Json)
                .collect(),
            Self::Html(text) => html::items(text, root_path)
                .into_iter()
                .map(Self::Html)
                .collect(),
            Self::Xpath(text) => xpath::items(text, root_path)
                .into_iter()
                .map(Self::Xpath)
                .collect(),
        }
    }
}
