//! Error types for the extraction engine

use std::io;

use thiserror::Error;

/// Result type alias for harvest
pub type Result<T> = std::result::Result<T, Error>;

/// Extraction errors
///
/// Field-level failures (type coercion, sub-model fetches, expressions) never
/// surface here - they collapse to `Jsonable::Null` so the output shape stays
/// well-formed. Only the root extraction reports an `Error` to its caller.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connector failure after retries
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Malformed bytes for the declared response type
    #[error("Parse error: {0}")]
    Parse(String),

    /// Expression compile or runtime failure
    #[error("Expression error: {0}")]
    Expression(String),

    /// Plugin not registered under the requested name
    #[error("Plugin not found: {0}")]
    PluginNotFound(String),

    /// Model recursion exceeded the configured depth bound
    #[error("Model depth limit exceeded: {0}")]
    Depth(usize),

    /// Notifier delivery failure
    #[error("Notify error: {0}")]
    Notify(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create a fetch error from any displayable cause
    pub fn fetch(cause: impl std::fmt::Display) -> Self {
        Self::Fetch(cause.to_string())
    }

    /// Create a parse error from any displayable cause
    pub fn parse(cause: impl std::fmt::Display) -> Self {
        Self::Parse(cause.to_string())
    }
}
