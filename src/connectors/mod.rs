//! Byte producers
//!
//! A connector turns a [`ConnectorConfig`](crate::config::ConnectorConfig)
//! into raw bytes. The parent parsed value and the array index are available
//! for template interpolation, so a sub-model can fetch
//! `https://api.example.com/detail/{PL}`. Every built connector is wrapped
//! with the retry decorator.

mod browser;
mod file;
mod http;

pub use browser::BrowserConnector;
pub use file::FileConnector;
pub use http::HttpConnector;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::config::{
    ConnectorConfig, IntSequenceSource, ReferenceSource, ResponseType, SourceConfig, StaticSource,
};
use crate::engine::Runtime;
use crate::expression;
use crate::plugins::ConnectorPlugin;
use crate::value::Jsonable;
use crate::{Error, Result};

/// Source of raw bytes for an extraction
#[async_trait]
pub trait Connector: Send + Sync {
    /// Produce the raw bytes. `parent` and `index` feed URL/template
    /// interpolation.
    async fn fetch(&self, parent: Option<&Jsonable>, index: Option<u32>) -> Result<Bytes>;
}

/// Build the connector for a config, retry-wrapped.
pub fn build(config: &ConnectorConfig, runtime: &Arc<Runtime>) -> Arc<dyn Connector> {
    let inner: Arc<dyn Connector> = match &config.source {
        SourceConfig::Static(source) => Arc::new(StaticConnector::from_source(source)),
        SourceConfig::Server(source) => Arc::new(HttpConnector::new(
            config.url.clone(),
            source.clone(),
            Arc::clone(runtime),
        )),
        SourceConfig::Browser(source) => Arc::new(BrowserConnector::new(
            config.url.clone(),
            source.clone(),
            Arc::clone(runtime),
        )),
        SourceConfig::File(source) => Arc::new(FileConnector::new(source.path.clone())),
        SourceConfig::Reference(source) => {
            debug!(name = %source.name, response_type = ?config.response_type, "resolving reference");
            Arc::new(StaticConnector::new(reference_text(
                source,
                config.response_type,
                runtime,
            )))
        }
        SourceConfig::IntSequence(source) => Arc::new(StaticConnector::new(sequence_json(source))),
        SourceConfig::Plugin(source) => Arc::new(PluginConnector {
            name: source.name.clone(),
            url: config.url.clone(),
            config: source.config.clone(),
            plugin: runtime.plugins.connector(&source.name),
        }),
    };
    Arc::new(Retry::new(inner, config.attempts))
}

/// Returns the configured literal after template interpolation
pub struct StaticConnector {
    value: String,
}

impl StaticConnector {
    /// Wrap a literal.
    pub fn new(value: String) -> Self {
        Self { value }
    }

    /// Build from config; an embedded `raw` JSON value wins over `value`.
    pub fn from_source(source: &StaticSource) -> Self {
        let value = match &source.raw {
            Some(raw) => serde_json::to_string(raw).unwrap_or_default(),
            None => source.value.clone(),
        };
        Self::new(value)
    }
}

#[async_trait]
impl Connector for StaticConnector {
    async fn fetch(&self, parent: Option<&Jsonable>, index: Option<u32>) -> Result<Bytes> {
        Ok(Bytes::from(expression::format(
            &self.value,
            parent,
            index,
            None,
        )))
    }
}

/// Attempt-bounded decorator: `attempts` extra calls after the first
/// failure, no delay, last error propagated.
pub struct Retry {
    inner: Arc<dyn Connector>,
    attempts: u32,
}

impl Retry {
    /// Wrap a connector.
    pub fn new(inner: Arc<dyn Connector>, attempts: u32) -> Self {
        Self { inner, attempts }
    }
}

#[async_trait]
impl Connector for Retry {
    async fn fetch(&self, parent: Option<&Jsonable>, index: Option<u32>) -> Result<Bytes> {
        let mut last = None;
        for attempt in 0..=self.attempts {
            match self.inner.fetch(parent, index).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    debug!(attempt, attempts = self.attempts, error = %e, "fetch attempt failed");
                    last = Some(e);
                }
            }
        }
        Err(last.unwrap_or_else(|| Error::Fetch("no attempts made".to_string())))
    }
}

struct PluginConnector {
    name: String,
    url: String,
    config: serde_json::Value,
    plugin: Option<Arc<dyn ConnectorPlugin>>,
}

#[async_trait]
impl Connector for PluginConnector {
    async fn fetch(&self, parent: Option<&Jsonable>, index: Option<u32>) -> Result<Bytes> {
        let Some(plugin) = &self.plugin else {
            return Err(Error::PluginNotFound(self.name.clone()));
        };
        let url = expression::format(&self.url, parent, index, None);
        plugin.fetch(&url, &self.config, parent, index).await
    }
}

// Stored results are replayed through a static connector, rendered for the
// consuming model's dialect. A missing name reads as `null` / an empty shell.
fn reference_text(
    source: &ReferenceSource,
    response_type: ResponseType,
    runtime: &Arc<Runtime>,
) -> String {
    let stored = runtime.references.get(&source.name);
    match response_type {
        ResponseType::Json => stored.to_json(),
        ResponseType::Html | ResponseType::Xpath => match stored {
            Jsonable::String(text) | Jsonable::RawString(text) => text,
            _ => "<html></html>".to_string(),
        },
    }
}

fn sequence_json(source: &IntSequenceSource) -> String {
    Jsonable::Array(
        sequence_values(source)
            .into_iter()
            .map(Jsonable::Int64)
            .collect(),
    )
    .to_json()
}

fn sequence_values(source: &IntSequenceSource) -> Vec<i64> {
    let mut out = Vec::new();
    if source.step == 0 {
        return out;
    }
    let mut value = source.start;
    while (source.step > 0 && value < source.end) || (source.step < 0 && value > source.end) {
        out.push(value);
        value += source.step;
    }
    out
}
