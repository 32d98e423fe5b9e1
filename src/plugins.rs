//! Plugin registry
//!
//! A process-wide registry populated at startup. Three kinds are supported:
//! formatters (computed field values), connectors (byte sources) and parsers
//! (whole-response interpreters selected by `parser_plugin`). Lookup by an
//! unregistered name degrades per kind: formatters yield `Null`, connectors
//! yield a failing fetch, parsers are a configuration error.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::Result;
use crate::config::ModelConfig;
use crate::value::Jsonable;

/// Computed-field plugin
pub trait Formatter: Send + Sync {
    /// Produce a value from the current scoped value and the plugin's opaque
    /// configuration. Failures should degrade to `Jsonable::Null`.
    fn format(
        &self,
        parent: Option<&Jsonable>,
        config: &serde_json::Value,
        index: Option<u32>,
    ) -> Jsonable;
}

/// Byte-source plugin
#[async_trait]
pub trait ConnectorPlugin: Send + Sync {
    /// Fetch raw bytes. The URL is already template-interpolated.
    async fn fetch(
        &self,
        url: &str,
        config: &serde_json::Value,
        parent: Option<&Jsonable>,
        index: Option<u32>,
    ) -> Result<Bytes>;
}

/// Whole-response parser plugin
pub trait ParserPlugin: Send + Sync {
    /// Interpret raw bytes under the given model.
    fn parse(&self, body: &Bytes, model: &ModelConfig) -> Result<Jsonable>;
}

/// Name → plugin maps, mutated at startup and read for the rest of the run
#[derive(Default)]
pub struct PluginRegistry {
    formatters: RwLock<HashMap<String, Arc<dyn Formatter>>>,
    connectors: RwLock<HashMap<String, Arc<dyn ConnectorPlugin>>>,
    parsers: RwLock<HashMap<String, Arc<dyn ParserPlugin>>>,
}

impl PluginRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a formatter under `name`.
    pub fn register_formatter(&self, name: &str, plugin: Arc<dyn Formatter>) {
        self.formatters.write().insert(name.to_string(), plugin);
    }

    /// Register a connector under `name`.
    pub fn register_connector(&self, name: &str, plugin: Arc<dyn ConnectorPlugin>) {
        self.connectors.write().insert(name.to_string(), plugin);
    }

    /// Register a parser under `name`.
    pub fn register_parser(&self, name: &str, plugin: Arc<dyn ParserPlugin>) {
        self.parsers.write().insert(name.to_string(), plugin);
    }

    /// Look up a formatter.
    pub fn formatter(&self, name: &str) -> Option<Arc<dyn Formatter>> {
        self.formatters.read().get(name).cloned()
    }

    /// Look up a connector.
    pub fn connector(&self, name: &str) -> Option<Arc<dyn ConnectorPlugin>> {
        self.connectors.read().get(name).cloned()
    }

    /// Look up a parser.
    pub fn parser(&self, name: &str) -> Option<Arc<dyn ParserPlugin>> {
        self.parsers.read().get(name).cloned()
    }
}
