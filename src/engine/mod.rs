//! Model evaluator
//!
//! `Engine::get` is the core operation: construct a connector from the model's
//! connector config, wrap it with the retry decorator, fetch raw bytes, parse
//! them under the declared response type, and recursively materialize the
//! model into a [`Jsonable`]. Generated fields may re-enter the engine with a
//! sub-model, so the shared runtime travels behind an `Arc`.

mod eval;

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tracing::debug;

use crate::config::{ConnectorConfig, Item, LimitsConfig, ModelConfig};
use crate::connectors;
use crate::limits::Limits;
use crate::parse::Document;
use crate::plugins::PluginRegistry;
use crate::references::ReferenceStore;
use crate::value::Jsonable;
use crate::{Error, Result};

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared state for a run: HTTP client, semaphores, reference store and
/// plugin registry. Initialized at engine construction, torn down with it.
pub struct Runtime {
    /// Shared HTTP client
    pub client: reqwest::Client,
    /// Concurrency limiters
    pub limits: Limits,
    /// Cross-model result cache
    pub references: ReferenceStore,
    /// Registered plugins
    pub plugins: PluginRegistry,
}

impl Runtime {
    /// Build runtime state from the limits configuration.
    pub fn new(config: &LimitsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            limits: Limits::new(config),
            references: ReferenceStore::new(),
            plugins: PluginRegistry::new(),
        }
    }
}

/// The recursive extraction engine
pub struct Engine {
    runtime: Arc<Runtime>,
}

impl Engine {
    /// Create an engine with a fresh runtime.
    pub fn new(config: &LimitsConfig) -> Self {
        Self {
            runtime: Arc::new(Runtime::new(config)),
        }
    }

    /// Create an engine over an existing runtime (shared plugins/references).
    pub fn with_runtime(runtime: Arc<Runtime>) -> Self {
        Self { runtime }
    }

    /// Shared runtime handle.
    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    /// Materialize `model` from the bytes `connector` produces.
    ///
    /// `parent` and `index` are handed to the connector for URL templating;
    /// a root extraction passes neither.
    pub async fn get(
        &self,
        connector: &ConnectorConfig,
        model: &ModelConfig,
        parent: Option<&Jsonable>,
        index: Option<u32>,
    ) -> Result<Jsonable> {
        self.get_at(connector, model, parent, index, 0).await
    }

    /// Run one configured item and store its result under the item name.
    pub async fn run_item(&self, item: &Item) -> Result<Jsonable> {
        let result = self.get(&item.connector, &item.model, None, None).await?;
        self.runtime.references.set(&item.name, result.clone());
        Ok(result)
    }

    pub(crate) fn get_at<'a>(
        &'a self,
        connector: &'a ConnectorConfig,
        model: &'a ModelConfig,
        parent: Option<&'a Jsonable>,
        index: Option<u32>,
        depth: usize,
    ) -> BoxFuture<'a, Result<Jsonable>> {
        Box::pin(async move {
            if depth > self.runtime.limits.max_depth() {
                return Err(Error::Depth(depth));
            }

            let source = connectors::build(connector, &self.runtime);
            let body = source.fetch(parent, index).await?;
            debug!(bytes = body.len(), "connector answered");

            if let Some(name) = &connector.parser_plugin {
                let plugin = self
                    .runtime
                    .plugins
                    .parser(name)
                    .ok_or_else(|| Error::Config(format!("unknown parser plugin: {name}")))?;
                return plugin.parse(&body, model);
            }

            let document = Document::parse(connector.response_type, &body)?;
            Ok(eval::model(self, &document, model, index, depth).await)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ObjectConfig, SourceConfig, StaticSource};

    fn static_connector(value: &str) -> ConnectorConfig {
        ConnectorConfig {
            url: String::new(),
            response_type: crate::config::ResponseType::Json,
            attempts: 0,
            parser_plugin: None,
            source: SourceConfig::Static(StaticSource {
                value: value.to_string(),
                raw: None,
            }),
        }
    }

    #[tokio::test]
    async fn depth_bound_is_enforced() {
        let engine = Engine::new(&LimitsConfig {
            max_depth: 2,
            ..LimitsConfig::default()
        });
        let connector = static_connector("{}");
        let model = ModelConfig::Object(ObjectConfig::default());
        let err = engine
            .get_at(&connector, &model, None, None, 3)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Depth(_)));
    }

    #[tokio::test]
    async fn unknown_parser_plugin_is_a_config_error() {
        let engine = Engine::new(&LimitsConfig::default());
        let mut connector = static_connector("{}");
        connector.parser_plugin = Some("nope".to_string());
        let model = ModelConfig::Object(ObjectConfig::default());
        let err = engine.get(&connector, &model, None, None).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn malformed_root_bytes_surface_as_parse_error() {
        let engine = Engine::new(&LimitsConfig::default());
        let connector = static_connector("{not json");
        let model = ModelConfig::Object(ObjectConfig::default());
        let err = engine.get(&connector, &model, None, None).await.unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }
}
