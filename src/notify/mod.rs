//! Result delivery
//!
//! Notifiers receive the final result of a root extraction (or its error) and
//! deliver it somewhere: stdout, a file, an HTTP endpoint. Array results can
//! be split into one record per element, each carrying its index.

mod console;
mod file;
mod http;

pub use console::ConsoleNotifier;
pub use file::FileNotifier;
pub use http::HttpNotifier;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::NotifierConfig;
use crate::value::Jsonable;
use crate::{Error, Result};

/// One delivered record
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    /// Item name
    pub name: String,
    /// Element index when an array result is split
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    /// Result body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    /// Root extraction error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Delivery backend
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Item name this notifier reports for.
    fn name(&self) -> &str;

    /// Deliver one record.
    async fn notify(&self, record: &Record) -> Result<()>;

    /// Deliver a root extraction outcome.
    ///
    /// With `is_array` set and an array result, each element becomes its own
    /// record with its index; otherwise the whole result is one record.
    async fn inform(
        &self,
        result: Option<&Jsonable>,
        error: Option<&Error>,
        is_array: bool,
    ) -> Result<()> {
        if let Some(error) = error {
            return self
                .notify(&Record {
                    name: self.name().to_string(),
                    index: None,
                    body: None,
                    error: Some(error.to_string()),
                })
                .await;
        }
        let Some(result) = result else {
            return Ok(());
        };
        if is_array {
            if let Jsonable::Array(items) = result {
                for (position, item) in items.iter().enumerate() {
                    self.notify(&Record {
                        name: self.name().to_string(),
                        index: Some(u32::try_from(position).unwrap_or(u32::MAX)),
                        body: Some(item.to_native()),
                        error: None,
                    })
                    .await?;
                }
                return Ok(());
            }
        }
        self.notify(&Record {
            name: self.name().to_string(),
            index: None,
            body: Some(result.to_native()),
            error: None,
        })
        .await
    }
}

/// Build the notifier for a config entry.
pub fn build(name: &str, config: &NotifierConfig, client: reqwest::Client) -> Arc<dyn Notifier> {
    match config {
        NotifierConfig::Console(config) => Arc::new(ConsoleNotifier::new(name, config.clone())),
        NotifierConfig::File(config) => Arc::new(FileNotifier::new(name, config.clone())),
        NotifierConfig::Http(config) => {
            Arc::new(HttpNotifier::new(name, config.clone(), client))
        }
    }
}
