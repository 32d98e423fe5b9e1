//! Console notifier

use async_trait::async_trait;
use tracing::info;

use super::{Notifier, Record};
use crate::Result;
use crate::config::ConsoleNotifierConfig;

/// Prints delivered records to stdout, or logs them
pub struct ConsoleNotifier {
    name: String,
    config: ConsoleNotifierConfig,
}

impl ConsoleNotifier {
    /// Create a console notifier for an item.
    pub fn new(name: &str, config: ConsoleNotifierConfig) -> Self {
        Self {
            name: name.to_string(),
            config,
        }
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn notify(&self, record: &Record) -> Result<()> {
        let json = serde_json::to_string(record)?;
        if self.config.only_result {
            println!("{json}");
        } else {
            info!(name = %self.name, response = %json, "processing done");
        }
        Ok(())
    }
}
