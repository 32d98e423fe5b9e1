//! HTTP notifier

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::{Notifier, Record};
use crate::config::HttpNotifierConfig;
use crate::expression;
use crate::{Error, Result};

/// POSTs delivered records to an endpoint
pub struct HttpNotifier {
    name: String,
    config: HttpNotifierConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct RequestBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "is_false")]
    error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a serde_json::Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl HttpNotifier {
    /// Create an HTTP notifier for an item.
    pub fn new(name: &str, config: HttpNotifierConfig, client: reqwest::Client) -> Self {
        Self {
            name: name.to_string(),
            config,
            client,
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn notify(&self, record: &Record) -> Result<()> {
        let body = RequestBody {
            name: &record.name,
            error: record.error.is_some(),
            result: record.body.as_ref(),
        };

        let method: reqwest::Method = self
            .config
            .method
            .parse()
            .map_err(|_| Error::Config(format!("invalid http method: {}", self.config.method)))?;
        let url = expression::format(&self.config.url, None, record.index, None);

        let mut request = self.client.request(method, &url).json(&body);
        for (name, template) in &self.config.headers {
            request = request.header(
                name.as_str(),
                expression::format(template, None, record.index, None),
            );
        }
        if let Some(timeout) = self.config.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        debug!(url = %url, status = %response.status(), "record delivered");
        Ok(())
    }
}
