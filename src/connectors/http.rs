//! HTTP connector

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;
use url::Url;

use super::Connector;
use crate::config::ServerSource;
use crate::engine::Runtime;
use crate::expression;
use crate::value::Jsonable;
use crate::{Error, Result};

/// Issues an HTTP request under the global and per-host semaphores.
///
/// Non-2xx bodies are still returned - the parser decides what to make of
/// them. Transport errors propagate as fetch failures.
pub struct HttpConnector {
    url: String,
    config: ServerSource,
    runtime: Arc<Runtime>,
}

impl HttpConnector {
    /// Create a connector for `url`.
    pub fn new(url: String, config: ServerSource, runtime: Arc<Runtime>) -> Self {
        Self {
            url,
            config,
            runtime,
        }
    }
}

#[async_trait]
impl Connector for HttpConnector {
    async fn fetch(&self, parent: Option<&Jsonable>, index: Option<u32>) -> Result<Bytes> {
        if self.url.is_empty() {
            return Err(Error::Fetch("empty url".to_string()));
        }
        let url = expression::format(&self.url, parent, index, None);
        let method: reqwest::Method = self
            .config
            .method
            .parse()
            .map_err(|_| Error::Config(format!("invalid http method: {}", self.config.method)))?;

        let mut request = self.runtime.client.request(method, &url);
        for (name, template) in &self.config.headers {
            request = request.header(
                name.as_str(),
                expression::format(template, parent, index, None),
            );
        }
        if let Some(timeout) = self.config.timeout {
            request = request.timeout(timeout);
        }

        let _global = self.runtime.limits.http_permit().await?;
        let host = Url::parse(&url)
            .ok()
            .and_then(|u| u.host_str().map(ToString::to_string));
        let _host = match &host {
            Some(host) => self.runtime.limits.host_permit(host).await?,
            None => None,
        };

        debug!(url = %url, "sending request");
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!(%status, url = %url, "non-success response, body handed to parser");
        }
        Ok(response.bytes().await?)
    }
}
