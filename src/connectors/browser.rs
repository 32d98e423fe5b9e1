//! Headless-browser connector
//!
//! Renders a page in a containerized headless Chrome and returns the dumped
//! DOM from stdout. The container is driven through the `docker` CLI; the
//! browser semaphore bounds concurrent renders.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

use super::Connector;
use crate::config::BrowserSource;
use crate::engine::Runtime;
use crate::expression;
use crate::value::Jsonable;
use crate::{Error, Result};

const DEFAULT_IMAGE: &str = "docker.io/zenika/alpine-chrome";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_PULL_TIMEOUT: Duration = Duration::from_secs(60);

const DEFAULT_FLAGS: &[&str] = &[
    "--no-sandbox",
    "--headless",
    "--proxy-auto-detect",
    "--temp-profile",
    "--incognito",
    "--disable-logging",
    "--disable-gpu",
];

/// Runs headless Chrome in a container and captures its DOM dump
pub struct BrowserConnector {
    url: String,
    config: BrowserSource,
    runtime: Arc<Runtime>,
}

impl BrowserConnector {
    /// Create a connector for `url`.
    pub fn new(url: String, config: BrowserSource, runtime: Arc<Runtime>) -> Self {
        Self {
            url,
            config,
            runtime,
        }
    }

    fn run_args(&self, url: &str, container: &str, run_timeout: Duration) -> Vec<String> {
        let mut args: Vec<String> = vec!["run".to_string(), "--name".to_string(), container.to_string()];
        if self.config.purge {
            args.push("--rm".to_string());
        }
        if let Some(entry_point) = &self.config.entry_point {
            args.push("--entrypoint".to_string());
            args.push(entry_point.clone());
        }
        args.push(
            self.config
                .image
                .clone()
                .unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
        );
        if self.config.flags.is_empty() {
            args.extend(DEFAULT_FLAGS.iter().map(ToString::to_string));
            if let Some(wait_ms) = self.config.wait_ms {
                args.push(format!("--virtual-time-budget={wait_ms}"));
            }
            args.push(format!("--timeout={}", run_timeout.as_millis()));
            args.push("--dump-dom".to_string());
            args.push(url.to_string());
        } else {
            // Custom flags replace the default command entirely, URL included.
            args.extend(self.config.flags.iter().cloned());
        }
        args
    }
}

#[async_trait]
impl Connector for BrowserConnector {
    async fn fetch(&self, parent: Option<&Jsonable>, index: Option<u32>) -> Result<Bytes> {
        let url = expression::format(&self.url, parent, index, None);
        let _permit = self.runtime.limits.browser_permit().await?;

        let image = self
            .config
            .image
            .clone()
            .unwrap_or_else(|| DEFAULT_IMAGE.to_string());

        if self.config.pull {
            let pull_timeout = self.config.pull_timeout.unwrap_or(DEFAULT_PULL_TIMEOUT);
            debug!(image = %image, "pulling image");
            let pull = Command::new("docker")
                .args(["pull", &image])
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .output();
            let output = timeout(pull_timeout, pull)
                .await
                .map_err(|_| Error::fetch(format!("pull image timeout: {image}")))??;
            if !output.status.success() {
                return Err(Error::fetch(format!(
                    "pull failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                )));
            }
        }

        let run_timeout = self.config.timeout.unwrap_or(DEFAULT_TIMEOUT);
        let container = format!("harvest-{}", Uuid::new_v4());
        let args = self.run_args(&url, &container, run_timeout);

        debug!(url = %url, container = %container, "starting browser container");
        let run = Command::new("docker").args(&args).output();
        // Grace on top of the in-browser timeout so container startup does
        // not eat the page budget.
        let output = timeout(run_timeout + Duration::from_secs(5), run)
            .await
            .map_err(|_| Error::fetch(format!("browser container timeout: {url}")))??;

        if !output.stderr.is_empty() {
            warn!(
                url = %url,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "browser container reported errors"
            );
        }
        Ok(Bytes::from(output.stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LimitsConfig;
    use crate::engine::Runtime;

    fn connector(config: BrowserSource) -> BrowserConnector {
        BrowserConnector::new(
            "https://example.com".to_string(),
            config,
            Arc::new(Runtime::new(&LimitsConfig::default())),
        )
    }

    #[test]
    fn default_args_dump_dom() {
        let c = connector(BrowserSource::default());
        let args = c.run_args("https://example.com", "harvest-x", DEFAULT_TIMEOUT);
        assert!(args.contains(&"--dump-dom".to_string()));
        assert!(args.contains(&"--headless".to_string()));
        assert_eq!(args.last(), Some(&"https://example.com".to_string()));
    }

    #[test]
    fn custom_flags_replace_default_command() {
        let c = connector(BrowserSource {
            flags: vec!["--screenshot".to_string()],
            ..BrowserSource::default()
        });
        let args = c.run_args("https://example.com", "harvest-x", DEFAULT_TIMEOUT);
        assert!(!args.contains(&"--dump-dom".to_string()));
        assert_eq!(args.last(), Some(&"--screenshot".to_string()));
    }

    #[test]
    fn purge_adds_rm() {
        let c = connector(BrowserSource {
            purge: true,
            ..BrowserSource::default()
        });
        let args = c.run_args("https://example.com", "harvest-x", DEFAULT_TIMEOUT);
        assert!(args.contains(&"--rm".to_string()));
    }
}
