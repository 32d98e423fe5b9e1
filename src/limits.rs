//! Concurrency limiters
//!
//! Three bounded counting semaphores gate the suspension points of an
//! extraction: a process-global HTTP cap, lazily-created per-host caps, and a
//! headless-browser cap. Acquisition failure surfaces as a fetch error and is
//! subject to the connector retry policy.

use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::LimitsConfig;
use crate::{Error, Result};

/// Default global cap on in-flight HTTP fetches
pub const DEFAULT_HTTP_WORKERS: usize = 1000;

/// Environment variable overriding the global HTTP cap
pub const HTTP_WORKER_ENV: &str = "FITTER_HTTP_WORKER";

/// Semaphore set shared by every connector in a run
pub struct Limits {
    http: Arc<Semaphore>,
    browser: Option<Arc<Semaphore>>,
    host_caps: HashMap<String, usize>,
    hosts: DashMap<String, Arc<Semaphore>>,
    max_depth: usize,
}

impl Limits {
    /// Build the semaphore set from configuration.
    ///
    /// Global HTTP capacity resolves as config value, then the
    /// `FITTER_HTTP_WORKER` environment variable, then 1000.
    pub fn new(config: &LimitsConfig) -> Self {
        let http_workers = config
            .http_workers
            .or_else(|| {
                env::var(HTTP_WORKER_ENV)
                    .ok()
                    .and_then(|v| v.parse::<usize>().ok())
                    .filter(|v| *v > 0)
            })
            .unwrap_or(DEFAULT_HTTP_WORKERS);

        Self {
            http: Arc::new(Semaphore::new(http_workers)),
            browser: config.browser.map(|cap| Arc::new(Semaphore::new(cap))),
            host_caps: config.hosts.clone(),
            hosts: DashMap::new(),
            max_depth: config.max_depth,
        }
    }

    /// Acquire a slot in the global HTTP semaphore.
    pub async fn http_permit(&self) -> Result<OwnedSemaphorePermit> {
        Arc::clone(&self.http)
            .acquire_owned()
            .await
            .map_err(|e| Error::fetch(format!("http semaphore: {e}")))
    }

    /// Acquire a slot for `host`. Hosts without a configured cap are
    /// unbounded and skip acquisition entirely.
    pub async fn host_permit(&self, host: &str) -> Result<Option<OwnedSemaphorePermit>> {
        let Some(cap) = self.host_caps.get(host).copied() else {
            return Ok(None);
        };
        let semaphore = self
            .hosts
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(cap)))
            .clone();
        let permit = semaphore
            .acquire_owned()
            .await
            .map_err(|e| Error::fetch(format!("host semaphore for {host}: {e}")))?;
        Ok(Some(permit))
    }

    /// Acquire a browser-container slot, when a cap is configured.
    pub async fn browser_permit(&self) -> Result<Option<OwnedSemaphorePermit>> {
        let Some(semaphore) = &self.browser else {
            return Ok(None);
        };
        let permit = Arc::clone(semaphore)
            .acquire_owned()
            .await
            .map_err(|e| Error::fetch(format!("browser semaphore: {e}")))?;
        Ok(Some(permit))
    }

    /// Number of currently available global HTTP slots.
    pub fn http_available(&self) -> usize {
        self.http.available_permits()
    }

    /// Maximum model recursion depth.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits_with(http_workers: Option<usize>, hosts: &[(&str, usize)]) -> Limits {
        Limits::new(&LimitsConfig {
            http_workers,
            hosts: hosts
                .iter()
                .map(|(h, c)| ((*h).to_string(), *c))
                .collect(),
            browser: Some(1),
            max_depth: 16,
        })
    }

    #[tokio::test]
    async fn global_semaphore_admits_at_most_capacity() {
        let limits = limits_with(Some(2), &[]);
        let first = limits.http_permit().await.expect("first permit");
        let _second = limits.http_permit().await.expect("second permit");
        assert_eq!(limits.http_available(), 0);
        drop(first);
        assert_eq!(limits.http_available(), 1);
    }

    #[tokio::test]
    async fn unknown_host_is_unbounded() {
        let limits = limits_with(Some(1), &[("api.example.com", 1)]);
        assert!(limits.host_permit("other.example.com").await.unwrap().is_none());
        let permit = limits.host_permit("api.example.com").await.unwrap();
        assert!(permit.is_some());
    }

    #[tokio::test]
    async fn browser_cap_is_honored() {
        let limits = limits_with(Some(1), &[]);
        let held = limits.browser_permit().await.unwrap();
        assert!(held.is_some());
        // A second acquisition would block; verify there is no free slot.
        assert!(limits.browser.as_ref().unwrap().available_permits() == 0);
    }
}
