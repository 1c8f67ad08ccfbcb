//! Fetch policy for a single task.
//!
//! Order of attempts:
//! 1. An existing local copy is returned as `Skipped`/`Cached` without network access.
//! 2. Unless the task forces the proxy, a direct attempt is made; transient server
//!    errors are retried with backoff.
//! 3. If the direct route was skipped or failed and a proxy is configured, one
//!    proxied attempt is made.
//!
//! Every outcome is a [`FetchResult`]; nothing is raised to the caller.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::RetryConfig;
use crate::error::FetchError;
use crate::retry::with_retry;
use crate::types::{FetchMethod, FetchResult, FetchTask};

use super::transport::{Route, Transport};

/// Executes fetch tasks against a [`Transport`]
pub struct FetchOrchestrator {
    transport: Arc<dyn Transport>,
    retry: RetryConfig,
}

impl FetchOrchestrator {
    /// Create an orchestrator using `transport` and the direct-route retry policy
    pub fn new(transport: Arc<dyn Transport>, retry: RetryConfig) -> Self {
        Self { transport, retry }
    }

    /// Whether the underlying transport has a proxy route
    pub fn has_proxy(&self) -> bool {
        self.transport.has_proxy()
    }

    /// Run one task to its terminal state
    pub async fn run(&self, task: FetchTask) -> FetchResult {
        if let Some(content) = read_existing(&task.local_path).await {
            tracing::debug!(url = %task.url, path = %task.local_path.display(), "Using existing local copy");
            return FetchResult::cached(task, content);
        }

        let url = match url::Url::parse(&task.url) {
            Ok(url) => url,
            Err(e) => {
                let message = FetchError::InvalidUrl(e).summary();
                return FetchResult::failure(task, message);
            }
        };

        let mut direct_error = None;
        if !task.force_proxy {
            match with_retry(&self.retry, || self.transport.get(&url, Route::Direct)).await {
                Ok(content) => return self.store(task, FetchMethod::Direct, content).await,
                Err(e) => {
                    tracing::debug!(url = %task.url, error = %e, "Direct attempt failed");
                    direct_error = Some(e);
                }
            }
        }

        if !self.transport.has_proxy() {
            let message = match direct_error {
                Some(e) => format!(
                    "direct attempt failed ({}) and no proxy is configured",
                    e.summary()
                ),
                None => "forced proxy requested but no proxy is configured".to_string(),
            };
            return FetchResult::failure(task, message);
        }

        match self.transport.get(&url, Route::Proxy).await {
            Ok(content) => self.store(task, FetchMethod::Proxy, content).await,
            Err(e) => {
                tracing::debug!(url = %task.url, error = %e, "Proxy attempt failed");
                FetchResult::failure(task, format!("proxy failed: {}", e.summary()))
            }
        }
    }

    async fn store(&self, task: FetchTask, method: FetchMethod, content: Vec<u8>) -> FetchResult {
        match write_atomically(&task.local_path, &content).await {
            Ok(()) => FetchResult::success(task, method, content),
            Err(e) => {
                let message = format!(
                    "failed to write {}: {}",
                    task.local_path.display(),
                    FetchError::Io(e).summary()
                );
                FetchResult::failure(task, message)
            }
        }
    }
}

/// Read a previously stored copy, if one exists and is readable
async fn read_existing(path: &Path) -> Option<Vec<u8>> {
    match tokio::fs::read(path).await {
        Ok(content) => Some(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Existing file unreadable, fetching again");
            None
        }
    }
}

/// Sibling path used while a download is being written
pub(crate) fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Write `content` next to `path` and rename it into place, so that `path` only
/// ever holds complete files.
async fn write_atomically(path: &Path, content: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let partial = partial_path(path);
    tokio::fs::write(&partial, content).await?;
    tokio::fs::rename(&partial, path).await
}
