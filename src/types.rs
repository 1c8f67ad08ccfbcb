//! Core types for asset-localizer

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Sub-grammar governing how URLs are extracted from a piece of text
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Serialized document data or unrecognized text
    Generic,
    /// HTML markup
    Markup,
    /// CSS stylesheet
    Stylesheet,
    /// JavaScript source
    Script,
}

impl Dialect {
    /// Dialect of a fetched resource, judged by its local file extension
    ///
    /// Returns `None` for resources that are not re-scanned.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "css" => Some(Dialect::Stylesheet),
            "js" => Some(Dialect::Script),
            "html" | "htm" => Some(Dialect::Markup),
            _ => None,
        }
    }

    /// Whether resources found in this dialect are stored under hashed names
    pub fn uses_hashed_layout(self) -> bool {
        matches!(self, Dialect::Markup | Dialect::Stylesheet)
    }

    /// Short lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Generic => "generic",
            Dialect::Markup => "markup",
            Dialect::Stylesheet => "stylesheet",
            Dialect::Script => "script",
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A piece of text waiting to be scanned for references
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueItem {
    /// Text to scan
    pub content: String,
    /// Grammar to scan it with
    pub dialect: Dialect,
}

impl QueueItem {
    /// Create a new queue item
    pub fn new(content: impl Into<String>, dialect: Dialect) -> Self {
        Self {
            content: content.into(),
            dialect,
        }
    }
}

/// Local storage location and public address of a resource
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourcePaths {
    /// Where the resource is written below the output root
    pub local_path: PathBuf,
    /// Address substituted into the document
    pub web_path: String,
}

/// One resource to fetch. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchTask {
    /// Original URL as found in the text
    pub url: String,
    /// Destination file
    pub local_path: PathBuf,
    /// Public address recorded on success
    pub web_path: String,
    /// Skip the direct attempt and go straight to the proxy
    pub force_proxy: bool,
}

/// Terminal state of a fetch task
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    /// Fetched over the network and written to disk
    Success,
    /// Local copy already existed; no network access
    Skipped,
    /// Every available route failed
    Failure,
}

/// How a resource was obtained
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMethod {
    /// Direct request
    Direct,
    /// Request through the configured proxy
    Proxy,
    /// Read from an existing local copy
    Cached,
}

impl std::fmt::Display for FetchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FetchMethod::Direct => "direct",
            FetchMethod::Proxy => "proxy",
            FetchMethod::Cached => "cached",
        })
    }
}

/// Outcome of one fetch task, produced exactly once per task
#[derive(Clone, Debug)]
pub struct FetchResult {
    /// Terminal state
    pub status: FetchStatus,
    /// Route that produced the content (`None` on failure)
    pub method: Option<FetchMethod>,
    /// Original URL
    pub url: String,
    /// Destination file
    pub local_path: PathBuf,
    /// Public address of the resource
    pub web_path: String,
    /// Whether the task was routed by the forced-proxy policy
    pub forced_proxy: bool,
    /// Resource bytes (present on success and skip)
    pub content: Option<Vec<u8>>,
    /// Failure description (present on failure)
    pub error: Option<String>,
}

impl FetchResult {
    /// Successful network fetch
    pub fn success(task: FetchTask, method: FetchMethod, content: Vec<u8>) -> Self {
        Self::from_task(task, FetchStatus::Success, Some(method), Some(content), None)
    }

    /// Local copy reused without network access
    pub fn cached(task: FetchTask, content: Vec<u8>) -> Self {
        Self::from_task(
            task,
            FetchStatus::Skipped,
            Some(FetchMethod::Cached),
            Some(content),
            None,
        )
    }

    /// Failed fetch
    pub fn failure(task: FetchTask, error: impl Into<String>) -> Self {
        Self::from_task(task, FetchStatus::Failure, None, None, Some(error.into()))
    }

    fn from_task(
        task: FetchTask,
        status: FetchStatus,
        method: Option<FetchMethod>,
        content: Option<Vec<u8>>,
        error: Option<String>,
    ) -> Self {
        Self {
            status,
            method,
            url: task.url,
            local_path: task.local_path,
            web_path: task.web_path,
            forced_proxy: task.force_proxy,
            content,
            error,
        }
    }

    /// Whether the resource is available locally (fetched or cached)
    pub fn is_available(&self) -> bool {
        matches!(self.status, FetchStatus::Success | FetchStatus::Skipped)
    }

    /// Dialect to re-scan the content with, if the resource is textual
    pub fn rescan_dialect(&self) -> Option<Dialect> {
        self.local_path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Dialect::from_extension)
    }

    /// Human-readable label of the route, e.g. `proxy fallback`
    pub fn method_label(&self) -> &'static str {
        match self.method {
            Some(FetchMethod::Direct) => "direct",
            Some(FetchMethod::Proxy) if self.forced_proxy => "forced proxy",
            Some(FetchMethod::Proxy) => "proxy fallback",
            Some(FetchMethod::Cached) => "cached",
            None => "failed",
        }
    }
}
