//! Per-run state owned by the controller: work queue, processed-URL set, success map.
//!
//! None of these types are shared with fetch workers; the controller mutates them
//! between batches only.

use std::collections::{BTreeMap, HashSet, VecDeque};

use serde::Serialize;

use crate::types::{FetchMethod, FetchResult, FetchStatus, QueueItem};

/// FIFO queue of text waiting to be scanned
#[derive(Debug, Default)]
pub(crate) struct WorkQueue {
    items: VecDeque<QueueItem>,
}

impl WorkQueue {
    pub(crate) fn push(&mut self, item: QueueItem) {
        self.items.push_back(item);
    }

    pub(crate) fn extend(&mut self, items: impl IntoIterator<Item = QueueItem>) {
        self.items.extend(items);
    }

    pub(crate) fn pop(&mut self) -> Option<QueueItem> {
        self.items.pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }
}

/// URLs already turned into a fetch task during this run
#[derive(Debug, Default)]
pub(crate) struct ProcessedSet {
    urls: HashSet<String>,
}

impl ProcessedSet {
    /// Record `url`; returns `false` if it was already processed
    pub(crate) fn insert(&mut self, url: &str) -> bool {
        if self.urls.contains(url) {
            return false;
        }
        self.urls.insert(url.to_string())
    }

    pub(crate) fn len(&self) -> usize {
        self.urls.len()
    }
}

/// Append-only mapping from original URL to web path
///
/// Populated from successful and skipped fetches only.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SuccessMap {
    entries: BTreeMap<String, String>,
}

impl SuccessMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mapping. An existing mapping for `url` is never overwritten.
    pub fn insert(&mut self, url: impl Into<String>, web_path: impl Into<String>) {
        self.entries.entry(url.into()).or_insert_with(|| web_path.into());
    }

    /// Web path recorded for `url`
    pub fn get(&self, url: &str) -> Option<&str> {
        self.entries.get(url).map(String::as_str)
    }

    /// Number of mapped URLs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was mapped
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(url, web_path)` pairs in URL order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SuccessMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = SuccessMap::new();
        for (url, web_path) in iter {
            map.insert(url, web_path);
        }
        map
    }
}

/// Counters describing one run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Queue items scanned
    pub items_scanned: usize,
    /// Batches submitted to the fetch workers
    pub batches: usize,
    /// Fetch tasks created
    pub tasks: usize,
    /// Fetched directly
    pub direct: usize,
    /// Fetched through the proxy
    pub proxied: usize,
    /// Reused from an existing local copy
    pub cached: usize,
    /// Failed on every route
    pub failed: usize,
}

impl RunSummary {
    pub(crate) fn record(&mut self, result: &FetchResult) {
        match result.status {
            FetchStatus::Failure => self.failed += 1,
            FetchStatus::Skipped => self.cached += 1,
            FetchStatus::Success if result.method == Some(FetchMethod::Proxy) => self.proxied += 1,
            FetchStatus::Success => self.direct += 1,
        }
    }

    /// Resources available locally after the run
    pub fn available(&self) -> usize {
        self.direct + self.proxied + self.cached
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} resources: {} direct, {} via proxy, {} cached, {} failed",
            self.tasks, self.direct, self.proxied, self.cached, self.failed
        )
    }
}

/// Mutable state of one pipeline run
#[derive(Debug, Default)]
pub(crate) struct RunState {
    pub(crate) queue: WorkQueue,
    pub(crate) processed: ProcessedSet,
    pub(crate) success: SuccessMap,
    pub(crate) summary: RunSummary,
}

impl RunState {
    /// Start a run with a single item in the queue
    pub(crate) fn seeded(item: QueueItem) -> Self {
        let mut state = Self::default();
        state.queue.push(item);
        state
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Dialect, FetchTask};
    use std::path::PathBuf;

    #[test]
    fn test_queue_is_fifo() {
        let mut queue = WorkQueue::default();
        queue.push(QueueItem::new("a", Dialect::Generic));
        queue.extend([
            QueueItem::new("b", Dialect::Stylesheet),
            QueueItem::new("c", Dialect::Script),
        ]);

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop().unwrap().content, "a");
        assert_eq!(queue.pop().unwrap().content, "b");
        assert_eq!(queue.pop().unwrap().content, "c");
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_processed_set_admits_once() {
        let mut processed = ProcessedSet::default();
        assert!(processed.insert("https://a.example/x.png"));
        assert!(!processed.insert("https://a.example/x.png"));
        assert!(processed.insert("https://a.example/y.png"));
        assert_eq!(processed.len(), 2);
    }

    #[test]
    fn test_success_map_is_append_only() {
        let mut map = SuccessMap::new();
        map.insert("https://a.example/x.png", "/niko/o/images/x.png");
        map.insert("https://a.example/x.png", "/elsewhere");

        assert_eq!(map.len(), 1);
        assert_eq!(map.get("https://a.example/x.png"), Some("/niko/o/images/x.png"));
    }

    #[test]
    fn test_summary_counts_by_method() {
        let task = FetchTask {
            url: "https://a.example/x.png".to_string(),
            local_path: PathBuf::from("/o/x.png"),
            web_path: "/w/x.png".to_string(),
            force_proxy: false,
        };
        let mut summary = RunSummary::default();
        summary.record(&FetchResult::success(task.clone(), FetchMethod::Direct, vec![]));
        summary.record(&FetchResult::success(task.clone(), FetchMethod::Proxy, vec![]));
        summary.record(&FetchResult::cached(task.clone(), vec![]));
        summary.record(&FetchResult::failure(task, "nope"));

        assert_eq!(
            (summary.direct, summary.proxied, summary.cached, summary.failed),
            (1, 1, 1, 1)
        );
        assert_eq!(summary.available(), 3);
    }
}
