//! Pipeline controller.
//!
//! A [`Localizer`] drains a work queue seeded with the serialized document. Each
//! queue item is scanned, its new URLs are fetched as one batch, and the batch fully
//! resolves before the next item is dequeued. Fetched stylesheets, scripts and markup
//! are pushed back onto the queue. Once the queue is empty the document is rewritten.
//!
//! - [`state`] - Work queue, processed set, success map and run counters
//! - `batch` - Concurrent execution of one batch of fetch tasks

mod batch;
pub(crate) mod state;


use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::Result;
use crate::extract::{Extraction, extract};
use crate::fetch::{FetchOrchestrator, HttpTransport, Transport};
use crate::paths::PathResolver;
use crate::progress::{ProgressEvent, ProgressLevel, ProgressSink, trace_event};
use crate::substitute::substitute;
use crate::types::{Dialect, FetchTask, QueueItem};

use batch::BatchOutcome;
use state::{RunState, WorkQueue};

pub use state::{RunSummary, SuccessMap};

/// Capacity of the progress broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Rewritten document together with what was done to produce it
#[derive(Clone, Debug)]
pub struct LocalizedDocument {
    /// Document with every available resource URL replaced by its web path
    pub document: Value,
    /// URL to web path mapping applied to the document
    pub replacements: SuccessMap,
    /// Run counters
    pub summary: RunSummary,
}

/// Terminal state of a localization run
#[derive(Clone, Debug)]
pub enum LocalizeOutcome {
    /// The queue drained and the document was rewritten
    Completed(LocalizedDocument),
    /// Cancellation was observed; the document was not rewritten.
    ///
    /// Files written before cancellation stay on disk and are reused by the next run.
    Cancelled(RunSummary),
}

impl LocalizeOutcome {
    /// The rewritten document, or `None` if the run was cancelled
    pub fn into_document(self) -> Option<Value> {
        match self {
            LocalizeOutcome::Completed(done) => Some(done.document),
            LocalizeOutcome::Cancelled(_) => None,
        }
    }

    /// Counters of the run, whichever way it ended
    pub fn summary(&self) -> &RunSummary {
        match self {
            LocalizeOutcome::Completed(done) => &done.summary,
            LocalizeOutcome::Cancelled(summary) => summary,
        }
    }

    /// Whether the run was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LocalizeOutcome::Cancelled(_))
    }
}

/// Downloads the external resources of a document and rewrites it to local paths
pub struct Localizer {
    config: Arc<Config>,
    resolver: PathResolver,
    orchestrator: Arc<FetchOrchestrator>,
    event_tx: broadcast::Sender<ProgressEvent>,
    sink: Option<Arc<dyn ProgressSink>>,
}

impl Localizer {
    /// Create a localizer fetching over HTTP
    ///
    /// Fails with [`Error::Config`](crate::Error::Config) if the configuration is
    /// invalid or the HTTP clients cannot be built. No network activity happens here.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config.network)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a localizer fetching through a custom [`Transport`]
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;

        let resolver = PathResolver::from_config(&config);
        let orchestrator = Arc::new(FetchOrchestrator::new(
            transport,
            config.network.retry.clone(),
        ));
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            config: Arc::new(config),
            resolver,
            orchestrator,
            event_tx,
            sink: None,
        })
    }

    /// Forward progress events to `sink` in addition to the broadcast channel
    pub fn with_sink(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    /// Subscribe to progress events
    ///
    /// Slow subscribers lag and lose events; they never slow down the run.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.event_tx.subscribe()
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Localize every external resource of `document`.
    ///
    /// Returns [`LocalizeOutcome::Cancelled`] if `cancel` fires before the queue
    /// drains; the document is then left untouched. Individual fetch failures never
    /// fail the run: their URLs simply stay in the document.
    pub async fn localize(
        &self,
        document: &Value,
        cancel: &CancellationToken,
    ) -> Result<LocalizeOutcome> {
        let serialized = serde_json::to_string(document)?;
        let mut state = RunState::seeded(QueueItem::new(serialized, Dialect::Generic));

        tracing::info!(
            output_dir = %self.resolver.output_dir().display(),
            proxy = self.orchestrator.has_proxy(),
            "Starting localization"
        );

        loop {
            if cancel.is_cancelled() {
                return Ok(self.cancelled(state));
            }
            let Some(item) = state.queue.pop() else {
                break;
            };

            let dialect = item.dialect;
            let tasks = self.plan(item, &mut state);
            if tasks.is_empty() {
                continue;
            }

            state.summary.batches += 1;
            state.summary.tasks += tasks.len();
            self.emit(
                format!(
                    "found {} new URLs in {} content, starting downloads...",
                    tasks.len(),
                    dialect
                ),
                ProgressLevel::Info,
            );

            if let BatchOutcome::Cancelled = self.run_batch(tasks, &mut state, cancel).await {
                return Ok(self.cancelled(state));
            }
        }

        self.emit("all resources processed, replacing paths...", ProgressLevel::Info);
        let rewritten = substitute(document, &state.success);
        self.emit(
            format!("localization finished: {}", state.summary),
            ProgressLevel::Success,
        );

        Ok(LocalizeOutcome::Completed(LocalizedDocument {
            document: rewritten,
            replacements: state.success,
            summary: state.summary,
        }))
    }

    /// Candidate resource URLs of `document`, sorted, without any network access.
    ///
    /// Inline `<style>` blocks are followed; remote stylesheets and scripts are not,
    /// since that would require fetching them.
    pub fn analyze(&self, document: &Value) -> Result<Vec<String>> {
        let serialized = serde_json::to_string(document)?;
        let mut queue = WorkQueue::default();
        queue.push(QueueItem::new(serialized, Dialect::Generic));

        let mut found = BTreeSet::new();
        while let Some(item) = queue.pop() {
            let Extraction {
                candidates,
                spawned,
            } = extract(&item.content, item.dialect);
            queue.extend(spawned);
            found.extend(candidates);
        }

        tracing::debug!(count = found.len(), "Analyzed document");
        Ok(found.into_iter().collect())
    }

    /// Whether `document` references any resource that would be localized
    pub fn needs_localization(&self, document: &Value) -> Result<bool> {
        Ok(!self.analyze(document)?.is_empty())
    }

    /// Scan one queue item and turn its new URLs into fetch tasks
    fn plan(&self, item: QueueItem, state: &mut RunState) -> Vec<FetchTask> {
        state.summary.items_scanned += 1;

        let Extraction {
            candidates,
            spawned,
        } = extract(&item.content, item.dialect);
        state.queue.extend(spawned);

        let mut tasks = Vec::new();
        for url in candidates {
            if !state.processed.insert(&url) {
                continue;
            }
            let Some(paths) = self.resolver.resolve(&url, item.dialect) else {
                tracing::debug!(url = %url, "Unresolvable URL dropped");
                continue;
            };
            tasks.push(FetchTask {
                force_proxy: self.config.network.forces_proxy(&url),
                url,
                local_path: paths.local_path,
                web_path: paths.web_path,
            });
        }
        tasks
    }

    fn cancelled(&self, state: RunState) -> LocalizeOutcome {
        self.emit(
            "localization stopped; skipping path replacement",
            ProgressLevel::Warning,
        );
        tracing::info!(
            pending_items = state.queue.len(),
            processed = state.processed.len(),
            "Localization cancelled"
        );
        LocalizeOutcome::Cancelled(state.summary)
    }

    fn emit(&self, message: impl Into<String>, level: ProgressLevel) {
        let event = ProgressEvent::new(message, level);
        trace_event(&event);
        if let Some(sink) = &self.sink {
            sink.emit(&event);
        }
        // No subscribers is not an error
        self.event_tx.send(event).ok();
    }
}
