//! Concurrent execution of one batch of fetch tasks.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::progress::ProgressLevel;
use crate::types::{FetchResult, FetchStatus, FetchTask, QueueItem};

use super::Localizer;
use super::state::RunState;

/// How a batch ended
pub(super) enum BatchOutcome {
    /// Every task produced a result
    Resolved,
    /// Cancellation was observed; remaining tasks were abandoned
    Cancelled,
}

impl Localizer {
    /// Fetch `tasks` with at most `max_concurrent_fetches` in flight and apply each
    /// result in completion order.
    ///
    /// On cancellation the stream is dropped: tasks not yet started never start and
    /// spawned fetches finish detached.
    pub(super) async fn run_batch(
        &self,
        tasks: Vec<FetchTask>,
        state: &mut RunState,
        cancel: &CancellationToken,
    ) -> BatchOutcome {
        let concurrency = self.config.network.max_concurrent_fetches.max(1);

        let mut results = stream::iter(tasks)
            .map(|task| {
                let orchestrator = Arc::clone(&self.orchestrator);
                let fallback = task.clone();
                async move {
                    match tokio::spawn(async move { orchestrator.run(task).await }).await {
                        Ok(result) => result,
                        Err(e) => {
                            tracing::error!(url = %fallback.url, error = %e, "Fetch task panicked");
                            FetchResult::failure(fallback, format!("fetch task aborted: {}", e))
                        }
                    }
                }
            })
            .buffer_unordered(concurrency);

        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => return BatchOutcome::Cancelled,
                next = results.next() => next,
            };
            let Some(result) = next else {
                return BatchOutcome::Resolved;
            };

            self.apply_result(result, state);

            if cancel.is_cancelled() {
                return BatchOutcome::Cancelled;
            }
        }
    }

    /// Record one result and queue its content for re-scanning if it is text
    fn apply_result(&self, result: FetchResult, state: &mut RunState) {
        state.summary.record(&result);

        let level = match result.status {
            FetchStatus::Success => ProgressLevel::Success,
            FetchStatus::Skipped => ProgressLevel::Skipped,
            FetchStatus::Failure => ProgressLevel::Failure,
        };
        let message = match &result.error {
            Some(error) => format!("[{}] {} - {}", result.method_label(), result.url, error),
            None => format!("[{}] {}", result.method_label(), result.url),
        };
        self.emit(message, level);

        if !result.is_available() {
            return;
        }
        state.success.insert(result.url.as_str(), result.web_path.as_str());

        let Some(dialect) = result.rescan_dialect() else {
            return;
        };
        let Some(content) = result.content.filter(|c| !c.is_empty()) else {
            return;
        };
        match String::from_utf8(content) {
            Ok(text) => state.queue.push(QueueItem::new(text, dialect)),
            Err(e) => {
                tracing::debug!(url = %result.url, error = %e, "Fetched content is not UTF-8, not re-scanned");
            }
        }
    }
}
