//! Progress reporting
//!
//! The pipeline reports human-readable progress as [`ProgressEvent`]s. Any type
//! implementing [`ProgressSink`] can receive them: closures, broadcast senders and
//! unbounded mpsc senders are supported out of the box. Emission never blocks and
//! never fails the pipeline; a sink that nobody reads is fine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity/category of a progress message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressLevel {
    /// General information (batch started, phase changes)
    Info,
    /// A resource was fetched, or the run finished
    Success,
    /// A resource was already present locally
    Skipped,
    /// Something unusual that does not fail the run (e.g. cancellation)
    Warning,
    /// An unexpected internal problem
    Error,
    /// A resource could not be fetched
    Failure,
}

impl std::fmt::Display for ProgressLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ProgressLevel::Info => "info",
            ProgressLevel::Success => "success",
            ProgressLevel::Skipped => "skipped",
            ProgressLevel::Warning => "warning",
            ProgressLevel::Error => "error",
            ProgressLevel::Failure => "failure",
        })
    }
}

/// A single progress message
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Human-readable message
    pub message: String,
    /// Message level
    pub level: ProgressLevel,
    /// When the event was emitted
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    /// Create an event stamped with the current time
    pub fn new(message: impl Into<String>, level: ProgressLevel) -> Self {
        Self {
            message: message.into(),
            level,
            timestamp: Utc::now(),
        }
    }
}

/// Receiver of progress events
pub trait ProgressSink: Send + Sync {
    /// Deliver one event. Must not block.
    fn emit(&self, event: &ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: &ProgressEvent) {
        self(event)
    }
}

impl ProgressSink for tokio::sync::broadcast::Sender<ProgressEvent> {
    fn emit(&self, event: &ProgressEvent) {
        // No subscribers is not an error
        self.send(event.clone()).ok();
    }
}

impl ProgressSink for tokio::sync::mpsc::UnboundedSender<ProgressEvent> {
    fn emit(&self, event: &ProgressEvent) {
        self.send(event.clone()).ok();
    }
}

/// Mirror a progress event into the tracing log
pub(crate) fn trace_event(event: &ProgressEvent) {
    match event.level {
        ProgressLevel::Info | ProgressLevel::Success | ProgressLevel::Skipped => {
            tracing::info!(level = %event.level, "{}", event.message)
        }
        ProgressLevel::Warning | ProgressLevel::Failure => {
            tracing::warn!(level = %event.level, "{}", event.message)
        }
        ProgressLevel::Error => tracing::error!(level = %event.level, "{}", event.message),
    }
}
