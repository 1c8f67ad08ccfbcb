//! # asset-localizer
//!
//! Makes a structured document self-contained by downloading every external
//! resource it references and rewriting the references to local web paths.
//!
//! ## Design Philosophy
//!
//! asset-localizer is designed to be:
//! - **Recursive** - Fetched stylesheets and scripts are scanned for further resources
//! - **Resumable** - Files already on disk are reused, so a re-run only fetches what is missing
//! - **All or nothing** - The document is rewritten only after every resource was attempted
//! - **Library-first** - No CLI or UI; progress is delivered as events
//!
//! ## Quick Start
//!
//! ```no_run
//! use asset_localizer::{Config, Localizer, LocalizeOutcome};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::new("public/niko/Alice");
//!     config.network.proxy = Some("socks5h://127.0.0.1:1080".to_string());
//!
//!     let localizer = Localizer::new(config)?;
//!
//!     // Subscribe to progress events
//!     let mut events = localizer.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("[{}] {}", event.level, event.message);
//!         }
//!     });
//!
//!     let document = serde_json::json!({"avatar": "https://img.example.com/a.png"});
//!     match localizer.localize(&document, &CancellationToken::new()).await? {
//!         LocalizeOutcome::Completed(done) => println!("{}", done.document),
//!         LocalizeOutcome::Cancelled(summary) => println!("stopped after {}", summary),
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Reference extraction per content dialect
pub mod extract;
/// Resource fetching: transport and per-task policy
pub mod fetch;
/// Storage layout of fetched resources
pub mod paths;
/// Queue-driven localization pipeline
pub mod pipeline;
/// Progress events and sinks
pub mod progress;
/// Retry logic with exponential backoff
pub mod retry;
/// Rewriting of the document
pub mod substitute;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{Config, NetworkConfig, RetryConfig};
pub use error::{Error, FetchError, Result};
pub use fetch::{HttpTransport, Route, Transport};
pub use pipeline::{LocalizeOutcome, LocalizedDocument, Localizer, RunSummary, SuccessMap};
pub use progress::{ProgressEvent, ProgressLevel, ProgressSink};
pub use types::{Dialect, FetchMethod, FetchResult, FetchStatus, FetchTask};

use tokio_util::sync::CancellationToken;

/// Helper function to localize a document with graceful signal handling.
///
/// Runs [`Localizer::localize`] with a cancellation token that fires on a termination
/// signal. A signal stops the run at its next checkpoint and yields
/// [`LocalizeOutcome::Cancelled`]; files already written are kept.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use asset_localizer::{Config, Localizer, localize_until_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let localizer = Localizer::new(Config::new("public/niko/Alice"))?;
///     let document = serde_json::json!({"avatar": "https://img.example.com/a.png"});
///
///     // Stops cleanly on Ctrl+C
///     let outcome = localize_until_shutdown(&localizer, &document).await?;
///     println!("{}", outcome.summary());
///
///     Ok(())
/// }
/// ```
pub async fn localize_until_shutdown(
    localizer: &Localizer,
    document: &serde_json::Value,
) -> Result<LocalizeOutcome> {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let signal_task = tokio::spawn(async move {
        wait_for_signal().await;
        trigger.cancel();
    });

    let outcome = localizer.localize(document, &cancel).await;
    signal_task.abort();
    outcome
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::SignalKind;

    // Signal registration may fail in restricted environments (containers, tests)
    let sigterm = register_signal(SignalKind::terminate(), "SIGTERM");
    let sigint = register_signal(SignalKind::interrupt(), "SIGINT");

    if sigterm.is_none() && sigint.is_none() {
        tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
        ctrl_c_or_never().await;
        return;
    }

    tokio::select! {
        _ = next_signal(sigterm) => {
            tracing::info!("Received SIGTERM, stopping localization");
        }
        _ = next_signal(sigint) => {
            tracing::info!("Received SIGINT (Ctrl+C), stopping localization");
        }
    }
}

#[cfg(unix)]
fn register_signal(
    kind: tokio::signal::unix::SignalKind,
    name: &str,
) -> Option<tokio::signal::unix::Signal> {
    match tokio::signal::unix::signal(kind) {
        Ok(signal) => Some(signal),
        Err(e) => {
            tracing::warn!(error = %e, signal = name, "Could not register signal handler");
            None
        }
    }
}

/// Resolve on the next delivery of `signal`; an unregistered signal never resolves
#[cfg(unix)]
async fn next_signal(signal: Option<tokio::signal::unix::Signal>) {
    match signal {
        Some(mut signal) => {
            signal.recv().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    ctrl_c_or_never().await;
    tracing::info!("Received Ctrl+C, stopping localization");
}

/// Wait for Ctrl+C. If it cannot be listened for, never resolve: a broken signal
/// handler must not cancel the run.
async fn ctrl_c_or_never() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        std::future::pending::<()>().await;
    }
}
