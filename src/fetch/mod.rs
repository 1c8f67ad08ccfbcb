//! Fetching of individual resources.
//!
//! - [`transport`] - Network transport abstraction and the reqwest-backed implementation
//! - [`orchestrator`] - Per-task fetch policy: cache check, direct attempt with retry,
//!   proxy fallback, atomic write

pub mod orchestrator;
pub mod transport;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

pub use orchestrator::FetchOrchestrator;
pub use transport::{HttpTransport, Route, Transport};
