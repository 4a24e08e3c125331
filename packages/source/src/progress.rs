//! Progress reporting for long-running migrations.
//!
//! [`ProgressCallback`] keeps the orchestrator independent of how progress
//! is rendered. The CLI supplies an `indicatif` bar; tests and library
//! callers use [`NullProgress`].

use std::sync::Arc;

/// Receives progress updates from a migration run.
///
/// Implementations must be `Send + Sync` so one reporter can be shared
/// through an `Arc`.
pub trait ProgressCallback: Send + Sync {
    /// Sets the number of headwords in the work set.
    fn set_total(&self, total: u64);

    /// Advances by `delta` headwords.
    fn inc(&self, delta: u64);

    /// Shows the headword currently being resolved.
    fn set_message(&self, msg: String);

    /// Completes the indicator with a final message.
    fn finish(&self, msg: String);
}

/// Discards every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
