//! Progress reporting for batch runs.
//!
//! [`ProgressCallback`] decouples the batch runner from any rendering
//! backend; `chamadas_cli_utils` provides the `indicatif` implementation.

/// Receives progress updates from [`crate::Converter::run_all`].
///
/// Implementations must be `Send + Sync` so they can be shared through an
/// `Arc`.
pub trait ProgressCallback: Send + Sync {
    /// Set the total number of jobs.
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` jobs.
    fn inc(&self, delta: u64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores all progress updates.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

