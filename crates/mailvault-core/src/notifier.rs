//! Progress and error reporting hooks.
//!
//! The engines never format text for people; they call a [`Notifier`] and
//! the front end decides what to show.

use crate::Error;

/// Receives run events. Every method has a no-op default.
pub trait Notifier: Send + Sync {
    /// `index` of `total` messages of `folder` (display name) are done.
    fn on_progress(&self, folder: &str, index: usize, total: usize) {
        let _ = (folder, index, total);
    }

    /// A message or folder was skipped, or the run is about to fail.
    ///
    /// `context` is the display name of the folder concerned, or the
    /// operation name for run-level failures.
    fn on_error(&self, context: &str, error: &Error) {
        let _ = (context, error);
    }

    /// A newer release than the running one exists.
    fn on_new_version_available(&self, version: &str) {
        let _ = version;
    }
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn on_progress(&self, folder: &str, index: usize, total: usize) {
        tracing::debug!(folder, index, total, "progress");
    }

    fn on_error(&self, context: &str, error: &Error) {
        tracing::warn!(context, %error, "skipped");
    }

    fn on_new_version_available(&self, version: &str) {
        tracing::info!(version, "new version available");
    }
}

/// Discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {}
