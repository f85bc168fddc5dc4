//! Backup, restore and mailbox administration.
//!
//! An [`Engine`] owns one [`MailSession`] for one account and runs one
//! top-level operation at a time. The archive is borrowed per call.

mod admin;
mod backup;
mod restore;

use std::sync::Arc;

use mailvault_imap::Credentials;

pub use admin::{ClearReport, FolderSummary};
pub use backup::{BackupReport, BackupRequest};
pub use restore::{RestoreReport, RestoreRequest};

use crate::cancel::CancelFlag;
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::notifier::{Notifier, TracingNotifier};
use crate::session::MailSession;
use crate::version;
use crate::{Error, Result};

/// Runs operations against one account.
pub struct Engine<S> {
    session: S,
    config: EngineConfig,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    cancel: CancelFlag,
}

impl<S: MailSession> Engine<S> {
    /// Engine over `session`, reporting to `tracing`.
    pub fn new(session: S, config: EngineConfig) -> Self {
        Self {
            session,
            config,
            notifier: Arc::new(TracingNotifier),
            clock: Arc::new(SystemClock),
            cancel: CancelFlag::new(),
        }
    }

    /// Replaces the notifier.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Replaces the clock used for run start times.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Shares `cancel` with whoever may want to stop the run.
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// The configuration in effect.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The underlying session.
    pub const fn session(&self) -> &S {
        &self.session
    }

    /// Gives the session back.
    pub fn into_session(self) -> S {
        self.session
    }

    /// Connects and logs in.
    ///
    /// # Errors
    ///
    /// [`Error::Connection`] or [`Error::Auth`].
    pub async fn start(&mut self, credentials: &Credentials) -> Result<()> {
        self.session.connect().await?;
        self.session.login(credentials).await?;
        tracing::info!(user = %credentials.username, "logged in");
        Ok(())
    }

    /// Logs out; failures are only logged since the work is done.
    pub async fn finish(&mut self) {
        if let Err(e) = self.session.logout().await {
            tracing::debug!(error = %e, "logout failed");
        }
    }

    /// Tells the notifier about a newer release, if a check URL is set.
    pub async fn check_for_update(&self) {
        version::report_new_version(self.config.update_check_url.as_deref(), &*self.notifier).await;
    }

    /// Reports a skipped message or folder and keeps it for the run report.
    fn record(&self, context: &str, error: Error, errors: &mut Vec<Error>) {
        tracing::warn!(context, %error, "skipped");
        self.notifier.on_error(context, &error);
        errors.push(error);
    }

    /// Reports an error that ends the run.
    fn abort(&self, context: &str, error: Error) -> Error {
        if !matches!(error, Error::Cancelled) {
            self.notifier.on_error(context, &error);
        }
        error
    }
}

impl<S> std::fmt::Debug for Engine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
