//! Backup: server to archive.

use chrono::{DateTime, Days, Utc};

use super::Engine;
use crate::archive::{Archive, NewEntry, PutOutcome};
use crate::date_range::DateRange;
use crate::session::{FetchResult, FolderInfo, MailSession};
use crate::{Error, Result};

/// What to back up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackupRequest {
    /// Explicit day window.
    pub range: DateRange,
    /// Start from the stored stamp and advance it on success.
    pub use_stamp: bool,
}

/// Outcome of a backup run that was not aborted.
#[derive(Debug, Default)]
pub struct BackupReport {
    /// When the run started; the stamp candidate.
    pub started_at: DateTime<Utc>,
    /// The window actually searched, after applying the stamp.
    pub range: DateRange,
    /// Folders fully processed.
    pub folders: usize,
    /// Messages written to the archive.
    pub stored: usize,
    /// Messages fetched but already archived.
    pub already_present: usize,
    /// Messages not fetched because their UID is already indexed.
    pub known: usize,
    /// Skipped messages and folders.
    pub errors: Vec<Error>,
    /// Stamp written at the end, if any.
    pub stamp: Option<DateTime<Utc>>,
}

impl BackupReport {
    /// True when nothing was skipped.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

impl<S: MailSession> Engine<S> {
    /// Copies every message in range from the server into `archive`.
    ///
    /// One bad message or folder is reported and skipped. The stamp is
    /// written only when `use_stamp` is set and nothing was skipped.
    ///
    /// # Errors
    ///
    /// Fatal errors ([`Error::is_fatal`]): connection loss, rejected
    /// credentials, archive failure, cancellation. The stamp is left alone.
    pub async fn backup(&mut self, archive: &Archive, request: BackupRequest) -> Result<BackupReport> {
        let mut report = BackupReport {
            started_at: self.clock.now(),
            range: self.effective_range(archive, &request).await?,
            ..BackupReport::default()
        };
        tracing::info!(
            since = ?report.range.since,
            before = ?report.range.before,
            "backup started"
        );

        let folders: Vec<FolderInfo> = self
            .session
            .list_folders()
            .await
            .map_err(|e| self.abort("backup", e))?
            .into_iter()
            .filter(|f| f.selectable && self.config.wants_folder(&f.name))
            .collect();

        for folder in &folders {
            self.cancel.check()?;
            match self.backup_folder(archive, folder, &mut report).await {
                Ok(()) => report.folders += 1,
                Err(e) if e.is_fatal() => return Err(self.abort(&folder.display_name, e)),
                Err(e) => self.record(&folder.display_name, e, &mut report.errors),
            }
        }

        if request.use_stamp && report.is_complete() {
            archive.write_stamp(report.started_at).await?;
            report.stamp = Some(report.started_at);
        }

        tracing::info!(
            folders = report.folders,
            stored = report.stored,
            already_present = report.already_present,
            known = report.known,
            errors = report.errors.len(),
            "backup finished"
        );
        Ok(report)
    }

    /// The requested window. When asked to use the stamp and no explicit
    /// `since` was given, `since` is the day before the stamp's UTC day:
    /// SEARCH compares each message's day in its own offset, which can lag
    /// UTC by up to a day.
    async fn effective_range(&self, archive: &Archive, request: &BackupRequest) -> Result<DateRange> {
        let mut range = request.range;
        if request.use_stamp && range.since.is_none() {
            if let Some(stamp) = archive.read_stamp().await? {
                tracing::info!(%stamp, "resuming from stamp");
                range.since = stamp.date_naive().checked_sub_days(Days::new(1));
            }
        }
        Ok(range)
    }

    async fn backup_folder(
        &mut self,
        archive: &Archive,
        folder: &FolderInfo,
        report: &mut BackupReport,
    ) -> Result<()> {
        let state = self.session.select_read_only(&folder.name).await?;
        let uids = self.session.search(&report.range).await?;
        let total = uids.len();
        tracing::info!(folder = %folder.display_name, total, "backing up folder");

        for (index, uid) in uids.into_iter().enumerate() {
            self.cancel.check()?;

            let known = match state.uid_validity {
                Some(validity) => archive.contains_uid(&folder.name, validity, uid).await?,
                None => false,
            };
            if known {
                report.known += 1;
            } else {
                match self.session.fetch(uid).await? {
                    FetchResult::Fetched(message) => {
                        let entry = NewEntry {
                            folder: folder.name.clone(),
                            internal_date: message.internal_date,
                            flags: message.flags,
                            content: message.content,
                            uid_validity: state.uid_validity,
                            uid: Some(message.uid),
                            archived_at: self.clock.now(),
                        };
                        match archive.put(entry).await? {
                            PutOutcome::Stored(_) => report.stored += 1,
                            PutOutcome::AlreadyPresent(_) => report.already_present += 1,
                        }
                    }
                    FetchResult::Skipped(reason) => {
                        let error = Error::Fetch {
                            folder: folder.name.clone(),
                            uid,
                            reason,
                        };
                        self.record(&folder.display_name, error, &mut report.errors);
                    }
                }
            }

            self.notifier.on_progress(&folder.display_name, index + 1, total);
        }
        Ok(())
    }
}
