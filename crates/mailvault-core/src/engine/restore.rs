//! Restore: archive to server.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, FixedOffset};

use mailvault_imap::Flag;

use super::Engine;
use crate::archive::{Archive, ArchiveEntry, Fingerprint};
use crate::date_range::DateRange;
use crate::folder_name;
use crate::session::{MailSession, RemoteIdentity, RemoteMessage, RemoteMessages};
use crate::{Error, Result};

/// What to restore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreRequest {
    /// Day window over the archived internal dates.
    pub range: DateRange,
}

/// Outcome of a restore run that was not aborted.
#[derive(Debug, Default)]
pub struct RestoreReport {
    /// Folders that received at least one attempt.
    pub folders: usize,
    /// Folders that had to be created.
    pub created_folders: usize,
    /// Messages appended.
    pub appended: usize,
    /// Messages already on the server.
    pub already_present: usize,
    /// Messages already on the server whose flags were put back.
    pub flags_updated: usize,
    /// Skipped messages and folders.
    pub errors: Vec<Error>,
}

impl RestoreReport {
    /// True when nothing was skipped.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// The folder entries are currently going to.
struct Target {
    folder: String,
    display_name: String,
    total: usize,
    done: usize,
    /// `None` when the folder could not be prepared; its entries are skipped.
    /// Each remote message answers for at most one archived entry.
    remote: Option<RemoteMessages>,
    /// Archive keys appended during this run.
    appended: HashSet<(Fingerprint, DateTime<FixedOffset>)>,
}

impl<S: MailSession> Engine<S> {
    /// Appends every archived message in range that the server lacks.
    ///
    /// # Errors
    ///
    /// Fatal errors ([`Error::is_fatal`]). Single append or folder failures
    /// are reported and skipped.
    pub async fn restore(&mut self, archive: &Archive, request: RestoreRequest) -> Result<RestoreReport> {
        let mut report = RestoreReport::default();
        tracing::info!(
            since = ?request.range.since,
            before = ?request.range.before,
            "restore started"
        );

        let mut cursor = archive.iterate(request.range);
        let mut target: Option<Target> = None;

        while let Some(entry) = cursor.next().await? {
            self.cancel.check()?;

            if target.as_ref().is_none_or(|t| t.folder != entry.folder) {
                let prepared = self
                    .prepare_folder(archive, &entry.folder, &request.range, &mut report)
                    .await
                    .map_err(|e| self.abort("restore", e))?;
                target = Some(prepared);
            }
            let Some(current) = target.as_mut() else {
                continue;
            };

            self.restore_entry(archive, &entry, current, &mut report)
                .await
                .map_err(|e| self.abort(&current.display_name, e))?;
            current.done += 1;
            self.notifier
                .on_progress(&current.display_name, current.done, current.total);
        }

        tracing::info!(
            folders = report.folders,
            created = report.created_folders,
            appended = report.appended,
            already_present = report.already_present,
            errors = report.errors.len(),
            "restore finished"
        );
        Ok(report)
    }

    /// Creates the folder if needed and loads what it already holds.
    ///
    /// Only fatal errors are returned; anything else marks the target
    /// unusable.
    async fn prepare_folder(
        &mut self,
        archive: &Archive,
        folder: &str,
        range: &DateRange,
        report: &mut RestoreReport,
    ) -> Result<Target> {
        let display_name = folder_name::decode(folder);
        let total = usize::try_from(archive.count(folder, range).await?).unwrap_or(usize::MAX);
        tracing::info!(folder = %display_name, total, "restoring folder");
        report.folders += 1;

        let remote = match self.open_target(folder, report).await {
            Ok(remote) => Some(remote),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                self.record(&display_name, e, &mut report.errors);
                None
            }
        };

        Ok(Target {
            folder: folder.to_string(),
            display_name,
            total,
            done: 0,
            remote,
            appended: HashSet::new(),
        })
    }

    async fn open_target(
        &mut self,
        folder: &str,
        report: &mut RestoreReport,
    ) -> Result<RemoteMessages> {
        if !folder.eq_ignore_ascii_case("INBOX") && self.session.create_folder(folder).await? {
            tracing::debug!(folder, "folder created");
            report.created_folders += 1;
        }
        if self.config.restore_dedup {
            self.session.remote_fingerprints(folder).await
        } else {
            Ok(HashMap::new())
        }
    }

    /// Appends one entry unless the server already has it, in which case
    /// only its flags are brought back to the archived state.
    ///
    /// Only fatal errors are returned.
    async fn restore_entry(
        &mut self,
        archive: &Archive,
        entry: &ArchiveEntry,
        target: &mut Target,
        report: &mut RestoreReport,
    ) -> Result<()> {
        let Some(remote) = target.remote.as_mut() else {
            return Ok(());
        };

        let key = (entry.fingerprint.clone(), entry.internal_date);
        if target.appended.contains(&key) {
            report.already_present += 1;
            return Ok(());
        }
        let identity = (entry.internal_date.timestamp(), entry.size);
        if let Some(existing) = claim(remote, &identity, &entry.flags) {
            report.already_present += 1;
            if same_flags(&existing.flags, &entry.flags) {
                return Ok(());
            }
            return match self.session.set_flags(existing.uid, &entry.flags).await {
                Ok(()) => {
                    report.flags_updated += 1;
                    Ok(())
                }
                Err(e) if e.is_fatal() => Err(e),
                Err(e) => {
                    self.record(&target.display_name, e, &mut report.errors);
                    Ok(())
                }
            };
        }

        let outcome = match archive.read(&entry.reference).await {
            Ok(content) => {
                self.session
                    .append(&entry.folder, &content, &entry.flags, entry.internal_date)
                    .await
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                target.appended.insert(key);
                report.appended += 1;
                Ok(())
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                self.record(&target.display_name, e, &mut report.errors);
                Ok(())
            }
        }
    }
}

/// Takes one remote message with `identity` out of the pool, preferring
/// one whose flags already match.
fn claim(
    remote: &mut RemoteMessages,
    identity: &RemoteIdentity,
    flags: &[Flag],
) -> Option<RemoteMessage> {
    let candidates = remote.get_mut(identity)?;
    if candidates.is_empty() {
        return None;
    }
    let index = candidates
        .iter()
        .position(|m| same_flags(&m.flags, flags))
        .unwrap_or(0);
    Some(candidates.swap_remove(index))
}

/// Compares the flags a client can set, ignoring order.
fn same_flags(remote: &[Flag], archived: &[Flag]) -> bool {
    let settable = |flags: &[Flag]| -> HashSet<Flag> {
        flags.iter().filter(|f| f.is_settable()).cloned().collect()
    };
    settable(remote) == settable(archived)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn flag_comparison_ignores_order_and_recent() {
        assert!(same_flags(
            &[Flag::Seen, Flag::Recent, Flag::Flagged],
            &[Flag::Flagged, Flag::Seen]
        ));
        assert!(!same_flags(&[Flag::Seen], &[]));
    }

    #[test]
    fn each_remote_message_is_claimed_once() {
        let identity = (1_704_445_200, 40);
        let mut remote = RemoteMessages::new();
        remote.entry(identity).or_default().extend([
            RemoteMessage {
                uid: 1,
                flags: vec![],
            },
            RemoteMessage {
                uid: 2,
                flags: vec![Flag::Seen],
            },
        ]);

        assert_eq!(claim(&mut remote, &identity, &[Flag::Seen]).unwrap().uid, 2);
        assert_eq!(claim(&mut remote, &identity, &[Flag::Seen]).unwrap().uid, 1);
        assert_eq!(claim(&mut remote, &identity, &[Flag::Seen]), None);
        assert_eq!(claim(&mut remote, &(0, 0), &[]), None);
    }
}
