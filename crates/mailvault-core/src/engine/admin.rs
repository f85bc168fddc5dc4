//! Whole-mailbox operations: clear and list.

use super::Engine;
use crate::session::{FolderInfo, MailSession};
use crate::{Error, Result};

/// Outcome of [`Engine::clear`].
#[derive(Debug, Default)]
pub struct ClearReport {
    /// Folders emptied.
    pub folders_emptied: usize,
    /// Messages expunged across all folders.
    pub messages_deleted: u64,
    /// Folders removed after emptying.
    pub folders_deleted: usize,
    /// Folders that could not be emptied or removed.
    pub errors: Vec<Error>,
}

/// One row of [`Engine::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderSummary {
    /// Decoded name.
    pub display_name: String,
    /// Wire name.
    pub wire_name: String,
    /// Messages in the folder; 0 for `\Noselect` folders.
    pub messages: u32,
}

impl<S: MailSession> Engine<S> {
    /// Deletes every message on the account, then every user folder when
    /// `clear_deletes_folders` is set.
    ///
    /// INBOX and special-use folders are emptied but never deleted.
    /// Confirmation is the caller's business.
    ///
    /// # Errors
    ///
    /// Fatal errors only; a folder that cannot be emptied is reported and
    /// skipped.
    pub async fn clear(&mut self) -> Result<ClearReport> {
        let mut report = ClearReport::default();
        let folders = self
            .session
            .list_folders()
            .await
            .map_err(|e| self.abort("clear", e))?;
        let selectable: Vec<&FolderInfo> = folders.iter().filter(|f| f.selectable).collect();
        let total = selectable.len();

        for (index, folder) in selectable.iter().enumerate() {
            self.cancel.check()?;
            match self.empty_folder(folder).await {
                Ok(count) => {
                    report.folders_emptied += 1;
                    report.messages_deleted += u64::from(count);
                    tracing::info!(folder = %folder.display_name, count, "folder emptied");
                }
                Err(e) if e.is_fatal() => return Err(self.abort(&folder.display_name, e)),
                Err(e) => self.record(&folder.display_name, e, &mut report.errors),
            }
            self.notifier.on_progress(&folder.display_name, index + 1, total);
        }

        if self.config.clear_deletes_folders {
            // Children are listed after their parents.
            for folder in selectable.iter().rev().filter(|f| !f.system) {
                self.cancel.check()?;
                match self.session.delete_folder(&folder.name).await {
                    Ok(()) => {
                        report.folders_deleted += 1;
                        tracing::info!(folder = %folder.display_name, "folder deleted");
                    }
                    Err(e) if e.is_fatal() => return Err(self.abort(&folder.display_name, e)),
                    Err(e) => self.record(&folder.display_name, e, &mut report.errors),
                }
            }
        }

        Ok(report)
    }

    async fn empty_folder(&mut self, folder: &FolderInfo) -> Result<u32> {
        let state = self.session.select(&folder.name).await?;
        if state.exists == 0 {
            return Ok(0);
        }
        self.session.expunge_all().await
    }

    /// Every folder with its message count, in listing order.
    ///
    /// Counts come from STATUS; no message is opened. A folder whose count
    /// cannot be read is reported and listed with 0.
    ///
    /// # Errors
    ///
    /// Fatal errors only.
    pub async fn list(&mut self) -> Result<Vec<FolderSummary>> {
        let folders = self
            .session
            .list_folders()
            .await
            .map_err(|e| self.abort("list", e))?;

        let mut summaries = Vec::with_capacity(folders.len());
        for folder in folders {
            let messages = if folder.selectable {
                match self.session.message_count(&folder.name).await {
                    Ok(n) => n,
                    Err(e) if e.is_fatal() => return Err(self.abort(&folder.display_name, e)),
                    Err(e) => {
                        tracing::warn!(folder = %folder.display_name, error = %e, "count unavailable");
                        self.notifier.on_error(&folder.display_name, &e);
                        0
                    }
                }
            } else {
                0
            };
            summaries.push(FolderSummary {
                display_name: folder.display_name,
                wire_name: folder.name,
                messages,
            });
        }
        Ok(summaries)
    }
}
