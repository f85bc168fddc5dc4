//! Local message archive.
//!
//! ```text
//! <dir>/index.sqlite                          index
//! <dir>/messages/<segment>/<fingerprint>.eml  content files
//! <dir>/stamp                                 last successful backup
//! ```
//!
//! Content is written and synced before its index row is inserted, so a
//! crash leaves at worst an unreferenced file, never a row without content.
//! Entries are deduplicated on (fingerprint, folder, internal date).

mod consistency;
mod content;
mod index;
mod model;
mod stamp;

use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

pub use consistency::ConsistencyReport;
pub use index::CursorPosition;
pub use model::{ArchiveEntry, EntryRef, Fingerprint, NewEntry, PutOutcome};

use crate::date_range::DateRange;
use crate::{Error, Result};
use index::{Index, IndexRow};

const INDEX_FILE: &str = "index.sqlite";
const DEFAULT_PAGE_SIZE: u32 = 500;

/// One backup directory. The archive is its only writer.
pub struct Archive {
    root: PathBuf,
    index: Index,
    page_size: u32,
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("root", &self.root)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl Archive {
    /// Opens the archive in `root`, creating the directory and index as
    /// needed.
    ///
    /// # Errors
    ///
    /// [`Error::Store`] if the directory or database cannot be created.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(root.join(content::MESSAGES_DIR)).await?;
        let index = Index::open(&root.join(INDEX_FILE)).await?;
        tracing::debug!(root = %root.display(), "archive opened");
        Ok(Self {
            root,
            index,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Sets how many rows one index page holds during iteration.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// The archive directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stores one message unless an identical one is already archived.
    ///
    /// # Errors
    ///
    /// [`Error::Store`] on filesystem or database failure. The archive
    /// stays usable; rerunning the backup resumes where it stopped.
    pub async fn put(&self, entry: NewEntry) -> Result<PutOutcome> {
        let fingerprint = Fingerprint::of(&entry.content);
        let seconds = entry.internal_date.timestamp();

        if let Some(existing) = self.index.find(&fingerprint, &entry.folder, seconds).await? {
            return Ok(PutOutcome::AlreadyPresent(existing));
        }

        let path = content::relative_path(&entry.folder, &fingerprint);
        content::write_atomic(&self.root, &path, &entry.content).await?;

        let row = IndexRow {
            folder: &entry.folder,
            internal_date: &entry.internal_date,
            flags: &entry.flags,
            fingerprint: &fingerprint,
            size: entry.content.len() as u64,
            path: &path,
            uid_validity: entry.uid_validity,
            uid: entry.uid,
            archived_at: entry.archived_at,
        };
        match self.index.insert(&row).await? {
            Some(id) => Ok(PutOutcome::Stored(EntryRef { id, path })),
            None => self
                .index
                .find(&fingerprint, &entry.folder, seconds)
                .await?
                .map(PutOutcome::AlreadyPresent)
                .ok_or_else(|| Error::Corrupt("index rejected an entry it does not hold".into())),
        }
    }

    /// Content bytes of an entry.
    ///
    /// # Errors
    ///
    /// [`Error::Corrupt`] when the content file is missing, [`Error::Store`]
    /// for other read failures.
    pub async fn read(&self, reference: &EntryRef) -> Result<Vec<u8>> {
        match content::read(&self.root, &reference.path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::Corrupt(format!(
                "entry {} has no content at {}",
                reference.id,
                reference.path.display()
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Lazily walks entries in `range`, ordered by folder then internal
    /// date.
    #[must_use]
    pub fn iterate(&self, range: DateRange) -> EntryCursor<'_> {
        self.iterate_from(range, None)
    }

    /// Like [`Archive::iterate`], continuing after `position`.
    #[must_use]
    pub fn iterate_from(&self, range: DateRange, position: Option<CursorPosition>) -> EntryCursor<'_> {
        EntryCursor {
            index: &self.index,
            range,
            page_size: self.page_size,
            position,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    /// True if a message with this UID was archived from this folder
    /// under the same UIDVALIDITY.
    ///
    /// # Errors
    ///
    /// [`Error::Store`] on database failure.
    pub async fn contains_uid(&self, folder: &str, uid_validity: u32, uid: u32) -> Result<bool> {
        self.index.contains_uid(folder, uid_validity, uid).await
    }

    /// Entries of `folder` inside `range`.
    ///
    /// # Errors
    ///
    /// [`Error::Store`] on database failure.
    pub async fn count(&self, folder: &str, range: &DateRange) -> Result<u64> {
        self.index.count(folder, range).await
    }

    /// Number of entries.
    ///
    /// # Errors
    ///
    /// [`Error::Store`] on database failure.
    pub async fn len(&self) -> Result<u64> {
        self.index.len().await
    }

    /// True if nothing is archived.
    ///
    /// # Errors
    ///
    /// [`Error::Store`] on database failure.
    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Wire names of the archived folders, sorted.
    ///
    /// # Errors
    ///
    /// [`Error::Store`] on database failure.
    pub async fn folders(&self) -> Result<Vec<String>> {
        self.index.folders().await
    }

    /// Time of the last fully successful backup, if recorded.
    ///
    /// # Errors
    ///
    /// [`Error::Store`] if the stamp exists but cannot be read.
    pub async fn read_stamp(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(stamp::read(&self.root).await?)
    }

    /// Records `at` as the last successful backup. The stamp never moves
    /// backwards; returns whether it changed.
    ///
    /// # Errors
    ///
    /// [`Error::Store`] if the stamp cannot be written.
    pub async fn write_stamp(&self, at: DateTime<Utc>) -> Result<bool> {
        Ok(stamp::advance(&self.root, at).await?)
    }

    /// Compares index rows with content files.
    ///
    /// # Errors
    ///
    /// [`Error::Store`] if the index or directory cannot be read.
    pub async fn check_consistency(&self) -> Result<ConsistencyReport> {
        let references = self.index.references().await?;
        Ok(consistency::check(&self.root, references).await?)
    }

    /// Closes the index.
    pub async fn close(self) {
        self.index.close().await;
    }
}

/// Keyset-paged walk over the index.
///
/// Holding a cursor keeps no database connection busy between pages.
/// [`EntryCursor::position`] can be stored and handed to
/// [`Archive::iterate_from`] to continue later.
pub struct EntryCursor<'a> {
    index: &'a Index,
    range: DateRange,
    page_size: u32,
    position: Option<CursorPosition>,
    buffer: VecDeque<ArchiveEntry>,
    exhausted: bool,
}

impl EntryCursor<'_> {
    /// Next entry, or `None` at the end.
    ///
    /// # Errors
    ///
    /// [`Error::Store`] or [`Error::Corrupt`] for unreadable rows.
    pub async fn next(&mut self) -> Result<Option<ArchiveEntry>> {
        if self.buffer.is_empty() && !self.exhausted {
            let page = self
                .index
                .page(&self.range, self.position.as_ref(), self.page_size)
                .await?;
            if page.len() < self.page_size as usize {
                self.exhausted = true;
            }
            self.buffer.extend(page);
        }

        let entry = self.buffer.pop_front();
        if let Some(entry) = &entry {
            self.position = Some(CursorPosition {
                folder: entry.folder.clone(),
                internal_date: entry.internal_date.timestamp(),
                id: entry.reference.id,
            });
        }
        Ok(entry)
    }

    /// Position after the last entry returned.
    #[must_use]
    pub const fn position(&self) -> Option<&CursorPosition> {
        self.position.as_ref()
    }
}
