//! SQLite index of archived messages.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use mailvault_imap::Flag;
use sqlx::Row;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};

use super::model::{ArchiveEntry, EntryRef, Fingerprint};
use crate::date_range::DateRange;
use crate::error::StoreError;
use crate::{Error, Result};

/// Position after the last entry returned by a page, in index order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorPosition {
    /// Wire name of the folder.
    pub folder: String,
    /// Internal date as Unix seconds.
    pub internal_date: i64,
    /// Row id.
    pub id: i64,
}

/// Row to insert; content must already be on disk.
pub(crate) struct IndexRow<'a> {
    pub folder: &'a str,
    pub internal_date: &'a DateTime<FixedOffset>,
    pub flags: &'a [Flag],
    pub fingerprint: &'a Fingerprint,
    pub size: u64,
    pub path: &'a Path,
    pub uid_validity: Option<u32>,
    pub uid: Option<u32>,
    pub archived_at: DateTime<Utc>,
}

pub(crate) struct Index {
    pool: SqlitePool,
}

impl Index {
    /// Opens or creates the database at `path`.
    pub(crate) async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(30));
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        let index = Self { pool };
        index.initialize().await?;
        Ok(index)
    }

    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                folder TEXT NOT NULL,
                internal_date INTEGER NOT NULL,
                utc_offset INTEGER NOT NULL,
                internal_day TEXT NOT NULL,
                flags TEXT NOT NULL,
                fingerprint TEXT NOT NULL,
                size INTEGER NOT NULL,
                content_path TEXT NOT NULL,
                uid_validity INTEGER,
                uid INTEGER,
                archived_at TEXT NOT NULL,
                UNIQUE(fingerprint, folder, internal_date)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Keyset order for iteration
        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_entries_order
            ON entries(folder, internal_date, id)
            ",
        )
        .execute(&self.pool)
        .await?;

        // Fetch-avoidance lookups
        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_entries_uid
            ON entries(folder, uid_validity, uid)
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a row; `None` when the dedup key already exists.
    pub(crate) async fn insert(&self, row: &IndexRow<'_>) -> Result<Option<i64>> {
        let flags: Vec<&str> = row.flags.iter().map(Flag::as_str).collect();
        let flags = serde_json::to_string(&flags).map_err(StoreError::from)?;

        let result = sqlx::query(
            r"
            INSERT INTO entries
                (folder, internal_date, utc_offset, internal_day, flags, fingerprint,
                 size, content_path, uid_validity, uid, archived_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(fingerprint, folder, internal_date) DO NOTHING
            ",
        )
        .bind(row.folder)
        .bind(row.internal_date.timestamp())
        .bind(row.internal_date.offset().local_minus_utc())
        .bind(day_key(row.internal_date))
        .bind(flags)
        .bind(row.fingerprint.as_str())
        .bind(i64::try_from(row.size).unwrap_or(i64::MAX))
        .bind(path_to_column(row.path))
        .bind(row.uid_validity.map(i64::from))
        .bind(row.uid.map(i64::from))
        .bind(row.archived_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok((result.rows_affected() == 1).then(|| result.last_insert_rowid()))
    }

    /// Looks up the dedup key.
    pub(crate) async fn find(
        &self,
        fingerprint: &Fingerprint,
        folder: &str,
        internal_date: i64,
    ) -> Result<Option<EntryRef>> {
        let row = sqlx::query(
            r"
            SELECT id, content_path FROM entries
            WHERE fingerprint = ? AND folder = ? AND internal_date = ?
            ",
        )
        .bind(fingerprint.as_str())
        .bind(folder)
        .bind(internal_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| entry_ref(&row)))
    }

    pub(crate) async fn contains_uid(&self, folder: &str, uid_validity: u32, uid: u32) -> Result<bool> {
        let row = sqlx::query(
            r"
            SELECT 1 FROM entries
            WHERE folder = ? AND uid_validity = ? AND uid = ?
            LIMIT 1
            ",
        )
        .bind(folder)
        .bind(i64::from(uid_validity))
        .bind(i64::from(uid))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    /// Up to `limit` entries after `after`, in (folder, internal date, id)
    /// order, restricted to `range`.
    pub(crate) async fn page(
        &self,
        range: &DateRange,
        after: Option<&CursorPosition>,
        limit: u32,
    ) -> Result<Vec<ArchiveEntry>> {
        let (since, before) = range_keys(range);
        let rows = sqlx::query(
            r"
            SELECT id, folder, internal_date, utc_offset, flags, fingerprint, size,
                   content_path, uid_validity, uid, archived_at
            FROM entries
            WHERE (? IS NULL OR internal_day >= ?)
              AND (? IS NULL OR internal_day < ?)
              AND (? IS NULL OR (folder, internal_date, id) > (?, ?, ?))
            ORDER BY folder, internal_date, id
            LIMIT ?
            ",
        )
        .bind(since.as_deref())
        .bind(since.as_deref())
        .bind(before.as_deref())
        .bind(before.as_deref())
        .bind(after.map(|p| p.folder.as_str()))
        .bind(after.map(|p| p.folder.as_str()))
        .bind(after.map(|p| p.internal_date))
        .bind(after.map(|p| p.id))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_entry).collect()
    }

    /// Entries of `folder` inside `range`.
    pub(crate) async fn count(&self, folder: &str, range: &DateRange) -> Result<u64> {
        let (since, before) = range_keys(range);
        let count: i64 = sqlx::query(
            r"
            SELECT COUNT(*) AS n FROM entries
            WHERE folder = ?
              AND (? IS NULL OR internal_day >= ?)
              AND (? IS NULL OR internal_day < ?)
            ",
        )
        .bind(folder)
        .bind(since.as_deref())
        .bind(since.as_deref())
        .bind(before.as_deref())
        .bind(before.as_deref())
        .fetch_one(&self.pool)
        .await?
        .get("n");
        Ok(u64::try_from(count).unwrap_or(0))
    }

    pub(crate) async fn len(&self) -> Result<u64> {
        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM entries")
            .fetch_one(&self.pool)
            .await?
            .get("n");
        Ok(u64::try_from(count).unwrap_or(0))
    }

    pub(crate) async fn folders(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT DISTINCT folder FROM entries ORDER BY folder")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|row| row.get("folder")).collect())
    }

    /// Every (id, content path) pair, for consistency checks.
    pub(crate) async fn references(&self) -> Result<Vec<EntryRef>> {
        let rows = sqlx::query("SELECT id, content_path FROM entries ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(entry_ref).collect())
    }

    pub(crate) async fn close(&self) {
        self.pool.close().await;
    }
}

/// `YYYY-MM-DD` of the instant in its own offset, the day IMAP SEARCH uses.
fn day_key(at: &DateTime<FixedOffset>) -> String {
    at.date_naive().format("%Y-%m-%d").to_string()
}

fn range_keys(range: &DateRange) -> (Option<String>, Option<String>) {
    let key = |d: chrono::NaiveDate| d.format("%Y-%m-%d").to_string();
    (range.since.map(key), range.before.map(key))
}

/// Content paths are stored with `/` separators on every platform.
fn path_to_column(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn column_to_path(column: &str) -> PathBuf {
    column.split('/').collect()
}

fn entry_ref(row: &SqliteRow) -> EntryRef {
    EntryRef {
        id: row.get("id"),
        path: column_to_path(row.get("content_path")),
    }
}

fn row_to_entry(row: &SqliteRow) -> Result<ArchiveEntry> {
    let reference = entry_ref(row);
    let seconds: i64 = row.get("internal_date");
    let offset: i32 = row.get("utc_offset");
    let internal_date = FixedOffset::east_opt(offset)
        .and_then(|tz| tz.timestamp_opt(seconds, 0).single())
        .ok_or_else(|| Error::Corrupt(format!("entry {} has an invalid date", reference.id)))?;

    let flags: String = row.get("flags");
    let flags: Vec<String> = serde_json::from_str(&flags).map_err(StoreError::from)?;
    let size: i64 = row.get("size");
    let archived_at: String = row.get("archived_at");
    let archived_at = DateTime::parse_from_rfc3339(&archived_at)
        .map_err(|_| Error::Corrupt(format!("entry {} has an invalid archive time", reference.id)))?
        .with_timezone(&Utc);

    Ok(ArchiveEntry {
        folder: row.get("folder"),
        internal_date,
        flags: flags.iter().map(|f| Flag::parse(f)).collect(),
        fingerprint: Fingerprint::from_hex(row.get::<String, _>("fingerprint")),
        size: u64::try_from(size).unwrap_or(0),
        uid_validity: row
            .get::<Option<i64>, _>("uid_validity")
            .and_then(|v| u32::try_from(v).ok()),
        uid: row
            .get::<Option<i64>, _>("uid")
            .and_then(|v| u32::try_from(v).ok()),
        archived_at,
        reference,
    })
}
