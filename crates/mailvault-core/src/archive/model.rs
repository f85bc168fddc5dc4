//! Archive data models.

use std::fmt::Write;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, Utc};
use mailvault_imap::Flag;
use sha2::{Digest, Sha256};

/// SHA-256 of the raw message bytes, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint of `content`.
    #[must_use]
    pub fn of(content: &[u8]) -> Self {
        let digest = Sha256::digest(content);
        let hex = digest.iter().fold(String::with_capacity(64), |mut s, b| {
            let _ = write!(s, "{b:02x}");
            s
        });
        Self(hex)
    }

    /// Wraps an already computed hex digest.
    #[must_use]
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Hex form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fetched message on its way into the archive.
#[derive(Debug, Clone)]
pub struct NewEntry {
    /// Wire name of the folder it was found in.
    pub folder: String,
    /// Server receipt time.
    pub internal_date: DateTime<FixedOffset>,
    /// Flags at backup time.
    pub flags: Vec<Flag>,
    /// Full RFC 822 bytes.
    pub content: Vec<u8>,
    /// UIDVALIDITY of the folder when fetched.
    pub uid_validity: Option<u32>,
    /// UID when fetched.
    pub uid: Option<u32>,
    /// When the backup run took it.
    pub archived_at: DateTime<Utc>,
}

/// Handle to one stored message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRef {
    /// Index row id.
    pub id: i64,
    /// Content file, relative to the archive root.
    pub path: PathBuf,
}

/// An indexed message.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveEntry {
    /// Where the content lives.
    pub reference: EntryRef,
    /// Wire name of the folder.
    pub folder: String,
    /// Server receipt time, with its original offset.
    pub internal_date: DateTime<FixedOffset>,
    /// Flags at backup time.
    pub flags: Vec<Flag>,
    /// Content fingerprint.
    pub fingerprint: Fingerprint,
    /// Content length in bytes.
    pub size: u64,
    /// UIDVALIDITY observed at backup time.
    pub uid_validity: Option<u32>,
    /// UID observed at backup time.
    pub uid: Option<u32>,
    /// When it was archived.
    pub archived_at: DateTime<Utc>,
}

/// Result of [`Archive::put`](super::Archive::put).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome {
    /// Newly written.
    Stored(EntryRef),
    /// Same content, folder and internal date were already archived.
    AlreadyPresent(EntryRef),
}

impl PutOutcome {
    /// The entry either way.
    #[must_use]
    pub const fn reference(&self) -> &EntryRef {
        match self {
            Self::Stored(r) | Self::AlreadyPresent(r) => r,
        }
    }
}
