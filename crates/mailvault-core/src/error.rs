//! Error types for the core library.

use mailvault_imap::Error as ImapError;
use thiserror::Error;

/// Errors that can occur in core operations.
///
/// Variants are grouped by how far a failure reaches: `Fetch` and `Append`
/// cost one message, `Folder` and `Protocol` cost one folder, everything
/// [`Error::is_fatal`] ends the run.
#[derive(Debug, Error)]
pub enum Error {
    /// Network, TLS or timeout failure that retries could not get past.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Credentials were rejected.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Server said something the client could not use.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A folder could not be opened, searched or created.
    #[error("Folder {folder}: {reason}")]
    Folder {
        /// Wire name of the folder.
        folder: String,
        /// Server or client explanation.
        reason: String,
    },

    /// One message could not be fetched.
    #[error("Fetch of UID {uid} in {folder} failed: {reason}")]
    Fetch {
        /// Wire name of the folder.
        folder: String,
        /// UID of the message.
        uid: u32,
        /// Why it was skipped.
        reason: String,
    },

    /// One message could not be appended.
    #[error("Append to {folder} failed: {reason}")]
    Append {
        /// Wire name of the folder.
        folder: String,
        /// Why it failed.
        reason: String,
    },

    /// Archive directory or index failure.
    #[error("Archive error: {0}")]
    Store(#[from] StoreError),

    /// Index row without its content file.
    #[error("Archive is inconsistent: {0}")]
    Corrupt(String),

    /// The run was cancelled between messages.
    #[error("Cancelled")]
    Cancelled,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A `YYYYMMDD` argument did not parse.
    #[error("Invalid date {0:?}, expected YYYYMMDD")]
    InvalidDate(String),

    /// `since` is not before `before`, so nothing could match.
    #[error("Empty date range: since {since} is not before {before}")]
    EmptyRange {
        /// First day included.
        since: chrono::NaiveDate,
        /// First day excluded.
        before: chrono::NaiveDate,
    },
}

/// Failures of the local archive.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error (disk full, permissions, ...).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Index database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored flags column did not decode.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Store(StoreError::Io(err))
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(StoreError::Database(err))
    }
}

impl Error {
    /// Classifies an IMAP error with no more specific context.
    #[must_use]
    pub fn from_imap(err: ImapError) -> Self {
        match err {
            ImapError::Auth(text) => Self::Auth(text),
            e if e.is_transient() => Self::Connection(e.to_string()),
            e @ ImapError::InvalidDnsName(_) => Self::Connection(e.to_string()),
            e => Self::Protocol(e.to_string()),
        }
    }

    /// Classifies an IMAP error raised while working on `folder`.
    ///
    /// Server refusals become [`Error::Folder`]; transport and
    /// authentication failures keep their run-level meaning.
    #[must_use]
    pub fn for_folder(folder: &str, err: ImapError) -> Self {
        match err {
            ImapError::No(reason)
            | ImapError::Bad(reason)
            | ImapError::NonExistent(reason)
            | ImapError::AlreadyExists(reason) => Self::Folder {
                folder: folder.to_string(),
                reason,
            },
            other => Self::from_imap(other),
        }
    }

    /// True for errors that end the whole run.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Auth(_) | Self::Store(_) | Self::Cancelled | Self::Config(_)
        )
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
