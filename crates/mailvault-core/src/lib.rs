//! # mailvault-core
//!
//! Backup and restore engine for IMAP mailboxes.
//!
//! This crate provides:
//! - The local archive (content files plus a `SQLite` index)
//! - Backup, restore, clear and list engines over a [`MailSession`]
//! - The [`ImapSession`] adapter for real servers
//! - Folder-name encoding and filesystem-safe path segments
//! - Configuration, retry policy and cancellation
//!
//! ```ignore
//! use mailvault_core::{Archive, BackupRequest, Engine, EngineConfig, ImapSession};
//! use mailvault_imap::Credentials;
//!
//! let config = EngineConfig::load(None)?;
//! let session = ImapSession::new(config.imap_config(), config.retry);
//! let mut engine = Engine::new(session, config);
//! engine.start(&Credentials::password("me@example.com", "secret")).await?;
//!
//! let archive = Archive::open("backup").await?;
//! let report = engine.backup(&archive, BackupRequest::default()).await?;
//! engine.finish().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod archive;
pub mod cancel;
pub mod clock;
pub mod config;
pub mod date_range;
pub mod engine;
mod error;
pub mod folder_name;
pub mod notifier;
pub mod retry;
pub mod session;
pub mod version;

pub use archive::{Archive, ArchiveEntry, ConsistencyReport, EntryCursor, NewEntry, PutOutcome};
pub use cancel::CancelFlag;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use date_range::DateRange;
pub use engine::{
    BackupReport, BackupRequest, ClearReport, Engine, FolderSummary, RestoreReport, RestoreRequest,
};
pub use error::{Error, Result, StoreError};
pub use notifier::{Notifier, SilentNotifier, TracingNotifier};
pub use retry::RetryPolicy;
pub use session::{FetchResult, FetchedMessage, FolderInfo, FolderState, ImapSession, MailSession};
pub use version::CURRENT_VERSION;
