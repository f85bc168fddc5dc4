//! # mailvault-imap
//!
//! The async IMAP client behind mailvault. It speaks the subset of IMAP4rev1
//! a backup and restore tool needs and tolerates what real servers send.
//!
//! ## Features
//!
//! - **Type-state connection management**: Compile-time enforcement of valid
//!   IMAP state transitions (`NotAuthenticated` → `Authenticated` → `Selected`)
//! - **Archive-oriented commands**: LOGIN, `AUTHENTICATE XOAUTH2`, LIST,
//!   STATUS, EXAMINE, `UID SEARCH`, `UID FETCH`, `UID STORE`, APPEND,
//!   CREATE, DELETE and EXPUNGE
//! - **TLS via rustls**: Secure connections without OpenSSL dependency
//! - **Sans-I/O parser**: Protocol parsing separated from network I/O
//! - **Deadlines and reconnect**: [`Session`] bounds every round trip and
//!   can rebuild a dropped connection
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailvault_imap::{Config, Credentials, FetchItems, SearchCriteria, Session, UidSet};
//!
//! #[tokio::main]
//! async fn main() -> mailvault_imap::Result<()> {
//!     let mut session = Session::connect(Config::new("imap.example.com")).await?;
//!     session
//!         .login(&Credentials::password("user@example.com", "password"))
//!         .await?;
//!
//!     for folder in session.list().await? {
//!         println!("Folder: {}", folder.mailbox.as_str());
//!     }
//!
//!     let status = session.examine("INBOX").await?;
//!     println!("Messages: {}", status.exists);
//!
//!     let uids = session.uid_search(&SearchCriteria::All).await?;
//!     if let Some(set) = UidSet::from_uids(&uids) {
//!         let messages = session.uid_fetch(&set, FetchItems::identity()).await?;
//!         println!("Fetched {}", messages.len());
//!     }
//!
//!     session.logout().await
//! }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! ┌─────────────────────┐
//! │   NotAuthenticated  │ ─── login()/authenticate() ───→ Authenticated
//! └─────────────────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │    Authenticated    │ ─── select()/examine() ───→ Selected
//! └─────────────────────┘         (NO hands the client back)
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │      Selected       │ ─── close() ───→ Authenticated
//! └─────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`auth`]: Credentials and the XOAUTH2 initial response
//! - [`command`]: IMAP command builders and types
//! - [`connection`]: Connection management, type-state client and session
//! - [`date`]: IMAP date and date-time forms
//! - [`parser`]: Sans-I/O response parser
//! - [`types`]: Core IMAP types (flags, mailboxes, sequences, etc.)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod command;
pub mod connection;
pub mod date;
mod error;
pub mod parser;
pub mod types;

pub use auth::{Credentials, Secret};
pub use command::{
    Command, FetchAttribute, FetchItems, SearchCriteria, StatusAttribute, StoreAction, TagGenerator,
};
pub use connection::{
    Authenticated, Client, Config, ConfigBuilder, FramedStream, ImapStream, LoggedIn,
    NotAuthenticated, ResponseAccumulator, Security, Selected, Selection, Session,
};
pub use error::{Error, Result};
pub use parser::{FetchItem, Response, ResponseParser, StatusItem, UntaggedResponse};
pub use types::{
    Capability, Flag, Flags, ListResponse, Mailbox, MailboxAttribute, MailboxStatus, ResponseCode,
    SeqNum, SequenceSet, Status, Tag, Uid, UidSet, UidValidity,
};
