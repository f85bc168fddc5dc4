//! IMAP connection management.
//!
//! This module provides connection handling for IMAP servers, including:
//! - Configuration (host, port, security mode, deadlines)
//! - TLS/plaintext stream abstraction
//! - Framed I/O for IMAP protocol
//! - Type-state connection wrapper
//! - High-level session with reconnect

mod client;
mod config;
mod framed;
mod session;
mod stream;

pub use client::{Authenticated, Client, LoggedIn, NotAuthenticated, Selected, Selection};
pub use config::{Config, ConfigBuilder, Security};
pub use framed::{FramedStream, ResponseAccumulator};
pub use session::Session;
pub use stream::{ImapStream, connect, connect_plain, connect_tls, create_tls_connector};
