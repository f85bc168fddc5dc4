//! Error types for the IMAP client.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during IMAP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error on the underlying socket.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake or record-layer failure.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Host name not usable as a TLS server name.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// Server response could not be parsed.
    #[error("Parse error at byte {position}: {message}")]
    Parse {
        /// Byte offset into the response line.
        position: usize,
        /// What the parser expected.
        message: String,
    },

    /// Credentials were rejected.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Tagged NO completion.
    #[error("Server returned NO: {0}")]
    No(String),

    /// Tagged NO carrying `[ALREADYEXISTS]`.
    #[error("Mailbox already exists: {0}")]
    AlreadyExists(String),

    /// Tagged NO carrying `[NONEXISTENT]`.
    #[error("Mailbox does not exist: {0}")]
    NonExistent(String),

    /// Tagged BAD completion.
    #[error("Server returned BAD: {0}")]
    Bad(String),

    /// Server closed the session with BYE.
    #[error("Server sent BYE: {0}")]
    Bye(String),

    /// A network operation exceeded its deadline.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// The session is not in a state that allows the command.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Reconnection gave up.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Unexpected data from the server.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl Error {
    /// Returns true for failures of the transport itself.
    ///
    /// These are worth a reconnect and retry. Server verdicts (`NO`/`BAD`),
    /// authentication failures and parse errors are not.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Tls(_) | Self::Timeout(_) | Self::Bye(_) | Self::ConnectionLost(_)
        )
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_failures_are_transient() {
        let io = Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset",
        ));
        assert!(io.is_transient());
        assert!(Error::Timeout(Duration::from_secs(5)).is_transient());
        assert!(Error::Bye("shutting down".into()).is_transient());
    }

    #[test]
    fn server_verdicts_are_not_transient() {
        assert!(!Error::No("no such message".into()).is_transient());
        assert!(!Error::Bad("syntax".into()).is_transient());
        assert!(!Error::NonExistent("Nope".into()).is_transient());
        assert!(!Error::Auth("invalid credentials".into()).is_transient());
        assert!(
            !Error::Parse {
                position: 3,
                message: "bad token".into()
            }
            .is_transient()
        );
    }
}
