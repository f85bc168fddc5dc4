//! High-level session over the type-state client.
//!
//! `Session` owns one connection and hides the state transitions behind
//! `&mut self` methods. Every network round trip is bounded by the
//! configured deadlines. A transport failure or timeout drops the connection
//! (the stream position is unknown afterwards); [`Session::reconnect`]
//! re-establishes it, logs in again with the remembered credentials and
//! reopens the last mailbox.
//!
//! Retrying is the caller's decision; `Session` never loops on its own.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};

use super::client::{Authenticated, Client, LoggedIn, NotAuthenticated, Selected, Selection};
use super::config::Config;
use super::stream::{self, ImapStream};
use crate::auth::Credentials;
use crate::command::{FetchItems, SearchCriteria, StatusAttribute, StoreAction};
use crate::parser::{FetchItem, StatusItem};
use crate::types::{Capability, Flag, ListResponse, MailboxStatus, SeqNum, Uid, UidSet};
use crate::{Error, Result};

enum SessionState {
    Disconnected,
    Connected(Client<ImapStream, NotAuthenticated>),
    Authenticated(Client<ImapStream, Authenticated>),
    Selected(Client<ImapStream, Selected>),
}

/// One IMAP connection with deadlines and reconnect support.
pub struct Session {
    config: Config,
    credentials: Option<Credentials>,
    state: SessionState,
    /// Mailbox to reopen after a reconnect, with its read-only flag.
    last_mailbox: Option<(String, bool)>,
}

async fn with_deadline<T>(limit: Duration, fut: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| Error::Timeout(limit))?
}

async fn open_connection(config: &Config) -> Result<Client<ImapStream, NotAuthenticated>> {
    let stream = stream::connect(config).await?;
    with_deadline(config.connect_timeout, Client::from_stream(stream)).await
}

async fn open_on<St: LoggedIn>(
    client: Client<ImapStream, St>,
    mailbox: &str,
    read_only: bool,
) -> Result<Selection<ImapStream>> {
    if read_only {
        client.examine(mailbox).await
    } else {
        client.select(mailbox).await
    }
}

/// Runs `$body` against the logged-in client, whichever state it is in.
macro_rules! logged_in {
    ($self:ident, |$client:ident| $body:expr) => {{
        let limit = $self.config.command_timeout;
        let result = match &mut $self.state {
            SessionState::Authenticated($client) => with_deadline(limit, $body).await,
            SessionState::Selected($client) => with_deadline(limit, $body).await,
            _ => Err(Error::InvalidState("not logged in".to_string())),
        };
        $self.settle(result)
    }};
}

/// Runs `$body` against the client with an open mailbox.
macro_rules! selected {
    ($self:ident, |$client:ident| $body:expr) => {{
        let limit = $self.config.command_timeout;
        let result = match &mut $self.state {
            SessionState::Selected($client) => with_deadline(limit, $body).await,
            _ => Err(Error::InvalidState("no mailbox selected".to_string())),
        };
        $self.settle(result)
    }};
}

impl Session {
    /// Connects and reads the greeting. Call [`Session::login`] next.
    ///
    /// # Errors
    ///
    /// Transport, TLS or timeout errors, or a `BYE` greeting.
    pub async fn connect(config: Config) -> Result<Self> {
        tracing::debug!(host = %config.host, port = config.port, "connecting");
        let client = open_connection(&config).await?;
        Ok(Self {
            config,
            credentials: None,
            state: SessionState::Connected(client),
            last_mailbox: None,
        })
    }

    /// Authenticates and remembers the credentials for reconnects.
    ///
    /// # Errors
    ///
    /// [`Error::Auth`] when the server rejects the credentials; the
    /// connection is closed in that case.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        let SessionState::Connected(client) =
            std::mem::replace(&mut self.state, SessionState::Disconnected)
        else {
            return Err(Error::InvalidState("login needs a fresh connection".to_string()));
        };

        let client = with_deadline(self.config.command_timeout, client.authenticate(credentials))
            .await?;
        tracing::debug!(username = %credentials.username, "authenticated");
        self.state = SessionState::Authenticated(client);
        self.credentials = Some(credentials.clone());
        Ok(())
    }

    /// True while a connection is open.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        !matches!(self.state, SessionState::Disconnected)
    }

    /// True when logged in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(
            self.state,
            SessionState::Authenticated(_) | SessionState::Selected(_)
        )
    }

    /// The open mailbox, if any.
    #[must_use]
    pub const fn selected(&self) -> Option<&Selected> {
        match &self.state {
            SessionState::Selected(client) => Some(client.selected()),
            _ => None,
        }
    }

    /// Capabilities of the current connection.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        match &self.state {
            SessionState::Disconnected => &[],
            SessionState::Connected(c) => c.capabilities(),
            SessionState::Authenticated(c) => c.capabilities(),
            SessionState::Selected(c) => c.capabilities(),
        }
    }

    /// Lists every mailbox (`LIST "" "*"`).
    ///
    /// # Errors
    ///
    /// Transport errors, or NO/BAD from the server.
    pub async fn list(&mut self) -> Result<Vec<ListResponse>> {
        logged_in!(self, |client| client.list("", "*"))
    }

    /// STATUS for one mailbox.
    ///
    /// # Errors
    ///
    /// Transport errors, or NO/BAD from the server.
    pub async fn status(
        &mut self,
        mailbox: &str,
        items: Vec<StatusAttribute>,
    ) -> Result<Vec<StatusItem>> {
        logged_in!(self, |client| client.status(mailbox, items))
    }

    /// CREATE.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyExists`] when the server reports the name taken.
    pub async fn create(&mut self, mailbox: &str) -> Result<()> {
        logged_in!(self, |client| client.create(mailbox))
    }

    /// DELETE.
    ///
    /// # Errors
    ///
    /// Transport errors, or NO/BAD from the server.
    pub async fn delete(&mut self, mailbox: &str) -> Result<()> {
        logged_in!(self, |client| client.delete(mailbox))
    }

    /// APPEND.
    ///
    /// # Errors
    ///
    /// Transport errors, or NO/BAD from the server.
    pub async fn append(
        &mut self,
        mailbox: &str,
        flags: &[Flag],
        internal_date: Option<DateTime<FixedOffset>>,
        message: &[u8],
    ) -> Result<Option<Uid>> {
        logged_in!(self, |client| client.append(
            mailbox,
            flags,
            internal_date,
            message
        ))
    }

    /// EXAMINE: open read-only.
    ///
    /// # Errors
    ///
    /// NO/BAD (e.g. [`Error::NonExistent`]) leave the session logged in with
    /// no mailbox open.
    pub async fn examine(&mut self, mailbox: &str) -> Result<MailboxStatus> {
        self.open(mailbox, true).await
    }

    /// SELECT: open read-write.
    ///
    /// # Errors
    ///
    /// As for [`Session::examine`].
    pub async fn select(&mut self, mailbox: &str) -> Result<MailboxStatus> {
        self.open(mailbox, false).await
    }

    async fn open(&mut self, mailbox: &str, read_only: bool) -> Result<MailboxStatus> {
        let limit = self.config.command_timeout;
        let attempt = match std::mem::replace(&mut self.state, SessionState::Disconnected) {
            SessionState::Authenticated(c) => with_deadline(limit, open_on(c, mailbox, read_only)).await,
            SessionState::Selected(c) => with_deadline(limit, open_on(c, mailbox, read_only)).await,
            other => {
                self.state = other;
                return Err(Error::InvalidState("not logged in".to_string()));
            }
        };

        match attempt {
            Ok(Selection::Selected(client)) => {
                let status = client.selected().status().clone();
                self.state = SessionState::Selected(client);
                self.last_mailbox = Some((mailbox.to_string(), read_only));
                Ok(status)
            }
            Ok(Selection::Rejected(client, e)) => {
                self.state = SessionState::Authenticated(client);
                self.last_mailbox = None;
                Err(e)
            }
            Err(e) => {
                // Connection is gone; a reconnect should land back here.
                self.last_mailbox = Some((mailbox.to_string(), read_only));
                Err(e)
            }
        }
    }

    /// `UID SEARCH` in the open mailbox.
    ///
    /// # Errors
    ///
    /// Transport errors, NO/BAD, or no open mailbox.
    pub async fn uid_search(&mut self, criteria: &SearchCriteria) -> Result<Vec<Uid>> {
        selected!(self, |client| client.uid_search(criteria))
    }

    /// `UID FETCH` in the open mailbox.
    ///
    /// # Errors
    ///
    /// Transport errors, NO/BAD, or no open mailbox.
    pub async fn uid_fetch(
        &mut self,
        uids: &UidSet,
        items: FetchItems,
    ) -> Result<Vec<(SeqNum, Vec<FetchItem>)>> {
        selected!(self, |client| client.uid_fetch(uids, items))
    }

    /// `UID STORE` in the open mailbox.
    ///
    /// # Errors
    ///
    /// Transport errors, NO/BAD, or no open mailbox.
    pub async fn uid_store(&mut self, uids: &UidSet, action: StoreAction, silent: bool) -> Result<()> {
        selected!(self, |client| client.uid_store(uids, action, silent))
    }

    /// EXPUNGE in the open mailbox.
    ///
    /// # Errors
    ///
    /// Transport errors, NO/BAD, or no open mailbox.
    pub async fn expunge(&mut self) -> Result<Vec<SeqNum>> {
        selected!(self, |client| client.expunge())
    }

    /// Drops the current connection, connects again, logs in with the
    /// remembered credentials and reopens the last mailbox.
    ///
    /// # Errors
    ///
    /// Connection errors, [`Error::Auth`], or the reopen failing.
    pub async fn reconnect(&mut self) -> Result<()> {
        self.state = SessionState::Disconnected;
        let credentials = self
            .credentials
            .clone()
            .ok_or_else(|| Error::InvalidState("reconnect before first login".to_string()))?;

        tracing::info!(host = %self.config.host, "reconnecting");
        self.state = SessionState::Connected(open_connection(&self.config).await?);
        self.login(&credentials).await?;

        if let Some((mailbox, read_only)) = self.last_mailbox.clone() {
            self.open(&mailbox, read_only).await?;
        }
        Ok(())
    }

    /// LOGOUT and close. Safe to call in any state.
    ///
    /// # Errors
    ///
    /// Only errors writing the LOGOUT command itself.
    pub async fn logout(&mut self) -> Result<()> {
        let limit = self.config.command_timeout;
        self.last_mailbox = None;
        match std::mem::replace(&mut self.state, SessionState::Disconnected) {
            SessionState::Disconnected => Ok(()),
            SessionState::Connected(c) => with_deadline(limit, c.logout()).await,
            SessionState::Authenticated(c) => with_deadline(limit, c.logout()).await,
            SessionState::Selected(c) => with_deadline(limit, c.logout()).await,
        }
    }

    /// Drops the connection after failures that leave the stream unusable.
    fn settle<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result
            && (e.is_transient() || matches!(e, Error::Protocol(_) | Error::Parse { .. }))
        {
            tracing::warn!(error = %e, "dropping connection");
            self.state = SessionState::Disconnected;
        }
        result
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.config.host)
            .field("connected", &self.is_connected())
            .field("authenticated", &self.is_authenticated())
            .field("selected", &self.selected().map(|s| s.mailbox().as_str()))
            .finish_non_exhaustive()
    }
}
