//! The mail-server operations the engines rely on.
//!
//! [`MailSession`] is the seam between the engines and the network:
//! [`ImapSession`] implements it over `mailvault-imap`, and tests drive the
//! engines with an in-memory implementation.

#![allow(async_fn_in_trait)]

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use mailvault_imap::date::parse_date_time;
use mailvault_imap::{
    Config, Credentials, Error as ImapError, FetchItem, FetchItems, Flag, ListResponse,
    SearchCriteria, Session, StatusAttribute, StatusItem, StoreAction, Uid, UidSet,
};

use crate::date_range::DateRange;
use crate::folder_name;
use crate::retry::RetryPolicy;
use crate::{Error, Result};

/// One folder as listed by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderInfo {
    /// Wire (modified UTF-7) name.
    pub name: String,
    /// Decoded name for people.
    pub display_name: String,
    /// False for `\Noselect` and `\NonExistent`.
    pub selectable: bool,
    /// INBOX or a SPECIAL-USE folder such as `\Sent` or `\All`.
    pub system: bool,
}

impl FolderInfo {
    /// Builds the info for a plain selectable folder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: folder_name::decode(&name),
            system: name.eq_ignore_ascii_case("INBOX"),
            selectable: true,
            name,
        }
    }

    fn from_list(entry: &ListResponse) -> Self {
        let name = entry.mailbox.as_str().to_string();
        Self {
            display_name: folder_name::decode(&name),
            selectable: entry.is_selectable(),
            system: entry.mailbox.is_inbox() || entry.special_use().is_some(),
            name,
        }
    }
}

/// State of a freshly opened folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderState {
    /// Messages in the folder.
    pub exists: u32,
    /// UIDVALIDITY, when the server reported one.
    pub uid_validity: Option<u32>,
}

/// A complete message as fetched for the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMessage {
    /// UID in the selected folder.
    pub uid: u32,
    /// Flags at fetch time.
    pub flags: Vec<Flag>,
    /// Server receipt time.
    pub internal_date: DateTime<FixedOffset>,
    /// Full RFC 822 bytes.
    pub content: Vec<u8>,
}

/// Outcome of fetching one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// The message arrived intact.
    Fetched(FetchedMessage),
    /// The message could not be fetched; the run goes on without it.
    Skipped(String),
}

/// What makes two messages "the same" on the server during restore:
/// internal date in Unix seconds and size in bytes.
pub type RemoteIdentity = (i64, u64);

/// A message already in a restore target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteMessage {
    /// UID in the folder.
    pub uid: u32,
    /// Current flags, without `\Recent`.
    pub flags: Vec<Flag>,
}

/// The messages of a restore target by identity. Distinct messages may
/// share an identity, so each key holds all of them.
pub type RemoteMessages = HashMap<RemoteIdentity, Vec<RemoteMessage>>;

/// Operations on one authenticated mail account.
///
/// Strictly sequential; implementations bound every network call by a
/// timeout and own retry of transient failures.
pub trait MailSession {
    /// Opens the transport.
    async fn connect(&mut self) -> Result<()>;

    /// Authenticates. Rejected credentials are [`Error::Auth`], never retried.
    async fn login(&mut self, credentials: &Credentials) -> Result<()>;

    /// Every folder, in server order.
    async fn list_folders(&mut self) -> Result<Vec<FolderInfo>>;

    /// Opens `folder` read-write.
    async fn select(&mut self, folder: &str) -> Result<FolderState>;

    /// Opens `folder` read-only so that fetching leaves `\Seen` alone.
    async fn select_read_only(&mut self, folder: &str) -> Result<FolderState>;

    /// UIDs in the open folder matching `criteria`, ascending.
    async fn search(&mut self, criteria: &DateRange) -> Result<Vec<u32>>;

    /// Fetches one message of the open folder.
    ///
    /// Returns `Err` only when the session cannot be re-established.
    async fn fetch(&mut self, uid: u32) -> Result<FetchResult>;

    /// Appends a message. Not idempotent.
    async fn append(
        &mut self,
        folder: &str,
        content: &[u8],
        flags: &[Flag],
        internal_date: DateTime<FixedOffset>,
    ) -> Result<()>;

    /// Replaces the flags of one message in the open folder.
    async fn set_flags(&mut self, uid: u32, flags: &[Flag]) -> Result<()>;

    /// Creates a folder; `false` when it was already there.
    async fn create_folder(&mut self, name: &str) -> Result<bool>;

    /// Deletes a folder.
    async fn delete_folder(&mut self, name: &str) -> Result<()>;

    /// Messages in `folder`, without opening it.
    async fn message_count(&mut self, folder: &str) -> Result<u32>;

    /// Deletes every message of the open folder; returns how many.
    async fn expunge_all(&mut self) -> Result<u32>;

    /// Opens `folder` read-write and describes the messages it holds.
    async fn remote_fingerprints(&mut self, folder: &str) -> Result<RemoteMessages>;

    /// Ends the session.
    async fn logout(&mut self) -> Result<()>;
}

/// [`MailSession`] over a real IMAP connection.
#[derive(Debug)]
pub struct ImapSession {
    config: Config,
    retry: RetryPolicy,
    session: Option<Session>,
    selected: Option<String>,
}

/// Retries `$op` on transient failures, reconnecting in between.
macro_rules! with_retry {
    ($self:ident, $folder:expr, |$session:ident| $op:expr) => {{
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let $session = $self.live()?;
            match $op.await {
                Ok(value) => break Ok(value),
                Err(e) if e.is_transient() && $self.retry.allows_retry(attempt) => {
                    tracing::warn!(attempt, error = %e, "transient failure, retrying");
                    $self.retry.backoff(attempt).await;
                    $self.recover().await?;
                }
                Err(e) => break Err(match $folder {
                    Some(folder) => Error::for_folder(folder, e),
                    None => Error::from_imap(e),
                }),
            }
        }
    }};
}

impl ImapSession {
    /// A session that will connect with `config`.
    #[must_use]
    pub const fn new(config: Config, retry: RetryPolicy) -> Self {
        Self {
            config,
            retry,
            session: None,
            selected: None,
        }
    }

    fn live(&mut self) -> Result<&mut Session> {
        self.session
            .as_mut()
            .ok_or_else(|| Error::Connection("not connected".to_string()))
    }

    /// Re-establishes the connection, within the retry budget.
    ///
    /// Gives up with [`Error::Connection`], or [`Error::Auth`] at once if
    /// the server now refuses the credentials.
    async fn recover(&mut self) -> Result<()> {
        let session = self.live()?;
        if session.is_authenticated() {
            return Ok(());
        }

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let session = self.live()?;
            match session.reconnect().await {
                Ok(()) => {
                    tracing::info!(attempt, "session re-established");
                    return Ok(());
                }
                Err(ImapError::Auth(text)) => return Err(Error::Auth(text)),
                Err(e) if self.retry.allows_retry(attempt) => {
                    tracing::warn!(attempt, error = %e, "reconnect failed");
                    self.retry.backoff(attempt).await;
                }
                Err(e) => {
                    return Err(Error::Connection(format!(
                        "could not re-establish session after {attempt} attempts: {e}"
                    )));
                }
            }
        }
    }

    async fn open(&mut self, folder: &str, read_only: bool) -> Result<FolderState> {
        let status = with_retry!(self, Some(folder), |session| async {
            if read_only {
                session.examine(folder).await
            } else {
                session.select(folder).await
            }
        })?;
        self.selected = Some(folder.to_string());
        tracing::debug!(folder, exists = status.exists, read_only, "folder opened");
        Ok(FolderState {
            exists: status.exists,
            uid_validity: status.uid_validity.map(|v| v.get()),
        })
    }

    fn selected_folder(&self) -> &str {
        self.selected.as_deref().unwrap_or("")
    }
}

impl MailSession for ImapSession {
    async fn connect(&mut self) -> Result<()> {
        let session = Session::connect(self.config.clone())
            .await
            .map_err(Error::from_imap)?;
        tracing::info!(host = %self.config.host, "connected");
        self.session = Some(session);
        Ok(())
    }

    async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        self.live()?
            .login(credentials)
            .await
            .map_err(|e| match e {
                ImapError::No(text) => Error::Auth(text),
                other => Error::from_imap(other),
            })
    }

    async fn list_folders(&mut self) -> Result<Vec<FolderInfo>> {
        let entries = with_retry!(self, None::<&str>, |session| session.list())?;
        Ok(entries.iter().map(FolderInfo::from_list).collect())
    }

    async fn select(&mut self, folder: &str) -> Result<FolderState> {
        self.open(folder, false).await
    }

    async fn select_read_only(&mut self, folder: &str) -> Result<FolderState> {
        self.open(folder, true).await
    }

    async fn search(&mut self, criteria: &DateRange) -> Result<Vec<u32>> {
        let query = SearchCriteria::date_range(criteria.since, criteria.before);
        let folder = self.selected_folder().to_string();
        let uids = with_retry!(self, Some(folder.as_str()), |session| session.uid_search(&query))?;
        Ok(uids.into_iter().map(Uid::get).collect())
    }

    async fn fetch(&mut self, uid: u32) -> Result<FetchResult> {
        let Some(typed) = Uid::new(uid) else {
            return Ok(FetchResult::Skipped("UID 0 is not valid".to_string()));
        };
        let set = UidSet::single(typed);

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let session = self.live()?;
            match session.uid_fetch(&set, FetchItems::full_message()).await {
                Ok(responses) => {
                    // Servers may add unsolicited FETCH data for other messages.
                    let items = responses
                        .into_iter()
                        .map(|(_, items)| items)
                        .find(|items| {
                            items
                                .iter()
                                .any(|i| matches!(i, FetchItem::Uid(u) if *u == typed))
                        });
                    return Ok(match items {
                        Some(items) => message_from_items(uid, items),
                        None => FetchResult::Skipped("server returned no data".to_string()),
                    });
                }
                Err(e) if e.is_transient() && self.retry.allows_retry(attempt) => {
                    tracing::warn!(uid, attempt, error = %e, "fetch failed, retrying");
                    self.retry.backoff(attempt).await;
                    self.recover().await?;
                }
                Err(e) if e.is_transient() => {
                    // Leave the next message a working session, or fail the run.
                    self.recover().await?;
                    return Ok(FetchResult::Skipped(format!(
                        "gave up after {attempt} attempts: {e}"
                    )));
                }
                Err(ImapError::Auth(text)) => return Err(Error::Auth(text)),
                Err(e) => {
                    self.recover().await?;
                    return Ok(FetchResult::Skipped(e.to_string()));
                }
            }
        }
    }

    async fn append(
        &mut self,
        folder: &str,
        content: &[u8],
        flags: &[Flag],
        internal_date: DateTime<FixedOffset>,
    ) -> Result<()> {
        let flags: Vec<Flag> = flags.iter().filter(|f| f.is_settable()).cloned().collect();
        with_retry!(self, Some(folder), |session| session.append(
            folder,
            &flags,
            Some(internal_date),
            content
        ))
        .map(drop)
        .map_err(|e| match e {
            Error::Folder { folder, reason } => Error::Append { folder, reason },
            other => other,
        })
    }

    async fn set_flags(&mut self, uid: u32, flags: &[Flag]) -> Result<()> {
        let Some(uid) = Uid::new(uid) else {
            return Err(Error::Protocol("UID 0 is not valid".to_string()));
        };
        let set = UidSet::single(uid);
        let flags: Vec<Flag> = flags.iter().filter(|f| f.is_settable()).cloned().collect();
        let folder = self.selected_folder().to_string();
        with_retry!(self, Some(folder.as_str()), |session| session.uid_store(
            &set,
            StoreAction::Set(flags.clone()),
            true
        ))
    }

    async fn create_folder(&mut self, name: &str) -> Result<bool> {
        with_retry!(self, Some(name), |session| async {
            match session.create(name).await {
                Ok(()) => Ok(true),
                Err(ImapError::AlreadyExists(_)) => Ok(false),
                Err(e) => Err(e),
            }
        })
    }

    async fn delete_folder(&mut self, name: &str) -> Result<()> {
        with_retry!(self, Some(name), |session| session.delete(name))?;
        if self.selected.as_deref() == Some(name) {
            self.selected = None;
        }
        Ok(())
    }

    async fn message_count(&mut self, folder: &str) -> Result<u32> {
        let items = with_retry!(self, Some(folder), |session| session
            .status(folder, vec![StatusAttribute::Messages]))?;
        Ok(items
            .iter()
            .find_map(|item| match item {
                StatusItem::Messages(n) => Some(*n),
                _ => None,
            })
            .unwrap_or(0))
    }

    async fn expunge_all(&mut self) -> Result<u32> {
        let folder = self.selected_folder().to_string();
        let uids = with_retry!(self, Some(folder.as_str()), |session| session
            .uid_search(&SearchCriteria::All))?;
        let Some(set) = UidSet::from_uids(&uids) else {
            return Ok(0);
        };

        with_retry!(self, Some(folder.as_str()), |session| session.uid_store(
            &set,
            StoreAction::Add(vec![Flag::Deleted]),
            true
        ))?;
        with_retry!(self, Some(folder.as_str()), |session| session.expunge())?;
        tracing::debug!(folder, count = uids.len(), "expunged");
        Ok(u32::try_from(uids.len()).unwrap_or(u32::MAX))
    }

    async fn remote_fingerprints(&mut self, folder: &str) -> Result<RemoteMessages> {
        let state = self.select(folder).await?;
        if state.exists == 0 {
            return Ok(HashMap::new());
        }

        let responses = with_retry!(self, Some(folder), |session| session
            .uid_fetch(&UidSet::everything(), FetchItems::identity()))?;
        let mut remote = RemoteMessages::new();
        for (identity, message) in responses
            .into_iter()
            .filter_map(|(_, items)| identity_from_items(&items))
        {
            remote.entry(identity).or_default().push(message);
        }
        Ok(remote)
    }

    async fn logout(&mut self) -> Result<()> {
        self.selected = None;
        match self.session.take() {
            Some(mut session) => session.logout().await.map_err(Error::from_imap),
            None => Ok(()),
        }
    }
}

fn message_from_items(uid: u32, items: Vec<FetchItem>) -> FetchResult {
    let mut flags = Vec::new();
    let mut internal_date = None;
    let mut content = None;

    for item in items {
        match item {
            FetchItem::Flags(set) => {
                flags = set.iter().filter(|f| **f != Flag::Recent).cloned().collect();
            }
            FetchItem::InternalDate(text) => internal_date = parse_date_time(&text).ok(),
            FetchItem::Body {
                section: None,
                data,
            } => content = data,
            _ => {}
        }
    }

    match (internal_date, content) {
        (Some(internal_date), Some(content)) => FetchResult::Fetched(FetchedMessage {
            uid,
            flags,
            internal_date,
            content,
        }),
        (None, _) => FetchResult::Skipped("missing or unreadable INTERNALDATE".to_string()),
        (_, None) => FetchResult::Skipped("message body was NIL".to_string()),
    }
}

fn identity_from_items(items: &[FetchItem]) -> Option<(RemoteIdentity, RemoteMessage)> {
    let mut uid = None;
    let mut flags = Vec::new();
    let mut date = None;
    let mut size = None;
    for item in items {
        match item {
            FetchItem::Uid(u) => uid = Some(u.get()),
            FetchItem::Flags(set) => {
                flags = set.iter().filter(|f| **f != Flag::Recent).cloned().collect();
            }
            FetchItem::InternalDate(text) => date = parse_date_time(text).ok(),
            FetchItem::Rfc822Size(n) => size = Some(u64::from(*n)),
            _ => {}
        }
    }
    Some((
        (date?.timestamp(), size?),
        RemoteMessage { uid: uid?, flags },
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mailvault_imap::{Flags, Mailbox, MailboxAttribute};

    use super::*;

    #[test]
    fn folder_info_from_list() {
        let entry = ListResponse {
            attributes: vec![MailboxAttribute::NoSelect, MailboxAttribute::HasChildren],
            delimiter: Some('/'),
            mailbox: Mailbox::new("[Gmail]"),
        };
        let info = FolderInfo::from_list(&entry);
        assert!(!info.selectable);
        assert!(!info.system);

        let entry = ListResponse {
            attributes: vec![MailboxAttribute::Sent],
            delimiter: Some('/'),
            mailbox: Mailbox::new("[Gmail]/Gesendet"),
        };
        assert!(FolderInfo::from_list(&entry).system);

        let info = FolderInfo::new("Entw&APw-rfe");
        assert_eq!(info.display_name, "Entwürfe");
        assert!(FolderInfo::new("inbox").system);
    }

    #[test]
    fn fetch_items_become_a_message() {
        let mut flags = Flags::new();
        flags.insert(Flag::Seen);
        flags.insert(Flag::Recent);
        let items = vec![
            FetchItem::Uid(Uid::new(7).unwrap()),
            FetchItem::Flags(flags),
            FetchItem::InternalDate("05-Mar-2024 10:00:00 +0100".to_string()),
            FetchItem::Body {
                section: None,
                data: Some(b"Subject: hi\r\n\r\n".to_vec()),
            },
        ];

        let FetchResult::Fetched(message) = message_from_items(7, items) else {
            panic!("expected a message");
        };
        assert_eq!(message.flags, vec![Flag::Seen]);
        assert_eq!(message.internal_date.offset().local_minus_utc(), 3600);
        assert_eq!(message.content, b"Subject: hi\r\n\r\n");
    }

    #[test]
    fn incomplete_fetch_is_skipped() {
        let items = vec![FetchItem::Body {
            section: None,
            data: None,
        }];
        assert!(matches!(message_from_items(1, items), FetchResult::Skipped(_)));
    }

    #[test]
    fn identity_needs_uid_date_and_size() {
        let items = vec![
            FetchItem::InternalDate("05-Mar-2024 10:00:00 +0000".to_string()),
            FetchItem::Rfc822Size(42),
            FetchItem::Uid(Uid::new(9).unwrap()),
        ];
        let (identity, message) = identity_from_items(&items).unwrap();
        assert_eq!(identity, (1_709_632_800, 42));
        assert_eq!(message.uid, 9);
        assert!(message.flags.is_empty());
        assert_eq!(identity_from_items(&items[..2]), None);
    }

    #[tokio::test]
    async fn operations_need_a_connection() {
        let mut session = ImapSession::new(Config::new("localhost"), RetryPolicy::none());
        assert!(matches!(
            session.list_folders().await,
            Err(Error::Connection(_))
        ));
        assert!(session.logout().await.is_ok());
    }
}
