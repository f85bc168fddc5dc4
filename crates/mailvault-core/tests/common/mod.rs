//! In-memory mail server for engine tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::{DateTime, FixedOffset};
use mailvault_core::session::{RemoteMessage, RemoteMessages};
use mailvault_core::{
    DateRange, Error, FetchResult, FetchedMessage, FolderInfo, FolderState, MailSession, Notifier,
    Result,
};
use mailvault_imap::{Credentials, Flag};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeMessage {
    pub uid: u32,
    pub flags: Vec<Flag>,
    pub internal_date: DateTime<FixedOffset>,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct FakeFolder {
    pub info: FolderInfo,
    pub uid_validity: u32,
    pub next_uid: u32,
    pub messages: Vec<FakeMessage>,
}

/// A mailbox plus the knobs tests turn to make it misbehave.
#[derive(Debug, Default)]
pub struct FakeSession {
    pub folders: Vec<FakeFolder>,
    pub selected: Option<String>,
    pub authenticated: bool,
    /// (folder, uid) pairs whose fetch is skipped.
    pub broken_fetches: HashSet<(String, u32)>,
    /// Fetches fail with a connection error once this many have succeeded.
    pub connection_dies_after: Option<usize>,
    pub fetches: usize,
    /// The next this many appends get an unreadable reply.
    pub garbled_appends: usize,
    pub appends: usize,
    pub flag_updates: usize,
    pub password: String,
}

pub fn date(text: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(text).unwrap()
}

impl FakeSession {
    pub fn new() -> Self {
        Self {
            password: "secret".to_string(),
            ..Self::default()
        }
    }

    pub fn with_folder(mut self, name: &str) -> Self {
        self.add_folder(FolderInfo::new(name), 1);
        self
    }

    pub fn add_folder(&mut self, info: FolderInfo, uid_validity: u32) {
        self.folders.push(FakeFolder {
            info,
            uid_validity,
            next_uid: 1,
            messages: Vec::new(),
        });
    }

    pub fn set_flags_of(&mut self, folder: &str, uid: u32, flags: &[Flag]) {
        let folder = self.folder_mut(folder).unwrap();
        let message = folder.messages.iter_mut().find(|m| m.uid == uid).unwrap();
        message.flags = flags.to_vec();
    }

    pub fn remove(&mut self, folder: &str, uid: u32) {
        let folder = self.folder_mut(folder).unwrap();
        folder.messages.retain(|m| m.uid != uid);
    }

    /// Adds a message; the content is derived from `subject`.
    pub fn deliver(&mut self, folder: &str, subject: &str, internal_date: &str, flags: &[Flag]) {
        let content = format!("Subject: {subject}\r\n\r\nbody of {subject}\r\n").into_bytes();
        let folder = self.folder_mut(folder).unwrap();
        let uid = folder.next_uid;
        folder.next_uid += 1;
        folder.messages.push(FakeMessage {
            uid,
            flags: flags.to_vec(),
            internal_date: date(internal_date),
            content,
        });
    }

    pub fn folder(&self, name: &str) -> Option<&FakeFolder> {
        self.folders.iter().find(|f| f.info.name == name)
    }

    fn folder_mut(&mut self, name: &str) -> Option<&mut FakeFolder> {
        self.folders.iter_mut().find(|f| f.info.name == name)
    }

    /// Renumbers every message, as after a UIDVALIDITY change.
    pub fn renumber(&mut self) {
        for folder in &mut self.folders {
            folder.uid_validity += 1;
            for (i, message) in folder.messages.iter_mut().enumerate() {
                message.uid = u32::try_from(i).unwrap() + 100;
            }
            folder.next_uid = u32::try_from(folder.messages.len()).unwrap() + 100;
        }
    }

    /// (folder, flags, internal date, content) of every message.
    pub fn snapshot(&self) -> HashSet<(String, Vec<String>, i64, Vec<u8>)> {
        self.folders
            .iter()
            .flat_map(|f| {
                f.messages.iter().map(|m| {
                    let mut flags: Vec<String> =
                        m.flags.iter().map(|f| f.as_str().to_string()).collect();
                    flags.sort();
                    (
                        f.info.name.clone(),
                        flags,
                        m.internal_date.timestamp(),
                        m.content.clone(),
                    )
                })
            })
            .collect()
    }

    pub fn total_messages(&self) -> usize {
        self.folders.iter().map(|f| f.messages.len()).sum()
    }

    fn require_login(&self) -> Result<()> {
        if self.authenticated {
            Ok(())
        } else {
            Err(Error::Protocol("not authenticated".to_string()))
        }
    }

    fn open(&mut self, name: &str) -> Result<FolderState> {
        self.require_login()?;
        let folder = self
            .folder(name)
            .filter(|f| f.info.selectable)
            .ok_or_else(|| Error::Folder {
                folder: name.to_string(),
                reason: "Mailbox does not exist".to_string(),
            })?;
        let state = FolderState {
            exists: u32::try_from(folder.messages.len()).unwrap(),
            uid_validity: Some(folder.uid_validity),
        };
        self.selected = Some(name.to_string());
        Ok(state)
    }

    fn current(&mut self) -> Result<&mut FakeFolder> {
        let name = self
            .selected
            .clone()
            .ok_or_else(|| Error::Protocol("no folder selected".to_string()))?;
        self.folder_mut(&name)
            .ok_or_else(|| Error::Protocol("selected folder vanished".to_string()))
    }
}

impl MailSession for FakeSession {
    async fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        match &credentials.secret {
            mailvault_imap::Secret::Password(p) if *p == self.password => {
                self.authenticated = true;
                Ok(())
            }
            _ => Err(Error::Auth("invalid credentials".to_string())),
        }
    }

    async fn list_folders(&mut self) -> Result<Vec<FolderInfo>> {
        self.require_login()?;
        Ok(self.folders.iter().map(|f| f.info.clone()).collect())
    }

    async fn select(&mut self, folder: &str) -> Result<FolderState> {
        self.open(folder)
    }

    async fn select_read_only(&mut self, folder: &str) -> Result<FolderState> {
        self.open(folder)
    }

    async fn search(&mut self, criteria: &DateRange) -> Result<Vec<u32>> {
        let folder = self.current()?;
        let mut uids: Vec<u32> = folder
            .messages
            .iter()
            .filter(|m| criteria.contains(&m.internal_date))
            .map(|m| m.uid)
            .collect();
        uids.sort_unstable();
        Ok(uids)
    }

    async fn fetch(&mut self, uid: u32) -> Result<FetchResult> {
        if self.connection_dies_after == Some(self.fetches) {
            return Err(Error::Connection("connection reset by peer".to_string()));
        }
        let key = (self.selected.clone().unwrap_or_default(), uid);
        if self.broken_fetches.contains(&key) {
            return Ok(FetchResult::Skipped("server answered NO".to_string()));
        }
        self.fetches += 1;

        let folder = self.current()?;
        Ok(match folder.messages.iter().find(|m| m.uid == uid) {
            Some(m) => FetchResult::Fetched(FetchedMessage {
                uid,
                flags: m.flags.clone(),
                internal_date: m.internal_date,
                content: m.content.clone(),
            }),
            None => FetchResult::Skipped("no such message".to_string()),
        })
    }

    async fn append(
        &mut self,
        folder: &str,
        content: &[u8],
        flags: &[Flag],
        internal_date: DateTime<FixedOffset>,
    ) -> Result<()> {
        self.require_login()?;
        if self.garbled_appends > 0 {
            self.garbled_appends -= 1;
            return Err(Error::Protocol("unexpected token in APPEND reply".to_string()));
        }
        self.appends += 1;
        let target = self.folder_mut(folder).ok_or_else(|| Error::Append {
            folder: folder.to_string(),
            reason: "[TRYCREATE] no such mailbox".to_string(),
        })?;
        let uid = target.next_uid;
        target.next_uid += 1;
        target.messages.push(FakeMessage {
            uid,
            flags: flags.iter().filter(|f| f.is_settable()).cloned().collect(),
            internal_date,
            content: content.to_vec(),
        });
        Ok(())
    }

    async fn set_flags(&mut self, uid: u32, flags: &[Flag]) -> Result<()> {
        self.flag_updates += 1;
        let folder = self.current()?;
        let message = folder
            .messages
            .iter_mut()
            .find(|m| m.uid == uid)
            .ok_or_else(|| Error::Protocol(format!("no message with UID {uid}")))?;
        message.flags = flags.iter().filter(|f| f.is_settable()).cloned().collect();
        Ok(())
    }

    async fn create_folder(&mut self, name: &str) -> Result<bool> {
        self.require_login()?;
        if self.folder(name).is_some() {
            return Ok(false);
        }
        self.add_folder(FolderInfo::new(name), 1);
        Ok(true)
    }

    async fn delete_folder(&mut self, name: &str) -> Result<()> {
        self.require_login()?;
        let before = self.folders.len();
        self.folders.retain(|f| f.info.name != name);
        if self.folders.len() == before {
            return Err(Error::Folder {
                folder: name.to_string(),
                reason: "no such mailbox".to_string(),
            });
        }
        if self.selected.as_deref() == Some(name) {
            self.selected = None;
        }
        Ok(())
    }

    async fn message_count(&mut self, folder: &str) -> Result<u32> {
        self.require_login()?;
        self.folder(folder)
            .map(|f| u32::try_from(f.messages.len()).unwrap())
            .ok_or_else(|| Error::Folder {
                folder: folder.to_string(),
                reason: "no such mailbox".to_string(),
            })
    }

    async fn expunge_all(&mut self) -> Result<u32> {
        let folder = self.current()?;
        let count = u32::try_from(folder.messages.len()).unwrap();
        folder.messages.clear();
        Ok(count)
    }

    async fn remote_fingerprints(&mut self, folder: &str) -> Result<RemoteMessages> {
        self.open(folder)?;
        let folder = self.current()?;
        let mut remote = RemoteMessages::new();
        for m in &folder.messages {
            let identity = (m.internal_date.timestamp(), m.content.len() as u64);
            remote.entry(identity).or_default().push(RemoteMessage {
                uid: m.uid,
                flags: m.flags.clone(),
            });
        }
        Ok(remote)
    }

    async fn logout(&mut self) -> Result<()> {
        self.authenticated = false;
        self.selected = None;
        Ok(())
    }
}

/// Notifier that remembers what it was told.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub errors: Mutex<Vec<(String, String)>>,
    pub progress: Mutex<Vec<(String, usize, usize)>>,
}

impl RecordingNotifier {
    pub fn error_count(&self) -> usize {
        self.errors.lock().unwrap().len()
    }
}

impl Notifier for RecordingNotifier {
    fn on_progress(&self, folder: &str, index: usize, total: usize) {
        self.progress
            .lock()
            .unwrap()
            .push((folder.to_string(), index, total));
    }

    fn on_error(&self, context: &str, error: &Error) {
        self.errors
            .lock()
            .unwrap()
            .push((context.to_string(), error.to_string()));
    }
}
