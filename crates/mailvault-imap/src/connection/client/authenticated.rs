//! Commands valid once logged in, with or without an open mailbox.

use chrono::{DateTime, FixedOffset};
use tokio::io::{AsyncRead, AsyncWrite};

use super::states::{Authenticated, LoggedIn, Selected};
use super::{Client, Reply, collect_reply};
use crate::command::{Command, StatusAttribute};
use crate::connection::framed::ResponseAccumulator;
use crate::parser::{StatusItem, UntaggedResponse};
use crate::types::{Flag, ListResponse, Mailbox, MailboxStatus, ResponseCode, Uid};
use crate::{Error, Result};

/// Outcome of SELECT or EXAMINE.
///
/// A NO or BAD leaves the connection usable in the authenticated state, so
/// the client comes back alongside the error. Transport failures are
/// returned as `Err` by the opening method instead.
#[derive(Debug)]
pub enum Selection<S> {
    /// The mailbox is open.
    Selected(Client<S, Selected>),
    /// The server refused; no mailbox is open.
    Rejected(Client<S, Authenticated>, Error),
}

impl<S, St> Client<S, St>
where
    S: AsyncRead + AsyncWrite + Unpin,
    St: LoggedIn,
{
    /// Opens `mailbox` read-write.
    pub async fn select(self, mailbox: &str) -> Result<Selection<S>> {
        self.open(Mailbox::new(mailbox), false).await
    }

    /// Opens `mailbox` read-only; fetching never sets `\Seen`.
    pub async fn examine(self, mailbox: &str) -> Result<Selection<S>> {
        self.open(Mailbox::new(mailbox), true).await
    }

    async fn open(mut self, mailbox: Mailbox, read_only: bool) -> Result<Selection<S>> {
        let command = if read_only {
            Command::Examine {
                mailbox: mailbox.clone(),
            }
        } else {
            Command::Select {
                mailbox: mailbox.clone(),
            }
        };

        match self.execute(&command).await {
            Ok(reply) => {
                let status = mailbox_status(&reply, read_only);
                tracing::debug!(mailbox = %mailbox, exists = status.exists, "mailbox opened");
                Ok(Selection::Selected(
                    self.into_state(Selected { mailbox, status }),
                ))
            }
            Err(
                e @ (Error::No(_) | Error::Bad(_) | Error::NonExistent(_) | Error::AlreadyExists(_)),
            ) => Ok(Selection::Rejected(self.into_state(Authenticated), e)),
            Err(e) => Err(e),
        }
    }

    /// LIST `reference` `pattern`.
    pub async fn list(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListResponse>> {
        let reply = self
            .execute(&Command::List {
                reference: reference.to_string(),
                pattern: pattern.to_string(),
            })
            .await?;
        Ok(reply
            .untagged
            .into_iter()
            .filter_map(|u| match u {
                UntaggedResponse::List(entry) => Some(entry),
                _ => None,
            })
            .collect())
    }

    /// STATUS without opening the mailbox.
    pub async fn status(
        &mut self,
        mailbox: &str,
        items: Vec<StatusAttribute>,
    ) -> Result<Vec<StatusItem>> {
        let reply = self
            .execute(&Command::Status {
                mailbox: Mailbox::new(mailbox),
                items,
            })
            .await?;
        Ok(reply
            .untagged
            .into_iter()
            .flat_map(|u| match u {
                UntaggedResponse::Status { items, .. } => items,
                _ => Vec::new(),
            })
            .collect())
    }

    /// CREATE. Fails with [`Error::AlreadyExists`] when the server says so.
    pub async fn create(&mut self, mailbox: &str) -> Result<()> {
        self.execute(&Command::Create {
            mailbox: Mailbox::new(mailbox),
        })
        .await
        .map(drop)
    }

    /// DELETE.
    pub async fn delete(&mut self, mailbox: &str) -> Result<()> {
        self.execute(&Command::Delete {
            mailbox: Mailbox::new(mailbox),
        })
        .await
        .map(drop)
    }

    /// APPEND one message.
    ///
    /// Non-settable flags such as `\Recent` are dropped. Returns the new UID
    /// when the server reports `APPENDUID`.
    pub async fn append(
        &mut self,
        mailbox: &str,
        flags: &[Flag],
        internal_date: Option<DateTime<FixedOffset>>,
        message: &[u8],
    ) -> Result<Option<Uid>> {
        let tag = self.tag_gen.next();
        let command = Command::Append {
            mailbox: Mailbox::new(mailbox),
            flags: flags.iter().filter(|f| f.is_settable()).cloned().collect(),
            internal_date,
            size: message.len(),
        };
        tracing::debug!(%tag, command = %command.redacted(), "sending command");
        self.stream.write_command(&command.serialize(&tag)).await?;

        let accumulator = ResponseAccumulator::new(tag.as_str());
        let mut raw = Vec::new();
        loop {
            let response = self.stream.read_response().await?;
            if response.starts_with(b"+") {
                break;
            }
            // Refused before the literal was sent.
            if accumulator.is_completion(&response) {
                raw.push(response);
                collect_reply(&tag, &raw)?;
                return Err(Error::Protocol(
                    "APPEND completed without a continuation".to_string(),
                ));
            }
            raw.push(response);
        }

        self.stream.write_raw(message).await?;
        self.stream.write_raw(b"\r\n").await?;

        raw.extend(accumulator.read_until_tagged(&mut self.stream).await?);
        let reply = collect_reply(&tag, &raw)?;
        Ok(match reply.code {
            Some(ResponseCode::AppendUid { uid, .. }) => Some(uid),
            _ => None,
        })
    }
}

/// Builds the mailbox snapshot from SELECT/EXAMINE data.
fn mailbox_status(reply: &Reply, read_only: bool) -> MailboxStatus {
    let mut status = MailboxStatus {
        read_only,
        ..MailboxStatus::default()
    };

    for untagged in &reply.untagged {
        match untagged {
            UntaggedResponse::Exists(n) => status.exists = *n,
            UntaggedResponse::Recent(n) => status.recent = *n,
            UntaggedResponse::Flags(flags) => status.flags = flags.clone(),
            UntaggedResponse::Ok {
                code: Some(ResponseCode::UidValidity(v)),
                ..
            } => status.uid_validity = Some(*v),
            UntaggedResponse::Ok {
                code: Some(ResponseCode::UidNext(u)),
                ..
            } => status.uid_next = Some(*u),
            _ => {}
        }
    }

    if matches!(reply.code, Some(ResponseCode::ReadOnly)) {
        status.read_only = true;
    }
    status
}
