//! Type-state client.
//!
//! ```text
//! NotAuthenticated --login/authenticate--> Authenticated
//! Authenticated|Selected --select/examine--> Selected   (or back to Authenticated on NO)
//! Selected --close--> Authenticated
//! ```
//!
//! Each state exposes only the commands valid in it. Methods that change
//! state consume the client.

#![allow(clippy::missing_errors_doc)]

mod authenticated;
mod not_authenticated;
mod selected;
mod states;

use tokio::io::{AsyncRead, AsyncWrite};

pub use self::authenticated::Selection;
pub use self::states::{Authenticated, LoggedIn, NotAuthenticated, Selected};
use super::framed::{FramedStream, ResponseAccumulator};
use crate::command::{Command, TagGenerator};
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{Capability, ResponseCode, Status};
use crate::{Error, Result};

/// IMAP connection in state `State`.
pub struct Client<S, State> {
    pub(crate) stream: FramedStream<S>,
    pub(crate) tag_gen: TagGenerator,
    pub(crate) capabilities: Vec<Capability>,
    pub(crate) state: State,
}

impl<S, State: std::fmt::Debug> std::fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("state", &self.state)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// Untagged data and completion of one successful command.
#[derive(Debug, Default)]
pub(crate) struct Reply {
    pub(crate) untagged: Vec<UntaggedResponse>,
    pub(crate) code: Option<ResponseCode>,
}

impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Capabilities last advertised by the server.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// True if `cap` was advertised.
    #[must_use]
    pub fn has_capability(&self, cap: &Capability) -> bool {
        self.capabilities.contains(cap)
    }

    /// True if `AUTH=<mechanism>` was advertised.
    #[must_use]
    pub fn supports_auth(&self, mechanism: &str) -> bool {
        self.capabilities
            .iter()
            .any(|c| matches!(c, Capability::Auth(m) if m.eq_ignore_ascii_case(mechanism)))
    }

    /// Sends NOOP.
    pub async fn noop(&mut self) -> Result<()> {
        self.execute(&Command::Noop).await.map(drop)
    }

    /// Sends CAPABILITY and stores the answer.
    pub async fn capability(&mut self) -> Result<Vec<Capability>> {
        let reply = self.execute(&Command::Capability).await?;
        self.absorb_capabilities(&reply);
        Ok(self.capabilities.clone())
    }

    /// Sends one command and waits for its completion.
    ///
    /// Untagged responses that fail to parse are logged and dropped; the
    /// tagged completion must parse.
    pub(crate) async fn execute(&mut self, command: &Command) -> Result<Reply> {
        let tag = self.tag_gen.next();
        tracing::debug!(%tag, command = %command.redacted(), "sending command");
        self.stream.write_command(&command.serialize(&tag)).await?;
        let raw = ResponseAccumulator::new(tag.as_str())
            .read_until_tagged(&mut self.stream)
            .await?;
        collect_reply(&tag, &raw)
    }

    pub(crate) fn absorb_capabilities(&mut self, reply: &Reply) {
        for untagged in &reply.untagged {
            if let UntaggedResponse::Capability(caps) = untagged {
                self.capabilities.clone_from(caps);
            }
        }
        if let Some(ResponseCode::Capability(caps)) = &reply.code {
            self.capabilities.clone_from(caps);
        }
    }

    /// Moves the connection into another state.
    pub(crate) fn into_state<T>(self, state: T) -> Client<S, T> {
        Client {
            stream: self.stream,
            tag_gen: self.tag_gen,
            capabilities: self.capabilities,
            state,
        }
    }

    /// Sends LOGOUT and drops the connection. Errors after sending are ignored.
    pub async fn logout(mut self) -> Result<()> {
        let tag = self.tag_gen.next();
        self.stream
            .write_command(&Command::Logout.serialize(&tag))
            .await?;
        let _ = ResponseAccumulator::new(tag.as_str())
            .read_until_tagged(&mut self.stream)
            .await;
        Ok(())
    }
}

/// Splits raw responses into untagged data and a checked completion.
pub(crate) fn collect_reply(tag: &str, raw: &[Vec<u8>]) -> Result<Reply> {
    let Some((last, data)) = raw.split_last() else {
        return Err(Error::Protocol("no response received".to_string()));
    };

    let mut untagged = Vec::with_capacity(data.len());
    for bytes in data {
        match ResponseParser::parse(bytes) {
            Ok(Response::Untagged(u)) => untagged.push(u),
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "dropping unparseable response"),
        }
    }

    match ResponseParser::parse(last)? {
        Response::Tagged {
            tag: got,
            status,
            code,
            text,
        } if got.as_str() == tag => match status {
            Status::Ok | Status::PreAuth => Ok(Reply { untagged, code }),
            Status::No => Err(match code {
                Some(ResponseCode::AlreadyExists) => Error::AlreadyExists(text),
                Some(ResponseCode::NonExistent) => Error::NonExistent(text),
                Some(ResponseCode::AuthenticationFailed) => Error::Auth(text),
                _ => Error::No(text),
            }),
            Status::Bad => Err(Error::Bad(text)),
            Status::Bye => Err(Error::Bye(text)),
        },
        other => Err(Error::Protocol(format!(
            "expected completion for {tag}, got {other:?}"
        ))),
    }
}
