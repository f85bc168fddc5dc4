//! Greeting and authentication.

use tokio::io::{AsyncRead, AsyncWrite};

use super::states::{Authenticated, NotAuthenticated};
use super::{Client, collect_reply};
use crate::auth::{Credentials, Secret, xoauth2_response};
use crate::command::{Command, TagGenerator};
use crate::connection::framed::{FramedStream, ResponseAccumulator};
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::ResponseCode;
use crate::{Error, Result};

impl<S> Client<S, NotAuthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Reads the server greeting from a fresh connection.
    ///
    /// A `BYE` greeting is an error. Capabilities carried in the greeting
    /// are kept.
    pub async fn from_stream(stream: S) -> Result<Self> {
        let mut framed = FramedStream::new(stream);
        let greeting = framed.read_response().await?;

        let mut capabilities = Vec::new();
        match ResponseParser::parse(&greeting)? {
            Response::Untagged(
                UntaggedResponse::Ok { code, .. } | UntaggedResponse::PreAuth { code, .. },
            ) => {
                if let Some(ResponseCode::Capability(caps)) = code {
                    capabilities = caps;
                }
            }
            Response::Untagged(UntaggedResponse::Bye { text, .. }) => return Err(Error::Bye(text)),
            other => {
                return Err(Error::Protocol(format!("unexpected greeting: {other:?}")));
            }
        }

        Ok(Self {
            stream: framed,
            tag_gen: TagGenerator::default(),
            capabilities,
            state: NotAuthenticated,
        })
    }

    /// Authenticates with whichever mechanism the secret calls for.
    pub async fn authenticate(self, credentials: &Credentials) -> Result<Client<S, Authenticated>> {
        match &credentials.secret {
            Secret::Password(password) => self.login(&credentials.username, password).await,
            Secret::OAuth2Token(token) => {
                self.authenticate_xoauth2(&credentials.username, token)
                    .await
            }
        }
    }

    /// LOGIN with a password. A NO completion becomes [`Error::Auth`].
    pub async fn login(mut self, username: &str, password: &str) -> Result<Client<S, Authenticated>> {
        let command = Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        };
        let reply = self.execute(&command).await.map_err(into_auth_error)?;
        self.absorb_capabilities(&reply);
        Ok(self.into_state(Authenticated))
    }

    /// `AUTHENTICATE XOAUTH2` with an access token.
    ///
    /// On failure the server sends a `+` challenge carrying a JSON error; an
    /// empty line answers it and the server then completes with NO.
    pub async fn authenticate_xoauth2(
        mut self,
        username: &str,
        token: &str,
    ) -> Result<Client<S, Authenticated>> {
        let tag = self.tag_gen.next();
        let command = Command::Authenticate {
            mechanism: "XOAUTH2".to_string(),
            initial_response: Some(xoauth2_response(username, token)),
        };
        tracing::debug!(%tag, command = %command.redacted(), "sending command");
        self.stream.write_command(&command.serialize(&tag)).await?;

        let accumulator = ResponseAccumulator::new(tag.as_str());
        let mut raw = Vec::new();
        loop {
            let response = self.stream.read_response().await?;
            if response.starts_with(b"+") {
                tracing::debug!("answering XOAUTH2 error challenge");
                self.stream.write_raw(b"\r\n").await?;
                continue;
            }
            let done = accumulator.is_completion(&response);
            raw.push(response);
            if done {
                break;
            }
        }

        let reply = collect_reply(&tag, &raw).map_err(into_auth_error)?;
        self.absorb_capabilities(&reply);
        Ok(self.into_state(Authenticated))
    }
}

fn into_auth_error(e: Error) -> Error {
    match e {
        Error::No(text) => Error::Auth(text),
        other => other,
    }
}
