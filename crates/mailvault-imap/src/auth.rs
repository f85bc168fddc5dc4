//! Account credentials and SASL initial responses.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// The secret half of a credential pair.
#[derive(Clone, PartialEq, Eq)]
pub enum Secret {
    /// Plain password, sent with `LOGIN`.
    Password(String),
    /// `OAuth2` access token, sent with `AUTHENTICATE XOAUTH2`.
    OAuth2Token(String),
}

/// Username plus secret for one account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login name, usually the email address.
    pub username: String,
    /// Password or token.
    pub secret: Secret,
}

impl Credentials {
    /// Credentials authenticated with `LOGIN`.
    #[must_use]
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: Secret::Password(password.into()),
        }
    }

    /// Credentials authenticated with `AUTHENTICATE XOAUTH2`.
    #[must_use]
    pub fn oauth2(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: Secret::OAuth2Token(token.into()),
        }
    }
}

// Secrets never reach logs through Debug.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.secret {
            Secret::Password(_) => "password",
            Secret::OAuth2Token(_) => "oauth2",
        };
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &kind)
            .finish()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(****)")
    }
}

/// Builds the base64 XOAUTH2 initial response.
///
/// Format before encoding: `user=<user>\x01auth=Bearer <token>\x01\x01`.
#[must_use]
pub fn xoauth2_response(user: &str, token: &str) -> String {
    STANDARD.encode(format!("user={user}\x01auth=Bearer {token}\x01\x01"))
}
