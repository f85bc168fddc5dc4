//! Server capabilities and completion status.

/// Status keyword of a tagged or untagged condition response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Success.
    Ok,
    /// Operational failure.
    No,
    /// Protocol or syntax failure.
    Bad,
    /// Greeting for a pre-authenticated connection.
    PreAuth,
    /// Server is closing the connection.
    Bye,
}

impl Status {
    /// Returns true for OK and PREAUTH.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok | Self::PreAuth)
    }
}

/// A capability advertised by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `IMAP4rev1`
    Imap4Rev1,
    /// `IMAP4rev2`
    Imap4Rev2,
    /// `UIDPLUS`
    UidPlus,
    /// `LITERAL+`
    LiteralPlus,
    /// `SPECIAL-USE`
    SpecialUse,
    /// `LOGINDISABLED`
    LoginDisabled,
    /// Gmail extensions (`X-GM-EXT-1`).
    GmailExt,
    /// `AUTH=<mechanism>`
    Auth(String),
    /// Anything else, verbatim.
    Unknown(String),
}

impl Capability {
    /// Parses a capability atom.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let upper = s.to_ascii_uppercase();
        match upper.as_str() {
            "IMAP4REV1" => Self::Imap4Rev1,
            "IMAP4REV2" => Self::Imap4Rev2,
            "UIDPLUS" => Self::UidPlus,
            "LITERAL+" => Self::LiteralPlus,
            "SPECIAL-USE" => Self::SpecialUse,
            "LOGINDISABLED" => Self::LoginDisabled,
            "X-GM-EXT-1" => Self::GmailExt,
            _ => match upper.strip_prefix("AUTH=") {
                Some(mech) => Self::Auth(mech.to_string()),
                None => Self::Unknown(s.to_string()),
            },
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Imap4Rev1 => f.write_str("IMAP4rev1"),
            Self::Imap4Rev2 => f.write_str("IMAP4rev2"),
            Self::UidPlus => f.write_str("UIDPLUS"),
            Self::LiteralPlus => f.write_str("LITERAL+"),
            Self::SpecialUse => f.write_str("SPECIAL-USE"),
            Self::LoginDisabled => f.write_str("LOGINDISABLED"),
            Self::GmailExt => f.write_str("X-GM-EXT-1"),
            Self::Auth(mech) => write!(f, "AUTH={mech}"),
            Self::Unknown(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_mechanisms_are_normalised() {
        assert_eq!(
            Capability::parse("auth=xoauth2"),
            Capability::Auth("XOAUTH2".to_string())
        );
    }

    #[test]
    fn gmail_greeting_capabilities() {
        let caps: Vec<Capability> = "IMAP4rev1 UNSELECT IDLE NAMESPACE QUOTA ID XLIST CHILDREN X-GM-EXT-1 UIDPLUS COMPRESS=DEFLATE ENABLE MOVE CONDSTORE ESEARCH UTF8=ACCEPT LIST-EXTENDED LIST-STATUS LITERAL- SPECIAL-USE APPENDLIMIT=35651584"
            .split(' ')
            .map(Capability::parse)
            .collect();
        assert!(caps.contains(&Capability::GmailExt));
        assert!(caps.contains(&Capability::UidPlus));
        assert!(caps.contains(&Capability::Unknown("APPENDLIMIT=35651584".to_string())));
    }

    #[test]
    fn preauth_counts_as_ok() {
        assert!(Status::PreAuth.is_ok());
        assert!(!Status::No.is_ok());
    }
}
