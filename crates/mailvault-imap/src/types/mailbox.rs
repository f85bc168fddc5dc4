//! Mailbox names, LIST data and SELECT/EXAMINE status.

use super::{Flags, Uid, UidValidity};

/// Mailbox name exactly as it travels on the wire (modified UTF-7).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Mailbox(pub String);

impl Mailbox {
    /// Wraps a wire-encoded name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The INBOX mailbox.
    #[must_use]
    pub fn inbox() -> Self {
        Self("INBOX".to_string())
    }

    /// Returns true for INBOX, which is case-insensitive.
    #[must_use]
    pub fn is_inbox(&self) -> bool {
        self.0.eq_ignore_ascii_case("INBOX")
    }

    /// Returns the wire name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status gathered from the untagged data of SELECT or EXAMINE.
#[derive(Debug, Clone, Default)]
pub struct MailboxStatus {
    /// Number of messages.
    pub exists: u32,
    /// Number of recent messages.
    pub recent: u32,
    /// Next UID the server will assign.
    pub uid_next: Option<Uid>,
    /// UIDVALIDITY of the mailbox.
    pub uid_validity: Option<UidValidity>,
    /// Flags defined in the mailbox.
    pub flags: Flags,
    /// True when opened with EXAMINE or the server answered READ-ONLY.
    pub read_only: bool,
}

/// One untagged LIST reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListResponse {
    /// Name attributes.
    pub attributes: Vec<MailboxAttribute>,
    /// Hierarchy delimiter, `None` for a flat namespace.
    pub delimiter: Option<char>,
    /// Wire name.
    pub mailbox: Mailbox,
}

impl ListResponse {
    /// Returns false for `\Noselect` and `\NonExistent` entries.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        !self
            .attributes
            .iter()
            .any(|a| matches!(a, MailboxAttribute::NoSelect | MailboxAttribute::NonExistent))
    }

    /// Returns the SPECIAL-USE attribute, if any.
    #[must_use]
    pub fn special_use(&self) -> Option<&MailboxAttribute> {
        self.attributes.iter().find(|a| a.is_special_use())
    }
}

/// Mailbox name attribute from LIST.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MailboxAttribute {
    /// `\Noselect`
    NoSelect,
    /// `\NonExistent`
    NonExistent,
    /// `\HasChildren`
    HasChildren,
    /// `\HasNoChildren`
    HasNoChildren,
    /// `\Marked`
    Marked,
    /// `\Unmarked`
    Unmarked,
    /// `\All` (RFC 6154)
    All,
    /// `\Archive`
    Archive,
    /// `\Drafts`
    Drafts,
    /// `\Flagged`
    Flagged,
    /// `\Junk` or Gmail's `\Spam`
    Junk,
    /// `\Sent`
    Sent,
    /// `\Trash`
    Trash,
    /// `\Important` (RFC 8457)
    Important,
    /// Anything else, verbatim.
    Unknown(String),
}

impl MailboxAttribute {
    /// Parses an attribute atom.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "\\NOSELECT" => Self::NoSelect,
            "\\NONEXISTENT" => Self::NonExistent,
            "\\HASCHILDREN" => Self::HasChildren,
            "\\HASNOCHILDREN" => Self::HasNoChildren,
            "\\MARKED" => Self::Marked,
            "\\UNMARKED" => Self::Unmarked,
            "\\ALL" => Self::All,
            "\\ARCHIVE" => Self::Archive,
            "\\DRAFTS" => Self::Drafts,
            "\\FLAGGED" => Self::Flagged,
            "\\JUNK" | "\\SPAM" => Self::Junk,
            "\\SENT" => Self::Sent,
            "\\TRASH" => Self::Trash,
            "\\IMPORTANT" => Self::Important,
            _ => Self::Unknown(s.to_string()),
        }
    }

    /// Returns true for the RFC 6154 / RFC 8457 special-use attributes.
    #[must_use]
    pub const fn is_special_use(&self) -> bool {
        matches!(
            self,
            Self::All
                | Self::Archive
                | Self::Drafts
                | Self::Flagged
                | Self::Junk
                | Self::Sent
                | Self::Trash
                | Self::Important
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(attrs: &[&str], name: &str) -> ListResponse {
        ListResponse {
            attributes: attrs.iter().map(|a| MailboxAttribute::parse(a)).collect(),
            delimiter: Some('/'),
            mailbox: Mailbox::new(name),
        }
    }

    #[test]
    fn noselect_parent_is_not_selectable() {
        assert!(!entry(&["\\Noselect", "\\HasChildren"], "[Gmail]").is_selectable());
        assert!(entry(&["\\HasNoChildren"], "Work").is_selectable());
    }

    #[test]
    fn gmail_spam_maps_to_junk() {
        let e = entry(&["\\HasNoChildren", "\\Spam"], "[Gmail]/Spam");
        assert_eq!(e.special_use(), Some(&MailboxAttribute::Junk));
    }

    #[test]
    fn inbox_check_ignores_case() {
        assert!(Mailbox::new("Inbox").is_inbox());
        assert!(!Mailbox::new("INBOX/Sub").is_inbox());
    }
}
