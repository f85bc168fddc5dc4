//! Arguments of the commands the client issues.

use chrono::NaiveDate;

use crate::types::{Flag, UidSet};

/// STATUS data items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAttribute {
    /// `MESSAGES`
    Messages,
    /// `UIDNEXT`
    UidNext,
    /// `UIDVALIDITY`
    UidValidity,
    /// `UNSEEN`
    Unseen,
}

impl StatusAttribute {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Messages => "MESSAGES",
            Self::UidNext => "UIDNEXT",
            Self::UidValidity => "UIDVALIDITY",
            Self::Unseen => "UNSEEN",
        }
    }
}

/// FETCH data items, written as a parenthesized list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchItems(pub Vec<FetchAttribute>);

impl FetchItems {
    /// Everything needed to archive a message without touching `\Seen`:
    /// `UID FLAGS INTERNALDATE RFC822.SIZE BODY.PEEK[]`.
    #[must_use]
    pub fn full_message() -> Self {
        Self(vec![
            FetchAttribute::Uid,
            FetchAttribute::Flags,
            FetchAttribute::InternalDate,
            FetchAttribute::Rfc822Size,
            FetchAttribute::Body {
                section: None,
                peek: true,
            },
        ])
    }

    /// Metadata used to recognise messages already on the server:
    /// `UID FLAGS INTERNALDATE RFC822.SIZE`.
    #[must_use]
    pub fn identity() -> Self {
        Self(vec![
            FetchAttribute::Uid,
            FetchAttribute::Flags,
            FetchAttribute::InternalDate,
            FetchAttribute::Rfc822Size,
        ])
    }
}

/// A single FETCH data item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchAttribute {
    /// `FLAGS`
    Flags,
    /// `INTERNALDATE`
    InternalDate,
    /// `RFC822.SIZE`
    Rfc822Size,
    /// `UID`
    Uid,
    /// `BODY[section]` or `BODY.PEEK[section]`.
    Body {
        /// Section specifier, `None` for the whole message.
        section: Option<String>,
        /// Leave `\Seen` untouched.
        peek: bool,
    },
}

/// Flag change requested by STORE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAction {
    /// `FLAGS (...)`
    Set(Vec<Flag>),
    /// `+FLAGS (...)`
    Add(Vec<Flag>),
    /// `-FLAGS (...)`
    Remove(Vec<Flag>),
}

/// SEARCH keys. Juxtaposed keys are ANDed by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// `ALL`
    All,
    /// `DELETED`
    Deleted,
    /// `UNDELETED`
    Undeleted,
    /// `SINCE d`: internal date on or after `d`.
    Since(NaiveDate),
    /// `BEFORE d`: internal date strictly before `d`.
    Before(NaiveDate),
    /// `ON d`
    On(NaiveDate),
    /// `UID set`
    Uid(UidSet),
    /// Conjunction.
    And(Vec<Self>),
    /// `NOT key`
    Not(Box<Self>),
}

impl SearchCriteria {
    /// Builds `ALL [SINCE s] [BEFORE b]` from an optional day range.
    #[must_use]
    pub fn date_range(since: Option<NaiveDate>, before: Option<NaiveDate>) -> Self {
        let mut keys = vec![Self::All];
        keys.extend(since.map(Self::Since));
        keys.extend(before.map(Self::Before));
        if keys.len() == 1 {
            Self::All
        } else {
            Self::And(keys)
        }
    }
}
