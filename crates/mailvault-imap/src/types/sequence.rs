//! Sequence and UID sets.

use super::{SeqNum, Uid};

/// Sequence set as written in FETCH, STORE and SEARCH.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceSet {
    /// `n`
    Single(SeqNum),
    /// `a:b`
    Range(SeqNum, SeqNum),
    /// `a:*`
    RangeFrom(SeqNum),
    /// `*`
    All,
    /// Comma-separated union.
    Set(Vec<Self>),
}

impl SequenceSet {
    /// `n`, or `None` for 0.
    #[must_use]
    pub fn single(n: u32) -> Option<Self> {
        SeqNum::new(n).map(Self::Single)
    }

    /// `a:b`, or `None` if either bound is 0.
    #[must_use]
    pub fn range(start: u32, end: u32) -> Option<Self> {
        Some(Self::Range(SeqNum::new(start)?, SeqNum::new(end)?))
    }
}

impl std::fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(n) => write!(f, "{n}"),
            Self::Range(start, end) => write!(f, "{start}:{end}"),
            Self::RangeFrom(start) => write!(f, "{start}:*"),
            Self::All => f.write_str("*"),
            Self::Set(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join(","))
            }
        }
    }
}

/// Set of UIDs for the `UID` command variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UidSet {
    /// `uid`
    Single(Uid),
    /// `a:b`
    Range(Uid, Uid),
    /// `a:*`
    RangeFrom(Uid),
    /// Comma-separated union.
    Set(Vec<Self>),
}

impl UidSet {
    /// A single UID.
    #[must_use]
    pub const fn single(uid: Uid) -> Self {
        Self::Single(uid)
    }

    /// Every UID from 1 upwards.
    #[must_use]
    pub const fn everything() -> Self {
        Self::RangeFrom(Uid(std::num::NonZeroU32::MIN))
    }

    /// Compresses UIDs into the shortest run-length form, `None` if empty.
    ///
    /// `[1, 2, 3, 7, 9, 10]` becomes `1:3,7,9:10`.
    #[must_use]
    pub fn from_uids(uids: &[Uid]) -> Option<Self> {
        let mut sorted = uids.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut runs: Vec<Self> = Vec::new();
        let mut iter = sorted.into_iter();
        let first = iter.next()?;
        let (mut start, mut end) = (first, first);
        for uid in iter {
            if end.get().checked_add(1) == Some(uid.get()) {
                end = uid;
            } else {
                runs.push(Self::run(start, end));
                start = uid;
                end = uid;
            }
        }
        runs.push(Self::run(start, end));

        Some(if runs.len() == 1 {
            runs.remove(0)
        } else {
            Self::Set(runs)
        })
    }

    /// Converts to a [`SequenceSet`] for the `UID` command forms, which
    /// share the sequence-set grammar.
    #[must_use]
    pub fn as_sequence_set(&self) -> SequenceSet {
        match self {
            Self::Single(uid) => SequenceSet::Single(SeqNum(uid.0)),
            Self::Range(start, end) => SequenceSet::Range(SeqNum(start.0), SeqNum(end.0)),
            Self::RangeFrom(start) => SequenceSet::RangeFrom(SeqNum(start.0)),
            Self::Set(items) => SequenceSet::Set(items.iter().map(Self::as_sequence_set).collect()),
        }
    }

    fn run(start: Uid, end: Uid) -> Self {
        if start == end {
            Self::Single(start)
        } else {
            Self::Range(start, end)
        }
    }
}

impl std::fmt::Display for UidSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(n) => write!(f, "{n}"),
            Self::Range(start, end) => write!(f, "{start}:{end}"),
            Self::RangeFrom(start) => write!(f, "{start}:*"),
            Self::Set(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join(","))
            }
        }
    }
}
