//! Message flags.

/// A single message flag: a system flag or a keyword.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Flag {
    /// `\Seen`
    Seen,
    /// `\Answered`
    Answered,
    /// `\Flagged`
    Flagged,
    /// `\Deleted`
    Deleted,
    /// `\Draft`
    Draft,
    /// `\Recent`. Session-scoped, the server refuses it in APPEND and STORE.
    Recent,
    /// Keyword or unknown system flag, kept verbatim.
    Keyword(String),
}

impl Flag {
    /// Parses a flag atom, case-insensitively for system flags.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "\\SEEN" => Self::Seen,
            "\\ANSWERED" => Self::Answered,
            "\\FLAGGED" => Self::Flagged,
            "\\DELETED" => Self::Deleted,
            "\\DRAFT" => Self::Draft,
            "\\RECENT" => Self::Recent,
            _ => Self::Keyword(s.to_string()),
        }
    }

    /// Returns the wire form of the flag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Seen => "\\Seen",
            Self::Answered => "\\Answered",
            Self::Flagged => "\\Flagged",
            Self::Deleted => "\\Deleted",
            Self::Draft => "\\Draft",
            Self::Recent => "\\Recent",
            Self::Keyword(s) => s,
        }
    }

    /// Returns true if a client may set this flag with APPEND or STORE.
    ///
    /// `\Recent` is server-managed, and `\*` only appears inside
    /// PERMANENTFLAGS.
    #[must_use]
    pub fn is_settable(&self) -> bool {
        match self {
            Self::Recent => false,
            Self::Keyword(k) => !k.is_empty() && k != "\\*",
            _ => true,
        }
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unordered set of flags, insertion order preserved for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags {
    flags: Vec<Flag>,
}

impl Flags {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a flag if absent.
    pub fn insert(&mut self, flag: Flag) {
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
    }

    /// Removes a flag.
    pub fn remove(&mut self, flag: &Flag) {
        self.flags.retain(|f| f != flag);
    }

    /// Returns true if the flag is present.
    #[must_use]
    pub fn contains(&self, flag: &Flag) -> bool {
        self.flags.contains(flag)
    }

    /// Returns true if the message has been read.
    #[must_use]
    pub fn is_seen(&self) -> bool {
        self.contains(&Flag::Seen)
    }

    /// Returns only the flags a client is allowed to set.
    #[must_use]
    pub fn settable(&self) -> Self {
        self.flags.iter().filter(|f| f.is_settable()).cloned().collect()
    }

    /// Iterates over the flags.
    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.flags.iter()
    }

    /// Returns the number of flags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Returns true if there are no flags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl FromIterator<Flag> for Flags {
    fn from_iter<I: IntoIterator<Item = Flag>>(iter: I) -> Self {
        let mut flags = Self::new();
        for flag in iter {
            flags.insert(flag);
        }
        flags
    }
}

impl IntoIterator for Flags {
    type Item = Flag;
    type IntoIter = std::vec::IntoIter<Flag>;

    fn into_iter(self) -> Self::IntoIter {
        self.flags.into_iter()
    }
}

impl<'a> IntoIterator for &'a Flags {
    type Item = &'a Flag;
    type IntoIter = std::slice::Iter<'a, Flag>;

    fn into_iter(self) -> Self::IntoIter {
        self.flags.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_flags_parse_case_insensitively() {
        assert_eq!(Flag::parse("\\seen"), Flag::Seen);
        assert_eq!(Flag::parse("\\FLAGGED"), Flag::Flagged);
        assert_eq!(Flag::parse("\\Recent"), Flag::Recent);
    }

    #[test]
    fn keywords_keep_their_spelling() {
        let flag = Flag::parse("$Forwarded");
        assert_eq!(flag, Flag::Keyword("$Forwarded".to_string()));
        assert_eq!(flag.as_str(), "$Forwarded");
    }

    #[test]
    fn duplicates_collapse() {
        let flags: Flags = [Flag::Seen, Flag::Seen, Flag::Draft].into_iter().collect();
        assert_eq!(flags.len(), 2);
    }

    #[test]
    fn settable_drops_server_managed_flags() {
        let flags: Flags = [
            Flag::Seen,
            Flag::Recent,
            Flag::Keyword("\\*".to_string()),
            Flag::Keyword("Work".to_string()),
        ]
        .into_iter()
        .collect();

        let settable = flags.settable();
        assert_eq!(settable.len(), 2);
        assert!(settable.contains(&Flag::Seen));
        assert!(!settable.contains(&Flag::Recent));
    }
}
