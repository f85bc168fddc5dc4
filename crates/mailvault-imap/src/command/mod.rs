//! IMAP command builder.
//!
//! A [`Command`] serializes to the exact bytes sent for one tagged command.
//! APPEND is the only command with a literal; its serialization stops at the
//! `{n}` announcement and the client sends the message body after the
//! server's continuation.

mod serialize;
mod tag_generator;
mod types;

use chrono::{DateTime, FixedOffset};

use crate::date::format_date_time;
use crate::types::{Flag, Mailbox, SequenceSet};

pub use tag_generator::TagGenerator;
pub use types::{FetchAttribute, FetchItems, SearchCriteria, StatusAttribute, StoreAction};

use serialize::{
    write_astring, write_fetch_items, write_flag_list, write_mailbox, write_search_criteria,
    write_store_action,
};

/// IMAP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// CAPABILITY
    Capability,
    /// NOOP
    Noop,
    /// LOGOUT
    Logout,
    /// LOGIN user password
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// AUTHENTICATE mechanism [initial-response]
    Authenticate {
        /// SASL mechanism name.
        mechanism: String,
        /// Base64 initial response (SASL-IR).
        initial_response: Option<String>,
    },
    /// SELECT mailbox
    Select {
        /// Mailbox to open read-write.
        mailbox: Mailbox,
    },
    /// EXAMINE mailbox
    Examine {
        /// Mailbox to open read-only.
        mailbox: Mailbox,
    },
    /// CREATE mailbox
    Create {
        /// Mailbox to create.
        mailbox: Mailbox,
    },
    /// DELETE mailbox
    Delete {
        /// Mailbox to delete.
        mailbox: Mailbox,
    },
    /// LIST reference pattern
    List {
        /// Reference name.
        reference: String,
        /// Mailbox pattern.
        pattern: String,
    },
    /// STATUS mailbox (items)
    Status {
        /// Mailbox to query.
        mailbox: Mailbox,
        /// Requested items.
        items: Vec<StatusAttribute>,
    },
    /// APPEND mailbox [(flags)] [date-time] {size}
    Append {
        /// Target mailbox.
        mailbox: Mailbox,
        /// Flags to set on the new message.
        flags: Vec<Flag>,
        /// Internal date to assign.
        internal_date: Option<DateTime<FixedOffset>>,
        /// Length of the message literal in bytes.
        size: usize,
    },
    /// CLOSE
    Close,
    /// EXPUNGE
    Expunge,
    /// [UID] SEARCH criteria
    Search {
        /// Search keys.
        criteria: SearchCriteria,
        /// Return UIDs instead of sequence numbers.
        uid: bool,
    },
    /// [UID] FETCH set items
    Fetch {
        /// Messages to fetch.
        sequence: SequenceSet,
        /// Data items.
        items: FetchItems,
        /// Interpret `sequence` as UIDs.
        uid: bool,
    },
    /// [UID] STORE set action
    Store {
        /// Messages to modify.
        sequence: SequenceSet,
        /// Flag change.
        action: StoreAction,
        /// Interpret `sequence` as UIDs.
        uid: bool,
        /// Suppress the untagged FETCH replies.
        silent: bool,
    },
}

impl Command {
    /// Serializes the command with the given tag, CRLF included.
    #[must_use]
    pub fn serialize(&self, tag: &str) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(tag.as_bytes());
        buf.push(b' ');

        match self {
            Self::Capability => buf.extend_from_slice(b"CAPABILITY"),
            Self::Noop => buf.extend_from_slice(b"NOOP"),
            Self::Logout => buf.extend_from_slice(b"LOGOUT"),

            Self::Login { username, password } => {
                buf.extend_from_slice(b"LOGIN ");
                write_astring(&mut buf, username);
                buf.push(b' ');
                write_astring(&mut buf, password);
            }

            Self::Authenticate {
                mechanism,
                initial_response,
            } => {
                buf.extend_from_slice(b"AUTHENTICATE ");
                buf.extend_from_slice(mechanism.as_bytes());
                if let Some(resp) = initial_response {
                    buf.push(b' ');
                    buf.extend_from_slice(resp.as_bytes());
                }
            }

            Self::Select { mailbox } => {
                buf.extend_from_slice(b"SELECT ");
                write_mailbox(&mut buf, mailbox);
            }

            Self::Examine { mailbox } => {
                buf.extend_from_slice(b"EXAMINE ");
                write_mailbox(&mut buf, mailbox);
            }

            Self::Create { mailbox } => {
                buf.extend_from_slice(b"CREATE ");
                write_mailbox(&mut buf, mailbox);
            }

            Self::Delete { mailbox } => {
                buf.extend_from_slice(b"DELETE ");
                write_mailbox(&mut buf, mailbox);
            }

            Self::List { reference, pattern } => {
                buf.extend_from_slice(b"LIST ");
                write_astring(&mut buf, reference);
                buf.push(b' ');
                write_astring(&mut buf, pattern);
            }

            Self::Status { mailbox, items } => {
                buf.extend_from_slice(b"STATUS ");
                write_mailbox(&mut buf, mailbox);
                buf.extend_from_slice(b" (");
                let names: Vec<&str> = items.iter().map(|i| i.as_str()).collect();
                buf.extend_from_slice(names.join(" ").as_bytes());
                buf.push(b')');
            }

            Self::Append {
                mailbox,
                flags,
                internal_date,
                size,
            } => {
                buf.extend_from_slice(b"APPEND ");
                write_mailbox(&mut buf, mailbox);
                if !flags.is_empty() {
                    buf.push(b' ');
                    write_flag_list(&mut buf, flags);
                }
                if let Some(at) = internal_date {
                    buf.extend_from_slice(b" \"");
                    buf.extend_from_slice(format_date_time(at).as_bytes());
                    buf.push(b'"');
                }
                buf.extend_from_slice(format!(" {{{size}}}").as_bytes());
            }

            Self::Close => buf.extend_from_slice(b"CLOSE"),
            Self::Expunge => buf.extend_from_slice(b"EXPUNGE"),

            Self::Search { criteria, uid } => {
                if *uid {
                    buf.extend_from_slice(b"UID ");
                }
                buf.extend_from_slice(b"SEARCH ");
                write_search_criteria(&mut buf, criteria);
            }

            Self::Fetch {
                sequence,
                items,
                uid,
            } => {
                if *uid {
                    buf.extend_from_slice(b"UID ");
                }
                buf.extend_from_slice(b"FETCH ");
                buf.extend_from_slice(sequence.to_string().as_bytes());
                buf.push(b' ');
                write_fetch_items(&mut buf, items);
            }

            Self::Store {
                sequence,
                action,
                uid,
                silent,
            } => {
                if *uid {
                    buf.extend_from_slice(b"UID ");
                }
                buf.extend_from_slice(b"STORE ");
                buf.extend_from_slice(sequence.to_string().as_bytes());
                buf.push(b' ');
                write_store_action(&mut buf, action, *silent);
            }
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Returns a copy safe to log: credentials are masked.
    #[must_use]
    pub fn redacted(&self) -> String {
        match self {
            Self::Login { username, .. } => format!("LOGIN {username} ****"),
            Self::Authenticate { mechanism, .. } => format!("AUTHENTICATE {mechanism} ****"),
            other => {
                let bytes = other.serialize("*");
                String::from_utf8_lossy(&bytes[2..bytes.len() - 2]).into_owned()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::date::parse_date_time;
    use crate::types::{Uid, UidSet};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn login_quotes_when_needed() {
        let cmd = Command::Login {
            username: "u@gmail.com".to_string(),
            password: "p a\"ss".to_string(),
        };
        assert_eq!(
            cmd.serialize("A0001"),
            b"A0001 LOGIN u@gmail.com \"p a\\\"ss\"\r\n"
        );
    }

    #[test]
    fn examine_quotes_gmail_brackets() {
        let cmd = Command::Examine {
            mailbox: Mailbox::new("[Gmail]/Sent Mail"),
        };
        assert_eq!(
            cmd.serialize("A0002"),
            b"A0002 EXAMINE \"[Gmail]/Sent Mail\"\r\n"
        );
    }

    #[test]
    fn uid_search_with_date_range() {
        let cmd = Command::Search {
            criteria: SearchCriteria::date_range(Some(day(2024, 1, 1)), Some(day(2024, 2, 1))),
            uid: true,
        };
        assert_eq!(
            cmd.serialize("A0003"),
            b"A0003 UID SEARCH ALL SINCE 01-Jan-2024 BEFORE 01-Feb-2024\r\n"
        );
    }

    #[test]
    fn open_range_is_plain_all() {
        assert_eq!(SearchCriteria::date_range(None, None), SearchCriteria::All);
    }

    #[test]
    fn uid_fetch_whole_message_uses_peek() {
        let cmd = Command::Fetch {
            sequence: UidSet::single(Uid::new(77).unwrap()).as_sequence_set(),
            items: FetchItems::full_message(),
            uid: true,
        };
        assert_eq!(
            cmd.serialize("A0004"),
            b"A0004 UID FETCH 77 (UID FLAGS INTERNALDATE RFC822.SIZE BODY.PEEK[])\r\n"
        );
    }

    #[test]
    fn silent_delete_store() {
        let cmd = Command::Store {
            sequence: SequenceSet::range(1, 9).unwrap(),
            action: StoreAction::Add(vec![Flag::Deleted]),
            uid: true,
            silent: true,
        };
        assert_eq!(
            cmd.serialize("A0005"),
            b"A0005 UID STORE 1:9 +FLAGS.SILENT (\\Deleted)\r\n"
        );
    }

    #[test]
    fn append_announces_literal_with_flags_and_date() {
        let cmd = Command::Append {
            mailbox: Mailbox::new("Archive/2024"),
            flags: vec![Flag::Seen, Flag::Keyword("$Label1".to_string())],
            internal_date: Some(parse_date_time("05-Mar-2024 10:00:00 +0000").unwrap()),
            size: 310,
        };
        assert_eq!(
            cmd.serialize("A0006"),
            b"A0006 APPEND Archive/2024 (\\Seen $Label1) \"05-Mar-2024 10:00:00 +0000\" {310}\r\n"
        );
    }

    #[test]
    fn status_lists_items() {
        let cmd = Command::Status {
            mailbox: Mailbox::inbox(),
            items: vec![StatusAttribute::Messages, StatusAttribute::UidValidity],
        };
        assert_eq!(
            cmd.serialize("A0007"),
            b"A0007 STATUS INBOX (MESSAGES UIDVALIDITY)\r\n"
        );
    }

    #[test]
    fn redaction_hides_secrets() {
        let login = Command::Login {
            username: "u".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!login.redacted().contains("hunter2"));
        assert_eq!(Command::Noop.redacted(), "NOOP");
    }
}
