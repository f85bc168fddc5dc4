//! Wire encoding of command arguments.

use crate::date::format_date;
use crate::types::{Flag, Mailbox};

use super::types::{FetchAttribute, FetchItems, SearchCriteria, StoreAction};

/// Writes an astring: bare atom when possible, quoted string otherwise.
pub fn write_astring(buf: &mut Vec<u8>, s: &str) {
    if s.is_empty() || s.bytes().any(needs_quoting) {
        buf.push(b'"');
        for b in s.bytes() {
            if b == b'"' || b == b'\\' {
                buf.push(b'\\');
            }
            buf.push(b);
        }
        buf.push(b'"');
    } else {
        buf.extend_from_slice(s.as_bytes());
    }
}

/// Writes a mailbox name. Names are already modified UTF-7, hence ASCII.
pub fn write_mailbox(buf: &mut Vec<u8>, mailbox: &Mailbox) {
    write_astring(buf, mailbox.as_str());
}

/// Bytes that cannot appear in an atom.
const fn needs_quoting(b: u8) -> bool {
    matches!(
        b,
        b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*' | b']'
    ) || b < 0x20
        || b >= 0x7F
}

/// Writes `(flag flag ...)`.
pub fn write_flag_list<'a>(buf: &mut Vec<u8>, flags: impl IntoIterator<Item = &'a Flag>) {
    buf.push(b'(');
    for (i, flag) in flags.into_iter().enumerate() {
        if i > 0 {
            buf.push(b' ');
        }
        buf.extend_from_slice(flag.as_str().as_bytes());
    }
    buf.push(b')');
}

/// Writes a FETCH item list.
pub fn write_fetch_items(buf: &mut Vec<u8>, items: &FetchItems) {
    buf.push(b'(');
    for (i, attr) in items.0.iter().enumerate() {
        if i > 0 {
            buf.push(b' ');
        }
        write_fetch_attribute(buf, attr);
    }
    buf.push(b')');
}

fn write_fetch_attribute(buf: &mut Vec<u8>, attr: &FetchAttribute) {
    match attr {
        FetchAttribute::Flags => buf.extend_from_slice(b"FLAGS"),
        FetchAttribute::InternalDate => buf.extend_from_slice(b"INTERNALDATE"),
        FetchAttribute::Rfc822Size => buf.extend_from_slice(b"RFC822.SIZE"),
        FetchAttribute::Uid => buf.extend_from_slice(b"UID"),
        FetchAttribute::Body { section, peek } => {
            let open: &[u8] = if *peek { b"BODY.PEEK[" } else { b"BODY[" };
            buf.extend_from_slice(open);
            if let Some(s) = section {
                buf.extend_from_slice(s.as_bytes());
            }
            buf.push(b']');
        }
    }
}

/// Writes the STORE data item and flag list.
pub fn write_store_action(buf: &mut Vec<u8>, action: &StoreAction, silent: bool) {
    let (item, flags) = match action {
        StoreAction::Set(f) => (&b"FLAGS"[..], f),
        StoreAction::Add(f) => (&b"+FLAGS"[..], f),
        StoreAction::Remove(f) => (&b"-FLAGS"[..], f),
    };
    buf.extend_from_slice(item);
    if silent {
        buf.extend_from_slice(b".SILENT");
    }
    buf.push(b' ');
    write_flag_list(buf, flags);
}

/// Writes SEARCH keys.
pub fn write_search_criteria(buf: &mut Vec<u8>, criteria: &SearchCriteria) {
    match criteria {
        SearchCriteria::All => buf.extend_from_slice(b"ALL"),
        SearchCriteria::Deleted => buf.extend_from_slice(b"DELETED"),
        SearchCriteria::Undeleted => buf.extend_from_slice(b"UNDELETED"),
        SearchCriteria::Since(day) => {
            buf.extend_from_slice(b"SINCE ");
            buf.extend_from_slice(format_date(*day).as_bytes());
        }
        SearchCriteria::Before(day) => {
            buf.extend_from_slice(b"BEFORE ");
            buf.extend_from_slice(format_date(*day).as_bytes());
        }
        SearchCriteria::On(day) => {
            buf.extend_from_slice(b"ON ");
            buf.extend_from_slice(format_date(*day).as_bytes());
        }
        SearchCriteria::Uid(set) => {
            buf.extend_from_slice(b"UID ");
            buf.extend_from_slice(set.to_string().as_bytes());
        }
        SearchCriteria::And(keys) => {
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    buf.push(b' ');
                }
                write_search_criteria(buf, key);
            }
        }
        SearchCriteria::Not(key) => {
            buf.extend_from_slice(b"NOT ");
            write_search_criteria(buf, key);
        }
    }
}
