//! Folder names: wire form, display form and local path form.
//!
//! IMAP carries folder names in modified UTF-7: printable ASCII stands for
//! itself except `&`, which is written `&-`; any other run of characters is
//! written `&<base64 of UTF-16BE>-` using `,` in place of `/` and no
//! padding. The archive stores wire names; people see decoded names; the
//! content directory uses [`to_path_segment`].

use std::fmt::Write;

use base64::Engine;
use base64::alphabet::IMAP_MUTF7;
use base64::engine::general_purpose::{GeneralPurpose, NO_PAD};
use sha2::{Digest, Sha256};

const MUTF7: GeneralPurpose = GeneralPurpose::new(&IMAP_MUTF7, NO_PAD);

/// Longest path segment produced, in bytes.
const MAX_SEGMENT_LEN: usize = 120;

/// Windows device names that cannot be used as file names.
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Encodes a Unicode folder name into its wire form.
#[must_use]
pub fn encode(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending: Vec<u16> = Vec::new();

    for ch in name.chars() {
        if (' '..='~').contains(&ch) {
            flush_shifted(&mut out, &mut pending);
            if ch == '&' {
                out.push_str("&-");
            } else {
                out.push(ch);
            }
        } else {
            let mut units = [0u16; 2];
            pending.extend_from_slice(ch.encode_utf16(&mut units));
        }
    }
    flush_shifted(&mut out, &mut pending);
    out
}

fn flush_shifted(out: &mut String, pending: &mut Vec<u16>) {
    if pending.is_empty() {
        return;
    }
    let bytes: Vec<u8> = pending.iter().flat_map(|u| u.to_be_bytes()).collect();
    out.push('&');
    out.push_str(&MUTF7.encode(bytes));
    out.push('-');
    pending.clear();
}

/// Decodes a wire folder name.
///
/// Never fails: a malformed shift sequence is kept verbatim, so a name the
/// server produced always survives a decode and display.
#[must_use]
pub fn decode(wire: &str) -> String {
    let mut out = String::with_capacity(wire.len());
    let mut rest = wire;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let shifted = &rest[start + 1..];
        let Some(end) = shifted.find('-') else {
            out.push_str(&rest[start..]);
            return out;
        };

        let chunk = &shifted[..end];
        if chunk.is_empty() {
            out.push('&');
        } else if let Some(text) = decode_shifted(chunk) {
            out.push_str(&text);
        } else {
            out.push_str(&rest[start..start + end + 2]);
        }
        rest = &shifted[end + 1..];
    }

    out.push_str(rest);
    out
}

fn decode_shifted(chunk: &str) -> Option<String> {
    let bytes = MUTF7.decode(chunk).ok()?;
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).ok()
}

/// Maps a Unicode folder name to one directory name that is safe on
/// Linux, macOS and Windows.
///
/// Everything outside `[A-Za-z0-9 ._-]` is percent-escaped per UTF-8 byte.
/// A leading dot, a trailing dot or space, and Windows device names are
/// escaped too. Names with uppercase ASCII get a `~xxxxxxxx` suffix taken
/// from the SHA-256 of the name so that `Work` and `work` stay apart on
/// case-insensitive filesystems; over-long segments are cut and carry the
/// same suffix.
#[must_use]
pub fn to_path_segment(name: &str) -> String {
    let mut segment = String::with_capacity(name.len());
    let last = name.chars().count().saturating_sub(1);

    for (i, ch) in name.chars().enumerate() {
        let edge_escape = (i == 0 && ch == '.') || (i == last && matches!(ch, '.' | ' '));
        if !edge_escape && (ch.is_ascii_alphanumeric() || matches!(ch, ' ' | '.' | '_' | '-')) {
            segment.push(ch);
        } else {
            let mut utf8 = [0u8; 4];
            for b in ch.encode_utf8(&mut utf8).bytes() {
                let _ = write!(segment, "%{b:02X}");
            }
        }
    }

    let stem = segment.split('.').next().unwrap_or_default();
    if RESERVED_NAMES.iter().any(|r| r.eq_ignore_ascii_case(stem)) {
        let first = segment.remove(0);
        segment.insert_str(0, &format!("%{:02X}", u32::from(first)));
    }

    let needs_suffix = segment.is_empty()
        || name.bytes().any(|b| b.is_ascii_uppercase())
        || segment.len() > MAX_SEGMENT_LEN;
    if needs_suffix {
        let suffix = format!("~{}", short_hash(name));
        let keep = MAX_SEGMENT_LEN - suffix.len();
        if segment.len() > keep {
            segment.truncate(keep);
            // Do not leave half an escape behind.
            if let Some(pos) = segment[segment.len().saturating_sub(2)..].find('%') {
                segment.truncate(segment.len().saturating_sub(2) + pos);
            }
        }
        segment.push_str(&suffix);
    }
    segment
}

fn short_hash(name: &str) -> String {
    let digest = Sha256::digest(name.as_bytes());
    digest[..4].iter().fold(String::with_capacity(8), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ascii_passes_through() {
        assert_eq!(encode("INBOX"), "INBOX");
        assert_eq!(encode("[Gmail]/Sent Mail"), "[Gmail]/Sent Mail");
        assert_eq!(decode("[Gmail]/Sent Mail"), "[Gmail]/Sent Mail");
    }

    #[test]
    fn ampersand_is_escaped() {
        assert_eq!(encode("Q&A"), "Q&-A");
        assert_eq!(decode("Q&-A"), "Q&A");
    }

    #[test]
    fn known_wire_names() {
        assert_eq!(encode("Entwürfe"), "Entw&APw-rfe");
        assert_eq!(decode("Entw&APw-rfe"), "Entwürfe");
        assert_eq!(encode("台北"), "&U,BTFw-");
        assert_eq!(decode("&U,BTFw-"), "台北");
        assert_eq!(decode("~peter/mail/&U,BTFw-/&ZeVnLIqe-"), "~peter/mail/台北/日本語");
    }

    #[test]
    fn astral_characters_use_surrogate_pairs() {
        let name = "Fun 🎉";
        let wire = encode(name);
        assert!(wire.starts_with("Fun &"));
        assert_eq!(decode(&wire), name);
    }

    #[test]
    fn malformed_shift_is_kept() {
        assert_eq!(decode("Broken&"), "Broken&");
        assert_eq!(decode("Odd&AB-x"), "Odd&AB-x");
        assert_eq!(decode("Bad&!!!-"), "Bad&!!!-");
    }

    #[test]
    fn path_segment_escapes_separators() {
        assert_eq!(to_path_segment("work/2024"), "work%2F2024");
        assert_eq!(to_path_segment("100%"), "100%25");
        assert_eq!(to_path_segment(".hidden"), "%2Ehidden");
        assert_eq!(to_path_segment("trailing."), "trailing%2E");
        assert_eq!(to_path_segment("entwürfe"), "entw%C3%BCrfe");
    }

    #[test]
    fn path_segment_escapes_device_names() {
        assert_eq!(to_path_segment("con"), "%63on");
        assert_eq!(to_path_segment("nul.txt"), "%6Eul.txt");
        assert!(to_path_segment("CON").starts_with("%43ON~"));
    }

    #[test]
    fn uppercase_names_get_a_hash_suffix() {
        let upper = to_path_segment("Work");
        let lower = to_path_segment("work");
        assert_eq!(lower, "work");
        assert!(upper.starts_with("Work~"));
        assert_eq!(upper.len(), "Work~".len() + 8);
        assert_ne!(upper.to_lowercase(), lower);
    }

    #[test]
    fn long_names_are_truncated() {
        let name = "ü".repeat(100);
        let segment = to_path_segment(&name);
        assert!(segment.len() <= MAX_SEGMENT_LEN);
        assert!(segment.contains('~'));
        let before_suffix = segment.split('~').next().unwrap();
        assert_eq!(before_suffix.len() % 3, 0);
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(name in "\\PC{0,40}") {
            prop_assert_eq!(decode(&encode(&name)), name);
        }

        #[test]
        fn encoded_names_are_printable_ascii(name in "\\PC{0,40}") {
            prop_assert!(encode(&name).bytes().all(|b| (0x20..0x7f).contains(&b)));
        }

        #[test]
        fn segments_are_filesystem_safe(name in "\\PC{0,200}") {
            let segment = to_path_segment(&name);
            prop_assert!(!segment.is_empty());
            prop_assert!(segment.len() <= MAX_SEGMENT_LEN);
            prop_assert!(!segment.starts_with('.'));
            prop_assert!(segment.chars().all(|c| c.is_ascii_alphanumeric() || " ._-%~".contains(c)));
        }

        #[test]
        fn case_variants_never_share_a_directory(name in "[a-z]{1,12}") {
            let upper = name.to_uppercase();
            prop_assert_ne!(
                to_path_segment(&name).to_lowercase(),
                to_path_segment(&upper).to_lowercase()
            );
        }
    }
}
