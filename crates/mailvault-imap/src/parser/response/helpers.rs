//! Shared parsing routines.

use crate::parser::lexer::{Lexer, Token};
use crate::types::{
    Capability, Flag, Flags, ListResponse, Mailbox, MailboxAttribute, ResponseCode, Uid,
    UidValidity,
};
use crate::Result;

use super::types::StatusItem;

fn nonzero<T>(lexer: &Lexer<'_>, value: Option<T>, what: &str) -> Result<T> {
    value.ok_or_else(|| lexer.error(&format!("{what} must be non-zero")))
}

/// Parses `[CODE ...]`.
pub fn parse_response_code(lexer: &mut Lexer<'_>) -> Result<ResponseCode> {
    lexer.expect(Token::LBracket)?;
    let atom = lexer.read_atom_string()?;

    let code = match atom.to_ascii_uppercase().as_str() {
        "ALERT" => ResponseCode::Alert,
        "READ-ONLY" => ResponseCode::ReadOnly,
        "READ-WRITE" => ResponseCode::ReadWrite,
        "TRYCREATE" => ResponseCode::TryCreate,
        "ALREADYEXISTS" => ResponseCode::AlreadyExists,
        "NONEXISTENT" => ResponseCode::NonExistent,
        "AUTHENTICATIONFAILED" => ResponseCode::AuthenticationFailed,
        "UIDNEXT" => {
            lexer.expect_space()?;
            let n = lexer.read_number()?;
            ResponseCode::UidNext(nonzero(lexer, Uid::new(n), "UIDNEXT")?)
        }
        "UIDVALIDITY" => {
            lexer.expect_space()?;
            let n = lexer.read_number()?;
            ResponseCode::UidValidity(nonzero(lexer, UidValidity::new(n), "UIDVALIDITY")?)
        }
        "APPENDUID" => {
            lexer.expect_space()?;
            let v = lexer.read_number()?;
            lexer.expect_space()?;
            let u = lexer.read_number()?;
            ResponseCode::AppendUid {
                uid_validity: nonzero(lexer, UidValidity::new(v), "UIDVALIDITY")?,
                uid: nonzero(lexer, Uid::new(u), "UID")?,
            }
        }
        "CAPABILITY" => ResponseCode::Capability(parse_capability_data(lexer)?),
        "PERMANENTFLAGS" => {
            lexer.expect_space()?;
            ResponseCode::PermanentFlags(parse_flag_list(lexer)?.into_iter().collect())
        }
        _ => ResponseCode::Unknown(atom.to_string()),
    };

    while lexer.peek().is_some_and(|b| b != b']') {
        lexer.advance();
    }
    lexer.expect(Token::RBracket)?;
    Ok(code)
}

/// Parses the space-separated capability atoms up to the line end.
pub fn parse_capability_data(lexer: &mut Lexer<'_>) -> Result<Vec<Capability>> {
    let mut caps = Vec::new();
    while lexer.peek() == Some(b' ') {
        lexer.advance();
        if let Token::Atom(s) = lexer.next_token()? {
            caps.push(Capability::parse(s));
        }
    }
    Ok(caps)
}

/// Parses `(flag flag ...)`.
pub fn parse_flag_list(lexer: &mut Lexer<'_>) -> Result<Flags> {
    lexer.expect(Token::LParen)?;
    let mut flags = Flags::new();

    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            // `\*` lexes as `\` followed by an asterisk.
            Token::Atom("\\") if lexer.peek() == Some(b'*') => {
                lexer.advance();
                flags.insert(Flag::parse("\\*"));
            }
            Token::Atom(s) => flags.insert(Flag::parse(s)),
            token => return Err(lexer.error(&format!("unexpected {token:?} in flag list"))),
        }
    }

    Ok(flags)
}

/// Parses the body of `* LIST (attrs) "delim" name`.
pub fn parse_list_response(lexer: &mut Lexer<'_>) -> Result<ListResponse> {
    lexer.expect(Token::LParen)?;
    let mut attributes = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(s) => attributes.push(MailboxAttribute::parse(s)),
            token => return Err(lexer.error(&format!("unexpected {token:?} in LIST attributes"))),
        }
    }

    lexer.expect_space()?;
    let delimiter = match lexer.next_token()? {
        Token::Nil => None,
        Token::QuotedString(s) => s.chars().next(),
        token => return Err(lexer.error(&format!("expected delimiter, got {token:?}"))),
    };

    lexer.expect_space()?;
    let name = lexer.read_astring()?;

    Ok(ListResponse {
        attributes,
        delimiter,
        mailbox: Mailbox::new(name),
    })
}

/// Parses the numbers of a SEARCH response.
pub fn parse_search_response(lexer: &mut Lexer<'_>) -> Result<Vec<u32>> {
    let mut nums = Vec::new();
    while lexer.peek() == Some(b' ') {
        lexer.advance();
        match lexer.next_token()? {
            Token::Number(n) if n > 0 => nums.push(n),
            // Trailing `(MODSEQ n)` and similar extensions.
            Token::LParen => {
                while !matches!(lexer.next_token()?, Token::RParen | Token::Eof) {}
            }
            _ => {}
        }
    }
    Ok(nums)
}

/// Parses `mailbox (NAME value ...)` of a STATUS response.
pub fn parse_status_response(lexer: &mut Lexer<'_>) -> Result<(Mailbox, Vec<StatusItem>)> {
    let name = lexer.read_astring()?;
    lexer.expect_space()?;
    lexer.expect(Token::LParen)?;

    let mut items = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::RParen | Token::Eof => break,
            Token::Atom(attr) => {
                lexer.expect_space()?;
                let value = match lexer.next_token()? {
                    Token::Number(n) => n,
                    _ => continue,
                };
                let item = match attr.to_ascii_uppercase().as_str() {
                    "MESSAGES" => Some(StatusItem::Messages(value)),
                    "RECENT" => Some(StatusItem::Recent(value)),
                    "UNSEEN" => Some(StatusItem::Unseen(value)),
                    "UIDNEXT" => Uid::new(value).map(StatusItem::UidNext),
                    "UIDVALIDITY" => UidValidity::new(value).map(StatusItem::UidValidity),
                    _ => None,
                };
                items.extend(item);
            }
            _ => {}
        }
    }

    Ok((Mailbox::new(name), items))
}

/// Consumes and returns the rest of the line, without the CRLF.
pub fn read_text_until_crlf(lexer: &mut Lexer<'_>) -> String {
    let remaining = lexer.remaining();
    let end = remaining
        .windows(2)
        .position(|w| w == b"\r\n")
        .unwrap_or(remaining.len());

    lexer.skip(end + 2);
    String::from_utf8_lossy(&remaining[..end]).into_owned()
}
