//! FETCH data items.

use crate::parser::lexer::{Lexer, Token};
use crate::types::Uid;
use crate::Result;

use super::helpers::parse_flag_list;
use super::types::FetchItem;

/// Parses `(ITEM value ITEM value ...)`.
pub fn parse_fetch_response(lexer: &mut Lexer<'_>) -> Result<Vec<FetchItem>> {
    lexer.expect(Token::LParen)?;
    let mut items = Vec::new();

    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(name) => match name.to_ascii_uppercase().as_str() {
                "FLAGS" => {
                    lexer.expect_space()?;
                    items.push(FetchItem::Flags(parse_flag_list(lexer)?));
                }
                "UID" => {
                    lexer.expect_space()?;
                    let n = lexer.read_number()?;
                    let uid = Uid::new(n).ok_or_else(|| lexer.error("UID 0 in FETCH"))?;
                    items.push(FetchItem::Uid(uid));
                }
                "RFC822.SIZE" => {
                    lexer.expect_space()?;
                    items.push(FetchItem::Rfc822Size(lexer.read_number()?));
                }
                "INTERNALDATE" => {
                    lexer.expect_space()?;
                    if let Token::QuotedString(date) = lexer.next_token()? {
                        items.push(FetchItem::InternalDate(date));
                    }
                }
                "BODY" | "BODY.PEEK" | "RFC822" => {
                    let section = parse_section(lexer);
                    lexer.expect_space()?;
                    let data = match lexer.next_token()? {
                        Token::Literal(d) => Some(d),
                        Token::QuotedString(s) => Some(s.into_bytes()),
                        _ => None,
                    };
                    items.push(FetchItem::Body { section, data });
                }
                _ => skip_value(lexer)?,
            },
            token => return Err(lexer.error(&format!("unexpected {token:?} in FETCH"))),
        }
    }

    Ok(items)
}

/// Reads `[section]<origin>` after BODY; the origin is dropped.
fn parse_section(lexer: &mut Lexer<'_>) -> Option<String> {
    let mut section = None;
    if lexer.peek() == Some(b'[') {
        lexer.advance();
        let mut text = String::new();
        while let Some(b) = lexer.advance() {
            if b == b']' {
                break;
            }
            text.push(char::from(b));
        }
        if !text.is_empty() {
            section = Some(text);
        }
    }
    if lexer.peek() == Some(b'<') {
        while let Some(b) = lexer.advance() {
            if b == b'>' {
                break;
            }
        }
    }
    section
}

/// Skips the value of an item this client never requests.
fn skip_value(lexer: &mut Lexer<'_>) -> Result<()> {
    if lexer.peek() == Some(b'[') {
        parse_section(lexer);
    }
    if lexer.peek() == Some(b' ') {
        lexer.advance();
    }
    let mut depth = 0usize;
    loop {
        match lexer.next_token()? {
            Token::LParen => depth += 1,
            Token::RParen if depth > 0 => depth -= 1,
            Token::Eof => return Err(lexer.error("unterminated FETCH item")),
            _ => {}
        }
        if depth == 0 {
            return Ok(());
        }
    }
}
