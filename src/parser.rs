//! Operand assembly: turns lexer tokens into [`Object`]s.
//!
//! Arrays and dictionaries are parsed recursively. Content streams are often
//! damaged, so both composites are lenient: an unterminated array or
//! dictionary ends at end of input, and operator keywords found inside a
//! composite are dropped with a debug log.

use crate::lexer::{Token, token};
use crate::object::{Dictionary, Object};
use nom::IResult;

/// Maximum nesting depth of arrays and dictionaries inside one operand.
pub const MAX_NESTING: usize = 64;

/// Decode escape sequences in literal strings (`\n`, `\(`, `\ddd`, line
/// continuations, ...). Unknown escapes keep the escaped character.
///
/// # Examples
///
/// ```
/// # use pdf_interp::parser::decode_literal_string_escapes;
/// assert_eq!(decode_literal_string_escapes(b"a\\(b\\)\\101"), b"a(b)A");
/// ```
pub fn decode_literal_string_escapes(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut iter = raw.iter().copied().peekable();

    while let Some(c) = iter.next() {
        if c != b'\\' {
            out.push(c);
            continue;
        }
        let Some(esc) = iter.next() else {
            break;
        };
        match esc {
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0C),
            b'\n' => {},
            b'\r' => {
                if iter.peek() == Some(&b'\n') {
                    iter.next();
                }
            },
            b'0'..=b'7' => {
                let mut code = (esc - b'0') as u32;
                for _ in 0..2 {
                    match iter.peek() {
                        Some(&d @ b'0'..=b'7') => {
                            code = code * 8 + (d - b'0') as u32;
                            iter.next();
                        },
                        _ => break,
                    }
                }
                out.push((code & 0xFF) as u8);
            },
            other => out.push(other),
        }
    }

    out
}

/// Decode the digits of a hex string; odd counts get an implicit trailing 0.
/// Non-hex bytes are skipped.
pub fn decode_hex(digits: &[u8]) -> Vec<u8> {
    let nibbles: Vec<u8> = digits
        .iter()
        .filter_map(|&c| (c as char).to_digit(16).map(|d| d as u8))
        .collect();
    nibbles
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
        .collect()
}

/// Object for a scalar token, `None` for delimiters and keywords.
pub fn scalar_object(tok: &Token<'_>) -> Option<Object> {
    match tok {
        Token::Integer(i) => Some(Object::Integer(*i)),
        Token::Real(r) => Some(Object::Real(*r)),
        Token::LiteralString(raw) => Some(Object::String(decode_literal_string_escapes(raw))),
        Token::HexString(digits) => Some(Object::String(decode_hex(digits))),
        Token::Name(name) => Some(Object::Name(name.clone())),
        Token::True => Some(Object::Boolean(true)),
        Token::False => Some(Object::Boolean(false)),
        Token::Null => Some(Object::Null),
        _ => None,
    }
}

fn nesting_err(input: &[u8]) -> nom::Err<nom::error::Error<&[u8]>> {
    nom::Err::Failure(nom::error::Error::new(input, nom::error::ErrorKind::TooLarge))
}

/// Parse the value that starts with `tok`, reading further tokens for composites.
fn parse_value<'a>(input: &'a [u8], tok: Token<'a>, depth: usize) -> IResult<&'a [u8], Option<Object>> {
    match tok {
        Token::ArrayStart => {
            let (rest, arr) = parse_array_body(input, depth + 1)?;
            Ok((rest, Some(arr)))
        },
        Token::DictStart => {
            let (rest, dict) = parse_dictionary_body(input, depth + 1)?;
            Ok((rest, Some(dict)))
        },
        Token::Keyword(kw) => {
            log::debug!("Dropping operator '{}' inside an operand", kw);
            Ok((input, None))
        },
        other => Ok((input, scalar_object(&other))),
    }
}

fn parse_array_body(mut input: &[u8], depth: usize) -> IResult<&[u8], Object> {
    if depth > MAX_NESTING {
        return Err(nesting_err(input));
    }
    let mut items = Vec::new();
    loop {
        let (rest, tok) = match token(input) {
            Ok(ok) => ok,
            Err(_) => return Ok((input, Object::Array(items))),
        };
        if tok == Token::ArrayEnd {
            return Ok((rest, Object::Array(items)));
        }
        let (rest, value) = parse_value(rest, tok, depth)?;
        items.extend(value);
        input = rest;
    }
}

fn parse_dictionary_body(mut input: &[u8], depth: usize) -> IResult<&[u8], Object> {
    if depth > MAX_NESTING {
        return Err(nesting_err(input));
    }
    let mut dict = Dictionary::new();
    let mut key: Option<String> = None;
    loop {
        let (rest, tok) = match token(input) {
            Ok(ok) => ok,
            Err(_) => return Ok((input, Object::dictionary(dict))),
        };
        if tok == Token::DictEnd {
            if let Some(k) = key {
                log::debug!("Dictionary key /{} has no value", k);
            }
            return Ok((rest, Object::dictionary(dict)));
        }
        match key.take() {
            None => match tok {
                Token::Name(name) => key = Some(name),
                other => log::debug!("Skipping non-name dictionary key {:?}", other),
            },
            Some(k) => {
                let (after, value) = parse_value(rest, tok, depth)?;
                if let Some(value) = value {
                    dict.insert(k, value);
                }
                input = after;
                continue;
            },
        }
        input = rest;
    }
}

/// Parse an array; `input` starts right after `[`.
pub fn parse_array(input: &[u8]) -> IResult<&[u8], Object> {
    parse_array_body(input, 1)
}

/// Parse a dictionary; `input` starts right after `<<`.
pub fn parse_dictionary(input: &[u8]) -> IResult<&[u8], Object> {
    parse_dictionary_body(input, 1)
}

/// Parse one complete object from the start of `input`.
pub fn parse_object(input: &[u8]) -> IResult<&[u8], Object> {
    let (rest, tok) = token(input)?;
    match parse_value(rest, tok, 0)? {
        (rest, Some(obj)) => Ok((rest, obj)),
        (_, None) => Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag))),
    }
}
