//! Content-stream lexer.
//!
//! Splits a content stream into tokens. Compared to full-file PDF syntax,
//! content streams have no indirect objects or streams; instead every bare
//! word that is not a number or `true`/`false`/`null` is an operator keyword
//! (`re`, `f*`, `T*`, `'`, `"`, `BDC`, ...).
//!
//! Whitespace (space, \t, \r, \n, \0, \f) and comments (% to EOL) are skipped.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_till, take_while, take_while1},
    character::complete::{char, digit1, one_of},
    combinator::{map, opt, value},
    multi::many0,
    sequence::{delimited, preceded},
};

/// Token types recognized by the content lexer.
#[derive(Debug, PartialEq, Clone)]
pub enum Token<'a> {
    /// Integer number (e.g., 42, -123)
    Integer(i64),

    /// Real number (e.g., 3.14, -2.5, .5)
    Real(f64),

    /// Literal string bytes, escapes not yet decoded
    LiteralString(&'a [u8]),

    /// Hexadecimal string digits, whitespace preserved
    HexString(&'a [u8]),

    /// Name with `#XX` escapes decoded (e.g., "Type" from "/Type")
    Name(String),

    /// Boolean true keyword
    True,

    /// Boolean false keyword
    False,

    /// Null keyword
    Null,

    /// Array start delimiter [
    ArrayStart,

    /// Array end delimiter ]
    ArrayEnd,

    /// Dictionary start delimiter <<
    DictStart,

    /// Dictionary end delimiter >>
    DictEnd,

    /// Operator keyword (e.g., "re", "T*", "'")
    Keyword(&'a str),
}

/// PDF whitespace characters.
pub fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C)
}

/// PDF delimiter characters.
pub fn is_delimiter(c: u8) -> bool {
    matches!(c, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

/// Neither whitespace nor a delimiter.
pub fn is_regular(c: u8) -> bool {
    !is_whitespace(c) && !is_delimiter(c)
}

fn comment(input: &[u8]) -> IResult<&[u8], ()> {
    value((), preceded(char('%'), take_till(|c| c == b'\r' || c == b'\n')))(input)
}

/// Skip all whitespace and comments. Never fails.
pub fn skip_ws(input: &[u8]) -> IResult<&[u8], ()> {
    let mut remaining = input;
    loop {
        let (rest, _) = take_while(is_whitespace)(remaining)?;
        remaining = rest;
        match comment(remaining) {
            Ok((rest, _)) => remaining = rest,
            Err(_) => break,
        }
    }
    Ok((remaining, ()))
}

fn digit_err(input: &[u8]) -> nom::Err<nom::error::Error<&[u8]>> {
    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
}

/// Parse an integer or real number.
///
/// The number must end at whitespace, a delimiter or end of input, so that
/// words such as `1a` fall through to the keyword rule.
fn parse_number(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let start = input;
    let (input, sign) = opt(one_of("+-"))(input)?;
    let (input, int_part) = opt(digit1)(input)?;
    let (input, frac_part) = opt(preceded(char('.'), opt(digit1)))(input)?;

    if int_part.is_none() && !matches!(frac_part, Some(Some(_))) {
        return Err(digit_err(start));
    }
    if input.first().is_some_and(|&c| is_regular(c)) {
        return Err(digit_err(start));
    }

    let consumed = &start[..start.len() - input.len()];
    let text = std::str::from_utf8(consumed).map_err(|_| digit_err(start))?;

    if frac_part.is_some() {
        // Rust's parser rejects "5." and "-.5" style forms, rebuild them
        let mut normalized = String::with_capacity(text.len() + 2);
        if sign == Some('-') {
            normalized.push('-');
        }
        normalized.push_str(int_part.map_or("0", |d| std::str::from_utf8(d).unwrap_or("0")));
        normalized.push('.');
        match frac_part {
            Some(Some(frac)) => normalized.push_str(std::str::from_utf8(frac).unwrap_or("0")),
            _ => normalized.push('0'),
        }
        let num: f64 = normalized.parse().map_err(|_| digit_err(start))?;
        Ok((input, Token::Real(num)))
    } else {
        match text.parse::<i64>() {
            Ok(num) => Ok((input, Token::Integer(num))),
            // too large for i64: keep the magnitude as a real
            Err(_) => text
                .parse::<f64>()
                .map(|num| (input, Token::Real(num)))
                .map_err(|_| digit_err(start)),
        }
    }
}

/// Parse a literal string enclosed in balanced parentheses.
///
/// Escapes are skipped over but not decoded. An unterminated string consumes
/// the rest of the input.
fn parse_literal_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (body, _) = char('(')(input)?;
    let mut depth = 1usize;
    let mut pos = 0usize;

    while pos < body.len() {
        match body[pos] {
            b'\\' => pos += 1,
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&body[pos + 1..], Token::LiteralString(&body[..pos])));
                }
            },
            _ => {},
        }
        pos += 1;
    }

    log::debug!("Unterminated literal string of {} bytes", body.len());
    Ok((&body[body.len()..], Token::LiteralString(body)))
}

/// Parse a hexadecimal string enclosed in angle brackets.
fn parse_hex_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    if input.starts_with(b"<<") {
        return Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag)));
    }

    delimited(
        char('<'),
        map(
            take_while(|c: u8| c.is_ascii_hexdigit() || is_whitespace(c)),
            Token::HexString,
        ),
        char('>'),
    )(input)
}

/// Decode #XX escape sequences in PDF names.
///
/// # Examples
///
/// ```
/// # use pdf_interp::lexer::decode_name_escapes;
/// assert_eq!(decode_name_escapes(b"A#20B#23C"), "A B#C");
/// assert_eq!(decode_name_escapes(b"Type"), "Type");
/// assert_eq!(decode_name_escapes(b"A#"), "A#");
/// ```
pub fn decode_name_escapes(raw: &[u8]) -> String {
    let mut bytes = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'#' && i + 2 < raw.len() {
            let hex = std::str::from_utf8(&raw[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                bytes.push(byte);
                i += 3;
                continue;
            }
        }
        bytes.push(raw[i]);
        i += 1;
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Parse a name starting with /.
fn parse_name(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    preceded(
        char('/'),
        map(take_while(is_regular), |bytes| Token::Name(decode_name_escapes(bytes))),
    )(input)
}

/// Parse array and dictionary delimiters.
fn parse_delimiter(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    alt((
        value(Token::DictStart, tag(b"<<")),
        value(Token::DictEnd, tag(b">>")),
        value(Token::ArrayStart, tag(b"[")),
        value(Token::ArrayEnd, tag(b"]")),
    ))(input)
}

/// Parse a bare word: `true`, `false`, `null`, or an operator keyword.
fn parse_word(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (rest, word) = take_while1(is_regular)(input)?;
    let word = std::str::from_utf8(word).map_err(|_| {
        nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::AlphaNumeric))
    })?;
    let tok = match word {
        "true" => Token::True,
        "false" => Token::False,
        "null" => Token::Null,
        kw => Token::Keyword(kw),
    };
    Ok((rest, tok))
}

/// Parse a single content token after skipping whitespace and comments.
///
/// # Parsing Order
///
/// 1. Delimiters (`<<` must win over hex strings)
/// 2. Names
/// 3. Numbers (must win over bare words)
/// 4. Strings
/// 5. Bare words (keywords, booleans, null)
///
/// # Errors
///
/// Returns `Err` at end of input or when the next byte starts no token
/// (a stray `)`, `>`, `{` or `}`).
pub fn token(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (input, _) = skip_ws(input)?;

    alt((
        parse_delimiter,
        parse_name,
        parse_number,
        parse_literal_string,
        parse_hex_string,
        parse_word,
    ))(input)
}

/// Parse tokens until the input is exhausted or an unparseable byte is hit.
pub fn tokens(input: &[u8]) -> IResult<&[u8], Vec<Token<'_>>> {
    many0(token)(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Numbers
    // ========================================================================

    #[test]
    fn test_parse_integers() {
        assert_eq!(token(b"42"), Ok((&b""[..], Token::Integer(42))));
        assert_eq!(token(b"-123"), Ok((&b""[..], Token::Integer(-123))));
        assert_eq!(token(b"+7 "), Ok((&b" "[..], Token::Integer(7))));
    }

    #[test]
    fn test_parse_reals() {
        assert_eq!(token(b"-2.5"), Ok((&b""[..], Token::Real(-2.5))));
        assert_eq!(token(b".5"), Ok((&b""[..], Token::Real(0.5))));
        assert_eq!(token(b"5."), Ok((&b""[..], Token::Real(5.0))));
        assert_eq!(token(b"-.002"), Ok((&b""[..], Token::Real(-0.002))));
    }

    #[test]
    fn test_number_followed_by_delimiter() {
        assert_eq!(token(b"10[").map(|(r, t)| (r.len(), t)), Ok((1, Token::Integer(10))));
    }

    // ========================================================================
    // Keywords
    // ========================================================================

    #[test]
    fn test_operator_keywords() {
        for kw in ["re", "f*", "T*", "'", "\"", "BDC", "d0", "W*", "EI"] {
            let (rest, tok) = token(kw.as_bytes()).unwrap();
            assert!(rest.is_empty());
            assert_eq!(tok, Token::Keyword(kw));
        }
    }

    #[test]
    fn test_keyword_not_split_by_prefix() {
        assert_eq!(token(b"trueX"), Ok((&b""[..], Token::Keyword("trueX"))));
        assert_eq!(token(b"true"), Ok((&b""[..], Token::True)));
        assert_eq!(token(b"null]"), Ok((&b"]"[..], Token::Null)));
    }

    #[test]
    fn test_lone_sign_is_keyword() {
        assert_eq!(token(b"-"), Ok((&b""[..], Token::Keyword("-"))));
        assert_eq!(token(b"1a"), Ok((&b""[..], Token::Keyword("1a"))));
    }

    // ========================================================================
    // Strings and names
    // ========================================================================

    #[test]
    fn test_literal_string_nested_and_escaped() {
        assert_eq!(
            token(b"(a (b) \\) c) Tj"),
            Ok((&b" Tj"[..], Token::LiteralString(b"a (b) \\) c")))
        );
    }

    #[test]
    fn test_unterminated_literal_string() {
        assert_eq!(token(b"(abc"), Ok((&b""[..], Token::LiteralString(b"abc"))));
    }

    #[test]
    fn test_hex_string_vs_dict() {
        assert_eq!(token(b"<48 65>"), Ok((&b""[..], Token::HexString(b"48 65"))));
        assert_eq!(token(b"<</A 1>>").map(|(_, t)| t), Ok(Token::DictStart));
    }

    #[test]
    fn test_names() {
        assert_eq!(token(b"/F1 12"), Ok((&b" 12"[..], Token::Name("F1".to_string()))));
        assert_eq!(token(b"/A#20B"), Ok((&b""[..], Token::Name("A B".to_string()))));
        assert_eq!(token(b"/ "), Ok((&b" "[..], Token::Name(String::new()))));
    }

    // ========================================================================
    // Whitespace, comments and sequences
    // ========================================================================

    #[test]
    fn test_skip_comments() {
        assert_eq!(token(b"% comment\n  q"), Ok((&b""[..], Token::Keyword("q"))));
    }

    #[test]
    fn test_content_sequence() {
        let (rest, toks) = tokens(b"q 1 0 0 1 10 10 cm [1 2] 0 d Q").unwrap();
        assert!(rest.is_empty());
        assert_eq!(toks.len(), 15);
        assert_eq!(toks[7], Token::Keyword("cm"));
        assert_eq!(toks[8], Token::ArrayStart);
        assert_eq!(toks[14], Token::Keyword("Q"));
    }

    #[test]
    fn test_stray_delimiter_is_error() {
        assert!(token(b") q").is_err());
        assert!(token(b"   ").is_err());
    }
}
