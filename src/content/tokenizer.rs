//! Token source for the content interpreter.
//!
//! The interpreter reads through the [`Tokenizer`] trait so hosts can plug in
//! their own lexer; [`ContentTokenizer`] is the default one, built on the nom
//! lexer in [`crate::lexer`].
//!
//! # Inline images
//!
//! `BI <key value>... ID <binary data> EI` cannot be lexed token by token,
//! because the data may contain any byte. After the interpreter sees `BI` it
//! calls [`Tokenizer::read_inline_image`], which reads the abbreviated
//! dictionary, then the raw data up to an `EI` that is preceded by whitespace
//! and followed by whitespace, a delimiter or the end of the stream.

use crate::lexer::{self, Token};
use crate::object::{Dictionary, Object};
use crate::parser;

/// One item read from a content stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentToken {
    /// An operator keyword (`re`, `Tj`, `BI`, ...)
    Keyword(String),
    /// An operand
    Object(Object),
}

/// Source of content-stream tokens.
pub trait Tokenizer {
    /// Next token, or `None` at end of stream.
    fn read_token(&mut self) -> Option<ContentToken>;

    /// Read an inline image following `BI`. Returns an image stream object
    /// with its keys expanded, or `None` when the image is unreadable.
    fn read_inline_image(&mut self) -> Option<Object>;
}

/// [`Tokenizer`] over an in-memory content stream.
///
/// Unparseable bytes are skipped one at a time with a debug log, so a
/// damaged stream still yields every token that can be recovered.
#[derive(Debug, Clone)]
pub struct ContentTokenizer<'a> {
    input: &'a [u8],
    pos: usize,
    skipped: usize,
}

impl<'a> ContentTokenizer<'a> {
    /// Tokenize `input` from the start.
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            skipped: 0,
        }
    }

    /// Current byte offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bytes dropped because no token started there.
    pub fn skipped_bytes(&self) -> usize {
        self.skipped
    }

    fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos.min(self.input.len())..]
    }

    fn advance_to(&mut self, rest: &'a [u8]) {
        self.pos = self.input.len() - rest.len();
    }

    fn skip_byte(&mut self) {
        log::debug!(
            "Skipping unparseable byte 0x{:02x} at offset {}",
            self.input[self.pos],
            self.pos
        );
        self.pos += 1;
        self.skipped += 1;
    }

    /// Expand a lexer token into a full content token, reading composites.
    fn complete(&mut self, rest: &'a [u8], tok: Token<'a>) -> Option<ContentToken> {
        let composite = match tok {
            Token::Keyword(kw) => {
                self.advance_to(rest);
                return Some(ContentToken::Keyword(kw.to_string()));
            },
            Token::ArrayStart => parser::parse_array(rest),
            Token::DictStart => parser::parse_dictionary(rest),
            Token::ArrayEnd | Token::DictEnd => {
                log::debug!("Stray {:?} at offset {}", tok, self.pos);
                self.advance_to(rest);
                return None;
            },
            other => {
                self.advance_to(rest);
                return parser::scalar_object(&other).map(ContentToken::Object);
            },
        };
        match composite {
            Ok((after, obj)) => {
                self.advance_to(after);
                Some(ContentToken::Object(obj))
            },
            Err(e) => {
                log::debug!("Dropping malformed operand at offset {}: {:?}", self.pos, e);
                self.advance_to(rest);
                None
            },
        }
    }
}

impl Tokenizer for ContentTokenizer<'_> {
    fn read_token(&mut self) -> Option<ContentToken> {
        loop {
            let input = self.remaining();
            let Ok((input, ())) = lexer::skip_ws(input) else {
                return None;
            };
            self.advance_to(input);
            if input.is_empty() {
                return None;
            }
            match lexer::token(input) {
                Ok((rest, tok)) => {
                    if let Some(item) = self.complete(rest, tok) {
                        log::trace!("token {:?}", item);
                        return Some(item);
                    }
                },
                Err(_) => self.skip_byte(),
            }
        }
    }

    fn read_inline_image(&mut self) -> Option<Object> {
        let mut dict = Dictionary::new();

        // Key/value pairs up to the ID keyword
        loop {
            let (rest, tok) = match lexer::token(self.remaining()) {
                Ok(ok) => ok,
                Err(_) => {
                    log::debug!("Inline image dictionary not terminated by ID");
                    self.pos = self.input.len();
                    return None;
                },
            };
            match tok {
                Token::Keyword("ID") => {
                    self.advance_to(rest);
                    break;
                },
                Token::Name(key) => {
                    self.advance_to(rest);
                    let Ok((after, value)) = parser::parse_object(self.remaining()) else {
                        log::debug!("Inline image key /{} has no value", key);
                        continue;
                    };
                    self.advance_to(after);
                    dict.insert(expand_key(&key).to_string(), expand_value(value));
                },
                other => {
                    log::debug!("Unexpected {:?} in inline image dictionary", other);
                    self.advance_to(rest);
                },
            }
        }

        // A single whitespace byte separates ID from the data
        let mut data_start = self.pos;
        if self.input.get(data_start).copied().is_some_and(lexer::is_whitespace) {
            data_start += 1;
        }
        let data = &self.input[data_start.min(self.input.len())..];
        let (len, consumed) = match find_end_marker(data) {
            Some(ws) => (ws, ws + 3),
            None => {
                log::debug!("Inline image data not terminated by EI");
                (data.len(), data.len())
            },
        };
        self.pos = data_start + consumed;

        dict.insert("Subtype".to_string(), Object::name("Image"));
        dict.insert("Length".to_string(), Object::Integer(len as i64));
        Some(Object::stream(dict, data[..len].to_vec()))
    }
}

/// Offset of the whitespace byte that precedes a terminating `EI`.
fn find_end_marker(data: &[u8]) -> Option<usize> {
    (0..data.len().saturating_sub(2)).find(|&i| {
        lexer::is_whitespace(data[i])
            && &data[i + 1..i + 3] == b"EI"
            && data.get(i + 3).map_or(true, |&c| !lexer::is_regular(c))
    })
}

/// Full name for an abbreviated inline-image key.
pub fn expand_key(key: &str) -> &str {
    match key {
        "BPC" => "BitsPerComponent",
        "CS" => "ColorSpace",
        "D" => "Decode",
        "DP" => "DecodeParms",
        "F" => "Filter",
        "H" => "Height",
        "W" => "Width",
        "IM" => "ImageMask",
        "I" => "Interpolate",
        other => other,
    }
}

/// Full name for an abbreviated color space or filter name.
pub fn expand_name(name: &str) -> &str {
    match name {
        "G" => "DeviceGray",
        "RGB" => "DeviceRGB",
        "CMYK" => "DeviceCMYK",
        "I" => "Indexed",
        "AHx" => "ASCIIHexDecode",
        "A85" => "ASCII85Decode",
        "LZW" => "LZWDecode",
        "Fl" => "FlateDecode",
        "RL" => "RunLengthDecode",
        "CCF" => "CCITTFaxDecode",
        "DCT" => "DCTDecode",
        other => other,
    }
}

fn expand_value(value: Object) -> Object {
    match value {
        Object::Name(n) => Object::Name(expand_name(&n).to_string()),
        Object::Array(items) => Object::Array(items.into_iter().map(expand_value).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(input: &[u8]) -> Vec<ContentToken> {
        let mut tok = ContentTokenizer::new(input);
        std::iter::from_fn(|| tok.read_token()).collect()
    }

    #[test]
    fn test_operands_and_keywords() {
        let toks = collect(b"0 0 1 rg [1 2] 0 d");
        assert_eq!(toks.len(), 7);
        assert_eq!(toks[3], ContentToken::Keyword("rg".to_string()));
        assert_eq!(
            toks[4],
            ContentToken::Object(Object::Array(vec![Object::Integer(1), Object::Integer(2)]))
        );
        assert_eq!(toks[6], ContentToken::Keyword("d".to_string()));
    }

    #[test]
    fn test_dictionary_operand() {
        let toks = collect(b"/Span << /MCID 0 >> BDC");
        assert!(matches!(&toks[1], ContentToken::Object(Object::Dictionary(_))));
        assert_eq!(toks[2], ContentToken::Keyword("BDC".to_string()));
    }

    #[test]
    fn test_garbage_bytes_are_skipped() {
        let mut tok = ContentTokenizer::new(b") } 1 w");
        let toks: Vec<_> = std::iter::from_fn(|| tok.read_token()).collect();
        assert_eq!(toks.len(), 2);
        assert_eq!(tok.skipped_bytes(), 2);
    }

    #[test]
    fn test_stray_closers_are_dropped() {
        assert_eq!(collect(b"] >> Q"), vec![ContentToken::Keyword("Q".to_string())]);
    }

    #[test]
    fn test_inline_image() {
        let mut tok = ContentTokenizer::new(b"BI /W 2 /H 1 /CS /RGB /BPC 8 /F /AHx ID \x01\x02EI\x03 EI Q");
        assert_eq!(tok.read_token(), Some(ContentToken::Keyword("BI".to_string())));
        let image = tok.read_inline_image().unwrap();
        assert_eq!(image.get("Width"), Some(&Object::Integer(2)));
        assert_eq!(image.get("ColorSpace"), Some(&Object::name("DeviceRGB")));
        assert_eq!(image.get("Filter"), Some(&Object::name("ASCIIHexDecode")));
        assert_eq!(image.get("Subtype"), Some(&Object::name("Image")));
        assert_eq!(image.stream_data().map(|d| d.as_ref()), Some(&b"\x01\x02EI\x03"[..]));
        assert_eq!(tok.read_token(), Some(ContentToken::Keyword("Q".to_string())));
    }

    #[test]
    fn test_inline_image_at_end_of_stream() {
        let mut tok = ContentTokenizer::new(b"BI /W 1 /H 1 ID \xff EI");
        tok.read_token();
        let image = tok.read_inline_image().unwrap();
        assert_eq!(image.stream_data().map(|d| d.len()), Some(1));
        assert_eq!(tok.read_token(), None);
    }

    #[test]
    fn test_inline_filter_array_expanded() {
        let mut tok = ContentTokenizer::new(b"BI /F [/A85 /Fl] ID x EI");
        tok.read_token();
        let image = tok.read_inline_image().unwrap();
        assert_eq!(
            image.get("Filter"),
            Some(&Object::Array(vec![Object::name("ASCII85Decode"), Object::name("FlateDecode")]))
        );
    }

    #[test]
    fn test_unterminated_inline_dictionary() {
        let mut tok = ContentTokenizer::new(b"BI /W 1 /H");
        tok.read_token();
        assert!(tok.read_inline_image().is_none());
        assert_eq!(tok.read_token(), None);
    }
}
