//! PDF tokenizer.
//!
//! Splits PDF syntax into tokens: numbers, names, strings, keywords and the
//! `<< >> [ ]` delimiters. Object assembly lives in
//! [`pdf_parser`](super::pdf_parser).

use crate::error::{PdfError, Result};

/// PDF token types
#[derive(Debug, Clone, PartialEq)]
pub enum PSToken {
    /// Integer value
    Int(i64),
    /// Floating point value
    Real(f64),
    /// Boolean value
    Bool(bool),
    /// Literal name (e.g., /Name)
    Literal(String),
    /// Keyword/operator (e.g., obj, R, stream, `<<`)
    Keyword(Vec<u8>),
    /// String (literal or hex)
    String(Vec<u8>),
}

impl PSToken {
    /// True when this token is the keyword `kw`.
    pub fn is_keyword(&self, kw: &[u8]) -> bool {
        matches!(self, Self::Keyword(k) if k.as_slice() == kw)
    }
}

/// Byte-level tokenizer over a borrowed buffer.
pub struct PSBaseParser<'a> {
    data: &'a [u8],
    pos: usize,
    /// Current token position
    token_pos: usize,
}

impl<'a> PSBaseParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            token_pos: 0,
        }
    }

    /// Current position in stream
    pub fn tell(&self) -> usize {
        self.pos
    }

    /// Set current position in stream.
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
        self.token_pos = self.pos;
    }

    /// Get remaining unparsed data
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos.min(self.data.len())..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.data.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    /// Check if byte is whitespace
    pub fn is_whitespace(b: u8) -> bool {
        matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x00' | b'\x0c')
    }

    /// Check if byte is delimiter
    pub fn is_delimiter(b: u8) -> bool {
        matches!(
            b,
            b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
        )
    }

    fn is_keyword_end(b: u8) -> bool {
        Self::is_whitespace(b) || Self::is_delimiter(b)
    }

    /// Skip whitespace and comments
    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if Self::is_whitespace(b) {
                self.advance();
            } else if b == b'%' {
                while let Some(c) = self.advance() {
                    if c == b'\r' || c == b'\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    /// Parse a literal name (/Name)
    fn parse_literal(&mut self) -> Result<PSToken> {
        self.advance(); // '/'
        let mut name = Vec::new();

        while let Some(b) = self.peek() {
            if Self::is_whitespace(b) || Self::is_delimiter(b) {
                break;
            }
            self.advance();
            if b == b'#'
                && let (Some(h1), Some(h2)) = (self.peek(), self.peek_at(1))
                && let (Some(hi), Some(lo)) = (hex_value(h1), hex_value(h2))
            {
                self.pos += 2;
                name.push(hi << 4 | lo);
                continue;
            }
            if b != b'#' {
                name.push(b);
            }
        }

        let name_str = match String::from_utf8(name) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };
        Ok(PSToken::Literal(name_str))
    }

    /// Parse a number (integer or real)
    fn parse_number(&mut self) -> Result<PSToken> {
        let start = self.pos;
        let mut has_dot = false;

        if matches!(self.peek(), Some(b'+') | Some(b'-')) {
            self.advance();
        }

        while let Some(b) = self.peek() {
            if b.is_ascii_digit() {
                self.advance();
            } else if b == b'.' && !has_dot {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        let s = std::str::from_utf8(&self.data[start..self.pos]).map_err(|_| {
            PdfError::TokenError {
                pos: start,
                msg: "invalid number".into(),
            }
        })?;

        if has_dot {
            // "5." and "-.5" are both legal PDF reals
            let normalized = if s.ends_with('.') {
                format!("{s}0")
            } else {
                s.to_string()
            };
            let val: f64 = normalized.parse().map_err(|_| PdfError::TokenError {
                pos: start,
                msg: format!("invalid real: {s}"),
            })?;
            Ok(PSToken::Real(val))
        } else {
            let val: i64 = s.parse().map_err(|_| PdfError::TokenError {
                pos: start,
                msg: format!("invalid int: {s}"),
            })?;
            Ok(PSToken::Int(val))
        }
    }

    /// Parse a literal string (...)
    fn parse_string(&mut self) -> Result<PSToken> {
        self.advance(); // '('
        let mut result = Vec::new();
        let mut depth = 1;

        while depth > 0 {
            match self.advance() {
                Some(b'(') => {
                    depth += 1;
                    result.push(b'(');
                }
                Some(b')') => {
                    depth -= 1;
                    if depth > 0 {
                        result.push(b')');
                    }
                }
                Some(b'\\') => match self.advance() {
                    Some(b'n') => result.push(b'\n'),
                    Some(b'r') => result.push(b'\r'),
                    Some(b't') => result.push(b'\t'),
                    Some(b'b') => result.push(0x08),
                    Some(b'f') => result.push(0x0c),
                    Some(b'(') => result.push(b'('),
                    Some(b')') => result.push(b')'),
                    Some(b'\\') => result.push(b'\\'),
                    Some(b'\r') => {
                        // line continuation
                        if self.peek() == Some(b'\n') {
                            self.advance();
                        }
                    }
                    Some(b'\n') => {}
                    Some(c) if (b'0'..b'8').contains(&c) => {
                        let mut octal = (c - b'0') as u32;
                        for _ in 0..2 {
                            match self.peek() {
                                Some(d) if (b'0'..b'8').contains(&d) => {
                                    self.advance();
                                    octal = octal * 8 + (d - b'0') as u32;
                                }
                                _ => break,
                            }
                        }
                        result.push((octal & 0xFF) as u8);
                    }
                    Some(c) => result.push(c),
                    None => return Err(PdfError::UnexpectedEof),
                },
                Some(c) => result.push(c),
                None => return Err(PdfError::UnexpectedEof),
            }
        }

        Ok(PSToken::String(result))
    }

    /// Parse a hex string <...>
    fn parse_hex_string(&mut self) -> Result<PSToken> {
        self.advance(); // '<'
        let mut nibbles = Vec::new();

        loop {
            match self.advance() {
                Some(b'>') => break,
                Some(c) => {
                    if let Some(v) = hex_value(c) {
                        nibbles.push(v);
                    } else if !Self::is_whitespace(c) {
                        return Err(PdfError::TokenError {
                            pos: self.pos - 1,
                            msg: format!("invalid byte in hex string: {c:#04x}"),
                        });
                    }
                }
                None => return Err(PdfError::UnexpectedEof),
            }
        }

        // odd trailing nibble is padded with 0
        let bytes = nibbles
            .chunks(2)
            .map(|pair| pair[0] << 4 | pair.get(1).copied().unwrap_or(0))
            .collect();
        Ok(PSToken::String(bytes))
    }

    /// Parse a keyword
    fn parse_keyword(&mut self) -> Result<PSToken> {
        let start = self.pos;

        while let Some(b) = self.peek() {
            if Self::is_keyword_end(b) {
                break;
            }
            self.advance();
        }
        if self.pos == start {
            // lone delimiter such as ')' or '}'
            self.advance();
        }

        let keyword = self.data[start..self.pos].to_vec();
        match keyword.as_slice() {
            b"true" => Ok(PSToken::Bool(true)),
            b"false" => Ok(PSToken::Bool(false)),
            _ => Ok(PSToken::Keyword(keyword)),
        }
    }

    /// Get next token with its starting position.
    pub fn next_token(&mut self) -> Option<Result<(usize, PSToken)>> {
        self.skip_whitespace();

        if self.at_end() {
            return None;
        }

        self.token_pos = self.pos;
        let b = self.peek()?;

        let result = match b {
            b'/' => self.parse_literal(),
            b'(' => self.parse_string(),
            b'<' => {
                if self.peek_at(1) == Some(b'<') {
                    self.pos += 2;
                    Ok(PSToken::Keyword(b"<<".to_vec()))
                } else {
                    self.parse_hex_string()
                }
            }
            b'>' => {
                if self.peek_at(1) == Some(b'>') {
                    self.pos += 2;
                    Ok(PSToken::Keyword(b">>".to_vec()))
                } else {
                    self.advance();
                    Ok(PSToken::Keyword(b">".to_vec()))
                }
            }
            b'[' | b']' | b'{' | b'}' => {
                self.advance();
                Ok(PSToken::Keyword(vec![b]))
            }
            b'+' | b'-' => {
                if matches!(self.peek_at(1), Some(c) if c.is_ascii_digit() || c == b'.') {
                    self.parse_number()
                } else {
                    self.parse_keyword()
                }
            }
            b'.' => {
                if matches!(self.peek_at(1), Some(c) if c.is_ascii_digit()) {
                    self.parse_number()
                } else {
                    self.parse_keyword()
                }
            }
            c if c.is_ascii_digit() => self.parse_number(),
            _ => self.parse_keyword(),
        };

        Some(result.map(|token| (self.token_pos, token)))
    }
}

const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(data: &[u8]) -> Vec<PSToken> {
        let mut parser = PSBaseParser::new(data);
        let mut out = Vec::new();
        while let Some(tok) = parser.next_token() {
            out.push(tok.unwrap().1);
        }
        out
    }

    #[test]
    fn name_hex_escape_decodes_mime_subtype() {
        assert_eq!(
            tokens(b"/application#2Fxml"),
            vec![PSToken::Literal("application/xml".into())]
        );
    }

    #[test]
    fn strings_and_numbers() {
        assert_eq!(
            tokens(b"(a\\(b\\)\\101) <48 49 5> -3 4. .5 % comment\n true"),
            vec![
                PSToken::String(b"a(b)A".to_vec()),
                PSToken::String(vec![0x48, 0x49, 0x50]),
                PSToken::Int(-3),
                PSToken::Real(4.0),
                PSToken::Real(0.5),
                PSToken::Bool(true),
            ]
        );
    }

    #[test]
    fn dict_delimiters_are_keywords() {
        let toks = tokens(b"<</Size 3>>");
        assert!(toks[0].is_keyword(b"<<"));
        assert!(toks[3].is_keyword(b">>"));
    }

    #[test]
    fn unterminated_string_is_eof() {
        let mut parser = PSBaseParser::new(b"(abc");
        assert!(matches!(
            parser.next_token(),
            Some(Err(PdfError::UnexpectedEof))
        ));
    }
}
