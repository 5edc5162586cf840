//! PDF object parser - assembles tokens into PDF objects.

use super::lexer::{PSBaseParser, PSToken};
use crate::error::{PdfError, Result};
use crate::model::{PDFDict, PDFObjRef, PDFObject};

/// Nesting limit for arrays and dictionaries.
const MAX_NESTING: usize = 256;

/// PDF Parser - parses PDF object syntax
///
/// Uses PSBaseParser for tokenization and builds PDF objects,
/// handling indirect references (num num R) appropriately.
pub struct PDFParser<'a> {
    base: PSBaseParser<'a>,
    /// Lookahead buffer for tokens
    lookahead: Vec<(usize, PSToken)>,
}

impl<'a> PDFParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            base: PSBaseParser::new(data),
            lookahead: Vec::new(),
        }
    }

    /// Parser positioned at `pos` within `data`.
    pub fn new_at(data: &'a [u8], pos: usize) -> Self {
        let mut parser = Self::new(data);
        parser.base.set_pos(pos);
        parser
    }

    /// Position of the next unread token.
    pub fn tell(&self) -> usize {
        self.lookahead
            .last()
            .map(|(pos, _)| *pos)
            .unwrap_or_else(|| self.base.tell())
    }

    /// Get next token (from lookahead or parser)
    pub fn next_token(&mut self) -> Result<Option<PSToken>> {
        Ok(self.next_positioned()?.map(|(_, tok)| tok))
    }

    fn next_positioned(&mut self) -> Result<Option<(usize, PSToken)>> {
        if let Some(tok) = self.lookahead.pop() {
            return Ok(Some(tok));
        }
        self.base.next_token().transpose()
    }

    /// Push token back to lookahead
    fn push_back(&mut self, pos: usize, tok: PSToken) {
        self.lookahead.push((pos, tok));
    }

    /// Parse next PDF object
    pub fn parse_object(&mut self) -> Result<PDFObject> {
        self.parse_nested(0)
    }

    fn parse_nested(&mut self, depth: usize) -> Result<PDFObject> {
        let (pos, token) = self.next_positioned()?.ok_or(PdfError::UnexpectedEof)?;
        self.token_to_object(pos, token, depth)
    }

    /// Parse the `objid genno obj` header of an indirect object.
    pub fn parse_object_header(&mut self) -> Result<(u32, u32)> {
        let objid = self.expect_int("object number")?;
        let genno = self.expect_int("generation number")?;
        match self.next_positioned()? {
            Some((_, tok)) if tok.is_keyword(b"obj") => Ok((objid, genno)),
            Some((pos, _)) => Err(PdfError::TokenError {
                pos,
                msg: "expected 'obj'".into(),
            }),
            None => Err(PdfError::UnexpectedEof),
        }
    }

    fn expect_int(&mut self, what: &str) -> Result<u32> {
        match self.next_positioned()? {
            Some((_, PSToken::Int(n))) if n >= 0 => Ok(n as u32),
            Some((pos, _)) => Err(PdfError::TokenError {
                pos,
                msg: format!("expected {what}"),
            }),
            None => Err(PdfError::UnexpectedEof),
        }
    }

    /// Convert a token to a PDF object
    fn token_to_object(&mut self, pos: usize, token: PSToken, depth: usize) -> Result<PDFObject> {
        match token {
            PSToken::Int(n) => {
                // Could be start of indirect reference: objid genno R
                if let Some((pos2, tok2)) = self.next_positioned()? {
                    if let PSToken::Int(m) = tok2 {
                        if let Some((pos3, tok3)) = self.next_positioned()? {
                            if tok3.is_keyword(b"R") && n >= 0 && m >= 0 {
                                return Ok(PDFObject::Ref(PDFObjRef::new(n as u32, m as u32)));
                            }
                            // Not R, push back both
                            self.push_back(pos3, tok3);
                        }
                        self.push_back(pos2, PSToken::Int(m));
                    } else {
                        self.push_back(pos2, tok2);
                    }
                }
                Ok(PDFObject::Int(n))
            }
            PSToken::Real(n) => Ok(PDFObject::Real(n)),
            PSToken::Bool(b) => Ok(PDFObject::Bool(b)),
            PSToken::Literal(s) => Ok(PDFObject::Name(s)),
            PSToken::String(s) => Ok(PDFObject::String(s)),
            PSToken::Keyword(kw) => match kw.as_slice() {
                b"null" => Ok(PDFObject::Null),
                b"[" => self.parse_array(depth + 1),
                b"<<" => self.parse_dict(depth + 1).map(PDFObject::Dict),
                _ => Err(PdfError::TokenError {
                    pos,
                    msg: format!("unexpected keyword: {}", String::from_utf8_lossy(&kw)),
                }),
            },
        }
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > MAX_NESTING {
            return Err(PdfError::SyntaxError(format!(
                "nesting deeper than {MAX_NESTING} at {}",
                self.tell()
            )));
        }
        Ok(())
    }

    /// Parse array contents until ]
    fn parse_array(&mut self, depth: usize) -> Result<PDFObject> {
        self.check_depth(depth)?;
        let mut arr = Vec::new();

        loop {
            let (pos, token) = self.next_positioned()?.ok_or(PdfError::UnexpectedEof)?;
            if token.is_keyword(b"]") {
                break;
            }
            arr.push(self.token_to_object(pos, token, depth)?);
        }

        Ok(PDFObject::Array(arr))
    }

    /// Parse dict contents until >>
    fn parse_dict(&mut self, depth: usize) -> Result<PDFDict> {
        self.check_depth(depth)?;
        let mut dict = PDFDict::new();

        loop {
            let (pos, token) = self.next_positioned()?.ok_or(PdfError::UnexpectedEof)?;
            if token.is_keyword(b">>") {
                break;
            }

            // Key must be a literal name
            let key = match token {
                PSToken::Literal(name) => name,
                _ => {
                    return Err(PdfError::TokenError {
                        pos,
                        msg: "expected name as dict key".into(),
                    });
                }
            };

            let value = self.parse_nested(depth)?;
            // A null value is equivalent to an absent key.
            if !value.is_null() {
                dict.insert(key, value);
            }
        }

        Ok(dict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_references_inside_arrays() {
        let mut parser = PDFParser::new(b"[1 0 R 2 5 3 0 R]");
        let arr = parser.parse_object().unwrap();
        assert_eq!(
            arr,
            PDFObject::Array(vec![
                PDFObject::reference(1),
                PDFObject::Int(2),
                PDFObject::Int(5),
                PDFObject::reference(3),
            ])
        );
    }

    #[test]
    fn dict_keeps_key_order_and_drops_nulls() {
        let mut parser = PDFParser::new(b"<</Type /Catalog /Gone null /Pages 2 0 R>>");
        let obj = parser.parse_object().unwrap();
        let dict = obj.as_dict().unwrap();
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["Type", "Pages"]);
    }

    #[test]
    fn object_header() {
        let mut parser = PDFParser::new(b"12 0 obj <<>> endobj");
        assert_eq!(parser.parse_object_header().unwrap(), (12, 0));
        assert!(parser.parse_object().unwrap().as_dict().unwrap().is_empty());
        assert!(parser.next_token().unwrap().unwrap().is_keyword(b"endobj"));
    }

    #[test]
    fn tell_accounts_for_lookahead() {
        let mut parser = PDFParser::new(b"5 6 stream");
        assert_eq!(parser.parse_object().unwrap(), PDFObject::Int(5));
        assert_eq!(parser.tell(), 2);
    }

    #[test]
    fn runaway_nesting_is_rejected() {
        let data = "[".repeat(MAX_NESTING + 10);
        let mut parser = PDFParser::new(data.as_bytes());
        assert!(matches!(
            parser.parse_object(),
            Err(PdfError::SyntaxError(_))
        ));
    }
}
