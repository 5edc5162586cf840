//! PDF syntax parsing.
//!
//! - `lexer` - byte-level tokenizer
//! - `pdf_parser` - builds [`PDFObject`](crate::model::PDFObject)s from tokens

pub mod lexer;
pub mod pdf_parser;

pub use lexer::{PSBaseParser, PSToken};
pub use pdf_parser::PDFParser;
