//! PDF Document module - reading existing documents.
//!
//! This module contains:
//! - `catalog` - xref tables, object resolution (PDFDocument)
//! - `page` - page tree traversal with inherited attributes (PDFPage)
//! - `repair` - page box normalization

pub mod catalog;
pub mod page;
pub mod repair;

pub use catalog::PDFDocument;
pub use page::{PDFPage, PageTree, parse_box};
pub use repair::{normalize_box, normalize_page_boxes};
