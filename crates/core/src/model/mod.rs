//! PDF model types - objects and text strings.
//!
//! - `objects` - PDF object types (PDFObject, PDFStream, PDFObjRef)
//! - `text` - text string encoding and ASCII-safe file names

pub mod objects;
pub mod text;

// Re-export main types for convenience
pub use objects::{PDFDict, PDFObjRef, PDFObject, PDFStream, dict};
