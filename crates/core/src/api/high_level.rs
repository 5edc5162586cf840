//! One-call entry points with default configuration:
//! - `package()` - package an XML attachment as PDF/A-3B
//! - `validate_heuristic()` / `validate_strict()` - check a document
//! - `list_attachments()` / `dump_structure()` - inspect a document

use super::builder::Packager;
use crate::error::PackResult;

pub use crate::inspect::{AttachmentInfo, dump_structure, list_attachments};
pub use crate::validate::{HeuristicResult, StrictResult, validate_heuristic, validate_strict};

/// Package `attachment` into a PDF/A-3B copy of `source` with the default
/// configuration. See [`Packager`] for the configurable form.
pub fn package(source: &[u8], attachment: &[u8], display_name: &str) -> PackResult<Vec<u8>> {
    Packager::default().package(source, attachment, display_name)
}
