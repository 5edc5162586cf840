//! Public API for packaging and validation.
//!
//! # Example
//!
//! ```ignore
//! use pdfa3pack_core::api::{package, validate_heuristic};
//!
//! let source = std::fs::read("blank.pdf")?;
//! let invoice = std::fs::read("invoice.xml")?;
//! let pdf = package(&source, &invoice, "invoice.xml")?;
//! assert!(validate_heuristic(&pdf).valid);
//! ```

pub mod builder;
pub mod high_level;

pub use builder::{PackOutput, PackReport, Packager};
pub use high_level::{
    AttachmentInfo, HeuristicResult, StrictResult, dump_structure, list_attachments, package,
    validate_heuristic, validate_strict,
};
