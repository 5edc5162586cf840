//! pdfa3pack - PDF/A-3B packaging of XML invoices and conformance validation.

pub mod api;
pub mod codec;
pub mod config;
pub mod document;
pub mod embed;
pub mod error;
pub mod graph;
pub mod inspect;
pub mod intent;
pub mod metadata;
pub mod model;
pub mod parser;
pub mod sanity;
pub mod validate;
pub mod writer;

pub use api::{
    AttachmentInfo, HeuristicResult, PackOutput, PackReport, Packager, StrictResult, dump_structure,
    list_attachments, package, validate_heuristic, validate_strict,
};
pub use config::PackConfig;
pub use error::{InvariantKind, PackError, PackResult, PdfError, Result};
