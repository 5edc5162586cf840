//! Error types for pdfa3pack.
//!
//! Two layers: [`PdfError`] for reading and parsing PDF bytes, and
//! [`PackError`] for the packaging pipeline and the validators.

use thiserror::Error;

/// Low-level error raised while tokenizing, parsing or decoding PDF data.
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("invalid token at position {pos}: {msg}")]
    TokenError { pos: usize, msg: String },

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("type error: expected {expected}, got {got}")]
    TypeError {
        expected: &'static str,
        got: &'static str,
    },

    #[error("key not found: {0}")]
    KeyError(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF object not found: {0}")]
    ObjectNotFound(u32),

    #[error("no valid xref table found")]
    NoValidXRef,

    #[error("PDF syntax error: {0}")]
    SyntaxError(String),

    #[error("decode error: {0}")]
    DecodeError(String),

    #[error("encryption error: {0}")]
    EncryptionError(String),
}

/// Convenience Result type alias for PdfError.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Which pre-serialization invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantKind {
    /// Catalog has no `/AF` array.
    AssociatedFilesMissing,
    /// Catalog `/AF` is an empty array.
    AssociatedFilesEmpty,
    /// First `/AF` entry resolves to null.
    AssociatedFilesNullEntry,
    /// The named embedded-files leaf has no live `/EF /F` stream.
    EmbeddedStreamNull { name: String },
    /// Catalog `/Metadata` does not resolve to a stream.
    MetadataNotStream,
    /// A reference points at a missing or null slot.
    DanglingReference { objid: u32 },
}

impl std::fmt::Display for InvariantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AssociatedFilesMissing => write!(f, "AF missing"),
            Self::AssociatedFilesEmpty => write!(f, "AF empty"),
            Self::AssociatedFilesNullEntry => write!(f, "AF first entry is null"),
            Self::EmbeddedStreamNull { name } => write!(f, "EF/F is null for {name:?}"),
            Self::MetadataNotStream => write!(f, "Metadata not set as an indirect stream"),
            Self::DanglingReference { objid } => {
                write!(f, "reference to missing object {objid}")
            }
        }
    }
}

/// Errors surfaced by packaging, validation and introspection requests.
#[derive(Error, Debug)]
pub enum PackError {
    #[error("source document has no pages")]
    EmptySource,

    #[error("embedding failed: {0}")]
    EmbedFailed(String),

    #[error("XMP serialization failed: {0}")]
    MetadataError(String),

    #[error("structural invariant violated: {0}")]
    StructuralInvariantViolated(InvariantKind),

    #[error("not a valid PDF: {0}")]
    Syntax(#[from] PdfError),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PackError {
    /// Short machine-readable code, used by the CLI JSON output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptySource => "EMPTY_SOURCE",
            Self::EmbedFailed(_) => "EMBED_FAILED",
            Self::MetadataError(_) => "METADATA_ERROR",
            Self::StructuralInvariantViolated(_) => "STRUCTURAL_INVARIANT_VIOLATED",
            Self::Syntax(_) => "SYNTAX",
            Self::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            Self::Config(_) => "CONFIG",
            Self::Io(_) => "IO",
        }
    }
}

/// Result alias for the packaging layer.
pub type PackResult<T> = std::result::Result<T, PackError>;
