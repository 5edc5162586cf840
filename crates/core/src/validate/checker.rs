//! Conformance checker seam and the built-in structural checker.

use crate::document::PDFDocument;
use crate::error::PdfError;
use crate::graph::{DEFAULT_MAX_DEPTH, WalkControl, embedded_files_root, name_tree_entries, resolve_with, walk};
use crate::intent::IccHeader;
use crate::metadata::xmp::{PDFA_CONFORMANCE, PDFA_PART};
use crate::metadata::{XmpSummary, info_text, parse_packet};
use crate::model::{PDFDict, PDFObject};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Annotation flag bits (PDF 32000-1, table 165).
const ANNOT_INVISIBLE: i64 = 1;
const ANNOT_HIDDEN: i64 = 1 << 1;
const ANNOT_PRINT: i64 = 1 << 2;
const ANNOT_NOVIEW: i64 = 1 << 5;

/// Profile a document is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConformanceProfile {
    #[serde(rename = "PDF/A-3B")]
    PdfA3B,
}

impl fmt::Display for ConformanceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PdfA3B => f.write_str("PDF/A-3B"),
        }
    }
}

/// One conformance failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrictError {
    pub code: String,
    pub message: String,
    /// 1-based page number for page-level failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl StrictError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            page: None,
        }
    }

    pub fn on_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

impl fmt::Display for StrictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.code, self.message)?;
        if let Some(page) = self.page {
            write!(f, " (page={page})")?;
        }
        Ok(())
    }
}

/// Failures found by a checker, in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerReport {
    pub errors: Vec<StrictError>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckerError {
    /// The bytes are not a readable PDF.
    #[error("{0}")]
    Syntax(String),
    /// The checker could not run.
    #[error("checker unavailable: {0}")]
    Unavailable(String),
}

/// A conformance checker that can be swapped in for the built-in one.
pub trait ConformanceChecker: Send + Sync {
    fn validate(&self, bytes: &[u8], profile: ConformanceProfile) -> Result<CheckerReport, CheckerError>;
}

/// Checks the document structure that PDF/A-3B places requirements on.
///
/// Content streams, fonts and colour usage on pages are not inspected.
#[derive(Debug, Clone, Copy)]
pub struct StructuralConformanceChecker {
    max_depth: usize,
}

impl Default for StructuralConformanceChecker {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl StructuralConformanceChecker {
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

impl ConformanceChecker for StructuralConformanceChecker {
    fn validate(&self, bytes: &[u8], profile: ConformanceProfile) -> Result<CheckerReport, CheckerError> {
        let doc = match PDFDocument::new(bytes) {
            Ok(doc) => doc,
            Err(PdfError::EncryptionError(_)) => {
                return Ok(CheckerReport {
                    errors: vec![StrictError::new("ENCRYPT", "Encryption is not permitted")],
                });
            }
            Err(e) => return Err(CheckerError::Syntax(e.to_string())),
        };

        let mut checks = Checks {
            doc: &doc,
            max_depth: self.max_depth,
            errors: Vec::new(),
        };
        checks.header(bytes);
        checks.trailer();
        checks.output_intents();
        if let Some(xmp) = checks.metadata() {
            checks.info_consistency(&xmp);
        }
        checks.associated_files();
        checks.embedded_files();
        checks.scan_objects();
        checks.pages();

        tracing::debug!(%profile, errors = checks.errors.len(), "structural conformance check finished");
        Ok(CheckerReport { errors: checks.errors })
    }
}

struct Checks<'d> {
    doc: &'d PDFDocument,
    max_depth: usize,
    errors: Vec<StrictError>,
}

fn is_name(obj: Option<&PDFObject>, name: &str) -> bool {
    matches!(obj, Some(PDFObject::Name(n)) if n == name)
}

fn is_lzw(name: &str) -> bool {
    name == "LZWDecode" || name == "LZW"
}

fn uses_lzw(doc: &PDFDocument, filter: &PDFObject) -> bool {
    match resolve_with(doc, filter).as_deref() {
        Some(PDFObject::Name(n)) => is_lzw(n),
        Some(PDFObject::Array(items)) => items
            .iter()
            .any(|item| matches!(resolve_with(doc, item).as_deref(), Some(PDFObject::Name(n)) if is_lzw(n))),
        _ => false,
    }
}

impl Checks<'_> {
    fn fail(&mut self, code: &str, message: impl Into<String>) {
        self.errors.push(StrictError::new(code, message));
    }

    /// Resolve through the document; null and missing objects are `None`.
    fn resolve(&self, obj: &PDFObject) -> Option<PDFObject> {
        match self.doc.resolve(obj) {
            Ok(PDFObject::Null) | Err(_) => None,
            Ok(obj) => Some(obj),
        }
    }

    fn catalog_entry(&self, key: &str) -> Option<PDFObject> {
        self.resolve(self.doc.catalog().get(key)?)
    }

    fn catalog_root(&self) -> PDFObject {
        self.doc
            .catalog_ref()
            .map_or_else(|| PDFObject::Dict(self.doc.catalog().clone()), PDFObject::Ref)
    }

    fn header(&mut self, bytes: &[u8]) {
        if !bytes.starts_with(b"%PDF-") {
            self.fail("HEADER", "File header must start at byte 0");
        } else if !matches!(self.doc.header_version(), Some((1, _))) {
            self.fail("HEADER", "File header must declare a PDF 1.x version");
        }

        let is_eol = |b: &u8| *b == b'\r' || *b == b'\n';
        let second_line = bytes.iter().position(is_eol).map(|eol| {
            let rest = &bytes[eol..];
            &rest[rest.iter().take_while(|b| is_eol(*b)).count()..]
        });
        let binary = second_line.is_some_and(|line| {
            line.first() == Some(&b'%') && line.get(1..5).is_some_and(|marker| marker.iter().all(|&b| b > 127))
        });
        if !binary {
            self.fail(
                "HEADER_BINARY",
                "Header must be followed by a comment of at least four bytes above 127",
            );
        }
    }

    fn trailer(&mut self) {
        let id = self
            .doc
            .trailer()
            .and_then(|t| t.get("ID"))
            .and_then(|id| self.resolve(id));
        let valid = matches!(&id, Some(PDFObject::Array(items))
            if items.len() == 2 && items.iter().all(|i| matches!(i, PDFObject::String(_))));
        if !valid {
            self.fail("TRAILER_ID", "Trailer must contain an /ID array of two strings");
        }
    }

    fn output_intents(&mut self) {
        let intents = match self.catalog_entry("OutputIntents") {
            Some(PDFObject::Array(items)) if !items.is_empty() => items,
            _ => {
                self.fail("OUTPUT_INTENT", "Catalog has no /OutputIntents");
                return;
            }
        };
        let intent = intents
            .iter()
            .filter_map(|i| self.resolve(i))
            .find(|i| i.as_dict().is_ok_and(|d| is_name(d.get("S"), "GTS_PDFA1")));
        let Some(PDFObject::Dict(intent)) = intent else {
            self.fail("OUTPUT_INTENT_SUBTYPE", "No output intent with /S /GTS_PDFA1");
            return;
        };
        let profile = intent.get("DestOutputProfile").and_then(|p| self.resolve(p));
        let Some(PDFObject::Stream(profile)) = profile else {
            self.fail("OUTPUT_INTENT_PROFILE", "/DestOutputProfile is not a stream");
            return;
        };

        let declared = match profile.get("N") {
            Some(PDFObject::Int(n)) => Some(*n),
            _ => None,
        };
        match self.doc.decode_stream(&profile) {
            Ok(data) => match IccHeader::parse(&data) {
                Some(header) => {
                    if let (Some(n), Some(expected)) = (declared, header.components())
                        && n != i64::from(expected)
                    {
                        self.fail(
                            "OUTPUT_INTENT_PROFILE",
                            format!("/DestOutputProfile declares /N {n} but the profile has {expected} components"),
                        );
                    }
                }
                None => self.fail("OUTPUT_INTENT_PROFILE", "/DestOutputProfile is not an ICC profile"),
            },
            Err(e) => self.fail(
                "OUTPUT_INTENT_PROFILE",
                format!("/DestOutputProfile cannot be decoded: {e}"),
            ),
        }
    }

    fn metadata(&mut self) -> Option<XmpSummary> {
        let Some(PDFObject::Stream(stream)) = self.catalog_entry("Metadata") else {
            self.fail("METADATA", "Catalog /Metadata is missing or not a stream");
            return None;
        };
        if !is_name(stream.get("Type"), "Metadata") || !is_name(stream.get("Subtype"), "XML") {
            self.fail("METADATA_TYPE", "Metadata stream must have /Type /Metadata and /Subtype /XML");
        }
        if stream.has_filters() {
            self.fail("METADATA_FILTER", "Metadata stream must not be filtered");
        }

        let xmp = self
            .doc
            .decode_stream(&stream)
            .map_err(|e| e.to_string())
            .and_then(|data| parse_packet(&data).map_err(|e| e.to_string()));
        let xmp = match xmp {
            Ok(xmp) => xmp,
            Err(reason) => {
                self.fail("XMP_SYNTAX", format!("XMP packet cannot be read: {reason}"));
                return None;
            }
        };
        if xmp.part.as_deref() != Some(PDFA_PART) {
            self.fail("PDFAID_PART", format!("pdfaid:part must be {PDFA_PART}, found {:?}", xmp.part));
        }
        if xmp.conformance.as_deref() != Some(PDFA_CONFORMANCE) {
            self.fail(
                "PDFAID_CONFORMANCE",
                format!("pdfaid:conformance must be {PDFA_CONFORMANCE}, found {:?}", xmp.conformance),
            );
        }
        Some(xmp)
    }

    fn info_consistency(&mut self, xmp: &XmpSummary) {
        let Some(info) = self.doc.info() else {
            return;
        };
        let info: PDFDict = info
            .iter()
            .filter_map(|(k, v)| Some((k.clone(), self.resolve(v)?)))
            .collect();
        // Author maps to a dc:creator sequence of exactly one entry
        let creator = match xmp.creators.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        };
        let pairs = [
            ("Title", "dc:title", xmp.title.as_deref()),
            ("Author", "dc:creator", creator),
            ("Creator", "xmp:CreatorTool", xmp.creator_tool.as_deref()),
            ("Producer", "pdf:Producer", xmp.producer.as_deref()),
        ];
        for (key, property, in_xmp) in pairs {
            if let Some(value) = info_text(&info, key)
                && in_xmp != Some(value.as_str())
            {
                self.fail(
                    "INFO_XMP_MISMATCH",
                    format!("Info /{key} {value:?} does not match XMP {property} {in_xmp:?}"),
                );
            }
        }
    }

    fn associated_files(&mut self) {
        let af = match self.catalog_entry("AF") {
            Some(PDFObject::Array(items)) => items,
            _ => {
                self.fail("AF_MISSING", "Catalog has no /AF array");
                return;
            }
        };
        if af.is_empty() {
            self.fail("AF_EMPTY", "Catalog /AF array is empty");
        }
        for (i, entry) in af.iter().enumerate() {
            if !self.resolve(entry).is_some_and(|e| e.has_type("Filespec")) {
                self.fail("AF_ENTRY", format!("/AF entry {i} is not a file specification"));
            }
        }
    }

    fn embedded_files(&mut self) {
        let doc = self.doc;
        let Some(root) = embedded_files_root(doc, &self.catalog_root()) else {
            return;
        };
        for (name, spec) in name_tree_entries(doc, &root, self.max_depth) {
            let spec = match self.resolve(&spec) {
                Some(PDFObject::Dict(spec)) => spec,
                _ => {
                    self.fail("FILESPEC", format!("{name}: file specification is not a dictionary"));
                    continue;
                }
            };
            for key in ["F", "UF"] {
                if !spec.contains_key(key) {
                    self.fail("FILESPEC_NAMES", format!("{name}: file specification lacks /{key}"));
                }
            }
            if !matches!(spec.get("AFRelationship"), Some(PDFObject::Name(_))) {
                self.fail("FILESPEC_RELATIONSHIP", format!("{name}: file specification lacks /AFRelationship"));
            }
            let stream = spec
                .get("EF")
                .and_then(|ef| self.resolve(ef))
                .and_then(|ef| ef.as_dict().ok()?.get("F").cloned())
                .and_then(|f| self.resolve(&f));
            match stream {
                Some(PDFObject::Stream(stream)) => {
                    if !matches!(stream.get("Subtype"), Some(PDFObject::Name(_))) {
                        self.fail("EMBEDDED_FILE_SUBTYPE", format!("{name}: embedded file has no /Subtype"));
                    }
                }
                _ => self.fail("FILESPEC_EF", format!("{name}: /EF /F is not a stream")),
            }
        }
    }

    /// Stray `/EmbeddedFile` keys and LZW filters anywhere under the catalog.
    fn scan_objects(&mut self) {
        let doc = self.doc;
        let mut stray = Vec::new();
        let mut lzw = Vec::new();
        let report = walk(doc, &self.catalog_root(), "Catalog", self.max_depth, |v| {
            if let Ok(dict) = v.node.as_dict() {
                if dict.contains_key("EmbeddedFile") {
                    stray.push(v.path.to_string());
                }
                if dict.get("Filter").is_some_and(|f| uses_lzw(doc, f)) {
                    lzw.push(v.path.to_string());
                }
            }
            WalkControl::Descend
        });
        for path in stray {
            self.fail("EMBEDDEDFILE_KEY", format!("Singular /EmbeddedFile key at {path}/EmbeddedFile"));
        }
        for path in lzw {
            self.fail("LZW_FILTER", format!("LZWDecode filter at {path}"));
        }
        for path in &report.truncated {
            tracing::warn!(path = %path, "conformance scan stopped at depth limit");
        }
    }

    fn pages(&mut self) {
        let doc = self.doc;
        for (index, page) in doc.page_tree().pages.iter().enumerate() {
            let number = index as u32 + 1;
            if page.mediabox(doc).is_none() {
                self.errors
                    .push(StrictError::new("PAGE_MEDIABOX", "Page has no valid /MediaBox").on_page(number));
            }
            let Some(PDFObject::Array(annots)) = page.attrs.get("Annots").and_then(|a| self.resolve(a)) else {
                continue;
            };
            for annot in &annots {
                let Some(PDFObject::Dict(annot)) = self.resolve(annot) else {
                    continue;
                };
                let subtype = match annot.get("Subtype") {
                    Some(PDFObject::Name(s)) => s.as_str(),
                    _ => "Unknown",
                };
                if subtype == "Popup" {
                    continue;
                }
                let flags = match annot.get("F").and_then(|f| self.resolve(f)) {
                    Some(PDFObject::Int(flags)) => flags,
                    _ => 0,
                };
                if flags & ANNOT_PRINT == 0 {
                    self.errors.push(
                        StrictError::new("ANNOT_FLAGS", format!("{subtype} annotation lacks the Print flag"))
                            .on_page(number),
                    );
                }
                if flags & (ANNOT_HIDDEN | ANNOT_INVISIBLE | ANNOT_NOVIEW) != 0 {
                    self.errors.push(
                        StrictError::new(
                            "ANNOT_FLAGS",
                            format!("{subtype} annotation is hidden, invisible or not viewable"),
                        )
                        .on_page(number),
                    );
                }
            }
        }
    }
}
