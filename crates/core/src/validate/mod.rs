//! PDF/A-3B validation.
//!
//! - `checker` - the [`ConformanceChecker`] seam and the built-in checker
//! - `timeout` - bounded execution of a checker on a worker thread
//!
//! The heuristic check only looks at the catalog and never fails. The
//! strict check delegates to a [`ConformanceChecker`] and reports every
//! failure it finds.

pub mod checker;
pub mod timeout;

pub use checker::{
    CheckerError, CheckerReport, ConformanceChecker, ConformanceProfile, StrictError,
    StructuralConformanceChecker,
};
pub use timeout::{TimeoutError, run_with_timeout};

use crate::document::PDFDocument;
use crate::error::{PackError, PackResult};
use crate::model::PDFObject;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of [`validate_heuristic`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeuristicResult {
    pub valid: bool,
    pub details: String,
}

/// Outcome of [`validate_strict`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrictResult {
    pub valid: bool,
    pub errors: Vec<StrictError>,
}

impl StrictResult {
    fn from_errors(errors: Vec<StrictError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Check for an output intent, an XMP stream and a non-empty `/AF`.
pub fn validate_heuristic(bytes: &[u8]) -> HeuristicResult {
    let doc = match PDFDocument::new(bytes) {
        Ok(doc) => doc,
        Err(e) => {
            return HeuristicResult {
                valid: false,
                details: format!("unreadable: {e}"),
            };
        }
    };
    let entry = |key: &str| {
        doc.catalog()
            .get(key)
            .and_then(|obj| doc.resolve(obj).ok())
            .filter(|obj| !obj.is_null())
    };
    let non_empty = |obj: Option<PDFObject>| obj.is_some_and(|o| o.as_array().is_ok_and(|a| !a.is_empty()));

    let has_output_intent = non_empty(entry("OutputIntents"));
    let has_xmp = entry("Metadata").is_some();
    let has_af = non_empty(entry("AF"));
    HeuristicResult {
        valid: has_output_intent && has_xmp && has_af,
        details: format!("outputIntent={has_output_intent}, xmp={has_xmp}, af={has_af}"),
    }
}

/// Strict validation with the built-in checker and no time limit.
pub fn validate_strict(bytes: &[u8]) -> PackResult<StrictResult> {
    validate_strict_with(bytes, Arc::new(StructuralConformanceChecker::default()), None)
}

/// Strict validation with `checker`, optionally bounded by `limit`.
///
/// A checker that times out or reports itself unavailable is an
/// [`PackError::UpstreamUnavailable`]; input it cannot read becomes a
/// single `SYNTAX` error.
pub fn validate_strict_with(
    bytes: &[u8],
    checker: Arc<dyn ConformanceChecker>,
    limit: Option<Duration>,
) -> PackResult<StrictResult> {
    let profile = ConformanceProfile::PdfA3B;
    let outcome = match limit {
        None => checker.validate(bytes, profile),
        Some(limit) => {
            let data: Arc<[u8]> = Arc::from(bytes);
            run_with_timeout(limit, move || checker.validate(&data, profile))
                .map_err(|e| PackError::UpstreamUnavailable(format!("conformance checker: {e}")))?
        }
    };

    match outcome {
        Ok(report) => {
            tracing::debug!(errors = report.errors.len(), "strict validation finished");
            Ok(StrictResult::from_errors(report.errors))
        }
        Err(CheckerError::Syntax(reason)) => Ok(StrictResult::from_errors(vec![StrictError::new(
            "SYNTAX",
            format!("Not a valid PDF: {reason}"),
        )])),
        Err(CheckerError::Unavailable(reason)) => Err(PackError::UpstreamUnavailable(reason)),
    }
}
