//! Heuristic and strict validation of packaged and damaged documents.

mod common;

use common::{INVOICE, build_minimal_pdf_with_pages, replace_once_fixed_len};
use pdfa3pack_core::validate::{
    CheckerError, CheckerReport, ConformanceChecker, ConformanceProfile, StrictError,
};
use pdfa3pack_core::{PackError, Packager, package, validate_heuristic, validate_strict};
use std::sync::Arc;
use std::time::Duration;

fn packaged() -> Vec<u8> {
    package(&build_minimal_pdf_with_pages(1), INVOICE, "invoice.xml").unwrap()
}

struct SlowChecker;

impl ConformanceChecker for SlowChecker {
    fn validate(&self, _: &[u8], _: ConformanceProfile) -> Result<CheckerReport, CheckerError> {
        std::thread::sleep(Duration::from_millis(500));
        Ok(CheckerReport::default())
    }
}

struct FixedChecker(Vec<StrictError>);

impl ConformanceChecker for FixedChecker {
    fn validate(&self, _: &[u8], profile: ConformanceProfile) -> Result<CheckerReport, CheckerError> {
        assert_eq!(profile, ConformanceProfile::PdfA3B);
        Ok(CheckerReport { errors: self.0.clone() })
    }
}

#[test]
fn test_heuristic_valid_on_packaged_output() {
    let result = validate_heuristic(&packaged());
    assert!(result.valid, "{}", result.details);
    assert_eq!(result.details, "outputIntent=true, xmp=true, af=true");
}

#[test]
fn test_heuristic_invalid_without_output_intent() {
    let damaged = replace_once_fixed_len(&packaged(), b"/OutputIntents", b"/OutputIntentX");
    let result = validate_heuristic(&damaged);
    assert!(!result.valid);
    assert_eq!(result.details, "outputIntent=false, xmp=true, af=true");
}

#[test]
fn test_heuristic_on_plain_pdf() {
    let result = validate_heuristic(&build_minimal_pdf_with_pages(1));
    assert!(!result.valid);
    assert_eq!(result.details, "outputIntent=false, xmp=false, af=false");
}

#[test]
fn test_strict_reports_no_errors_for_packaged_output() {
    let result = validate_strict(&packaged()).unwrap();
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert!(result.valid);
}

#[test]
fn test_strict_reports_missing_output_intent() {
    let damaged = replace_once_fixed_len(&packaged(), b"/OutputIntents", b"/OutputIntentX");
    let result = validate_strict(&damaged).unwrap();
    assert!(!result.valid);
    let codes: Vec<&str> = result.errors.iter().map(|e| e.code.as_str()).collect();
    assert_eq!(codes, ["OUTPUT_INTENT"]);
}

#[test]
fn test_strict_reports_wrong_conformance_level() {
    let damaged = replace_once_fixed_len(
        &packaged(),
        b"<pdfaid:conformance>B</pdfaid:conformance>",
        b"<pdfaid:conformance>A</pdfaid:conformance>",
    );
    let result = validate_strict(&damaged).unwrap();
    let codes: Vec<&str> = result.errors.iter().map(|e| e.code.as_str()).collect();
    assert_eq!(codes, ["PDFAID_CONFORMANCE"]);
}

#[test]
fn test_strict_garbage_is_single_syntax_error() {
    let result = validate_strict(b"this is not a PDF").unwrap();
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code, "SYNTAX");
    assert!(result.errors[0].message.starts_with("Not a valid PDF: "));
    assert_eq!(result.errors[0].page, None);
}

#[test]
fn test_slow_checker_is_upstream_unavailable() {
    let packager = Packager::new()
        .with_checker(Arc::new(SlowChecker))
        .strict_timeout(Some(Duration::from_millis(20)));
    let err = packager.validate_strict(&packaged()).unwrap_err();
    assert!(matches!(err, PackError::UpstreamUnavailable(_)), "got {err:?}");
}

#[test]
fn test_injected_checker_errors_are_kept_in_order() {
    let errors = vec![
        StrictError::new("B", "second rule"),
        StrictError::new("A", "first rule").on_page(1),
    ];
    let packager = Packager::new().with_checker(Arc::new(FixedChecker(errors.clone())));
    let result = packager.validate_strict(&packaged()).unwrap();
    assert!(!result.valid);
    assert_eq!(result.errors, errors);
}

#[test]
fn test_strict_result_serializes_page_only_when_present() {
    let result = validate_strict(b"this is not a PDF").unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["valid"], false);
    assert_eq!(json["errors"][0]["code"], "SYNTAX");
    assert!(json["errors"][0].get("page").is_none());

    let on_page = serde_json::to_value(StrictError::new("ANNOT_FLAGS", "hidden").on_page(2)).unwrap();
    assert_eq!(on_page["page"], 2);
    assert_eq!(serde_json::to_value(ConformanceProfile::PdfA3B).unwrap(), "PDF/A-3B");
}

#[test]
fn test_strict_reports_author_and_creator_tool_drift() {
    let mut config = pdfa3pack_core::config::PackConfig::default();
    config.document.creator_tool = "Invoicer".into();
    let bytes = Packager::new()
        .with_config(config)
        .author("ACME d.o.o.")
        .package(&build_minimal_pdf_with_pages(1), INVOICE, "invoice.xml")
        .unwrap();
    assert!(validate_strict(&bytes).unwrap().valid);

    let damaged = replace_once_fixed_len(&bytes, b"<rdf:li>ACME d.o.o.<", b"<rdf:li>ACME d.o.x.<");
    let damaged = replace_once_fixed_len(
        &damaged,
        b"<xmp:CreatorTool>Invoicer<",
        b"<xmp:CreatorTool>Invoicex<",
    );
    let result = validate_strict(&damaged).unwrap();
    let mismatches: Vec<&str> = result
        .errors
        .iter()
        .filter(|e| e.code == "INFO_XMP_MISMATCH")
        .map(|e| e.message.as_str())
        .collect();
    assert_eq!(mismatches.len(), 2, "{:?}", result.errors);
    assert!(mismatches[0].starts_with("Info /Author"));
    assert!(mismatches[1].starts_with("Info /Creator"));
}
