//! End-to-end packaging tests.
//!
//! Sources are built in-code; outputs are read back with `PDFDocument`.

mod common;

use chrono::{TimeZone, Utc};
use common::{INVOICE, build_minimal_pdf_with_pages, replace_all};
use pdfa3pack_core::config::{AttachmentConfig, PackConfig};
use pdfa3pack_core::document::PDFDocument;
use pdfa3pack_core::embed::{
    AttachmentHandle, AttachmentHelper, AttachmentRequest, EmbedStrategy, HelperUnavailable,
};
use pdfa3pack_core::graph::ObjectGraph;
use pdfa3pack_core::intent::ProfileSource;
use pdfa3pack_core::metadata::{info_text, pdf_date, xmp_date};
use pdfa3pack_core::model::PDFObject;
use pdfa3pack_core::{PackError, Packager, list_attachments, package};
use std::sync::Arc;

struct AlwaysUnavailable;

impl AttachmentHelper for AlwaysUnavailable {
    fn embed(&self, _: &mut ObjectGraph, _: &AttachmentRequest) -> Result<AttachmentHandle, HelperUnavailable> {
        Err(HelperUnavailable("no attachment support".into()))
    }
}

fn embedded_stream(doc: &PDFDocument) -> pdfa3pack_core::model::PDFStream {
    let af = doc.resolve(&doc.catalog()["AF"]).unwrap();
    let af = af.as_array().unwrap();
    assert_eq!(af.len(), 1);
    let spec = doc.resolve(&af[0]).unwrap();
    let ef = doc.resolve(&spec.as_dict().unwrap()["EF"]).unwrap();
    let stream = doc.resolve(&ef.as_dict().unwrap()["F"]).unwrap();
    stream.as_stream().unwrap().clone()
}

#[test]
fn test_single_page_invoice_scenario() {
    let source = build_minimal_pdf_with_pages(1);
    let output = Packager::new()
        .package_with_report(&source, INVOICE, "invoice.xml")
        .unwrap();

    assert_eq!(output.report.page_count, 1);
    assert_eq!(output.report.attachment_size, 37);
    assert_eq!(output.report.strategy, EmbedStrategy::Helper);
    assert_eq!(output.report.profile_source, ProfileSource::BuiltIn);

    let doc = PDFDocument::new(&output.bytes).unwrap();
    assert_eq!(doc.header_version(), Some((1, 7)));
    assert_eq!(doc.page_count(), 1);
    let stream = embedded_stream(&doc);
    assert_eq!(stream.get_rawdata(), INVOICE);
    assert_eq!(stream.get("Subtype"), Some(&PDFObject::name("application/xml")));

    let attachments = list_attachments(&output.bytes).unwrap();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].name, "invoice.xml");
    assert_eq!(attachments[0].size, Some(37));
    assert_eq!(attachments[0].relationship.as_deref(), Some("Data"));
}

#[test]
fn test_free_function_matches_builder() {
    let source = build_minimal_pdf_with_pages(1);
    let bytes = package(&source, INVOICE, "invoice.xml").unwrap();
    let attachments = list_attachments(&bytes).unwrap();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].mime_subtype.as_deref(), Some("application/xml"));
}

#[test]
fn test_zero_pages_is_empty_source() {
    let source = build_minimal_pdf_with_pages(0);
    let err = package(&source, INVOICE, "invoice.xml").unwrap_err();
    assert!(matches!(err, PackError::EmptySource), "got {err:?}");
}

#[test]
fn test_pages_keep_document_order() {
    let source = build_minimal_pdf_with_pages(3);
    let bytes = package(&source, INVOICE, "invoice.xml").unwrap();
    let doc = PDFDocument::new(&bytes).unwrap();
    let pages = doc.page_tree().pages;
    assert_eq!(pages.len(), 3);
    for (i, page) in pages.iter().enumerate() {
        let contents = doc.resolve(&page.attrs["Contents"]).unwrap();
        let data = doc.decode_stream(contents.as_stream().unwrap()).unwrap();
        let expected = format!("({})", i + 1);
        assert!(String::from_utf8_lossy(&data).contains(&expected));
    }
}

#[test]
fn test_helper_fallback_yields_identical_attachment() {
    let source = build_minimal_pdf_with_pages(1);
    let with_helper = Packager::new().package(&source, INVOICE, "invoice.xml").unwrap();

    let fallback = Packager::new()
        .with_helper(Arc::new(AlwaysUnavailable))
        .package_with_report(&source, INVOICE, "invoice.xml")
        .unwrap();
    assert_eq!(fallback.report.strategy, EmbedStrategy::Manual);

    let manual = Packager::new()
        .without_helper()
        .package_with_report(&source, INVOICE, "invoice.xml")
        .unwrap();
    assert_eq!(manual.report.strategy, EmbedStrategy::Manual);

    let expected = list_attachments(&with_helper).unwrap();
    assert_eq!(list_attachments(&fallback.bytes).unwrap(), expected);
    assert_eq!(list_attachments(&manual.bytes).unwrap(), expected);
}

#[test]
fn test_blank_name_uses_default() {
    let source = build_minimal_pdf_with_pages(1);
    let bytes = package(&source, INVOICE, "  ").unwrap();
    let attachments = list_attachments(&bytes).unwrap();
    assert_eq!(attachments[0].name, "invoice.xml");
}

#[test]
fn test_unicode_name_round_trips() {
    let source = build_minimal_pdf_with_pages(1);
    let bytes = package(&source, INVOICE, "račun-č.xml").unwrap();
    let attachments = list_attachments(&bytes).unwrap();
    assert_eq!(attachments[0].name, "račun-č.xml");
}

#[test]
fn test_same_timestamp_is_byte_identical() {
    let source = build_minimal_pdf_with_pages(2);
    let when = Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap();
    let packager = Packager::new().timestamp(when);
    let first = packager.package(&source, INVOICE, "invoice.xml").unwrap();
    let second = packager.package(&source, INVOICE, "invoice.xml").unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_repeat_runs_differ_only_in_timestamps() {
    let source = build_minimal_pdf_with_pages(1);
    let t1 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let t2 = Utc.with_ymd_and_hms(2025, 6, 30, 12, 34, 56).unwrap();
    let first = Packager::new().timestamp(t1).package(&source, INVOICE, "invoice.xml").unwrap();
    let second = Packager::new().timestamp(t2).package(&source, INVOICE, "invoice.xml").unwrap();
    assert_ne!(first, second);

    let restamped = replace_all(&first, pdf_date(&t1).as_bytes(), pdf_date(&t2).as_bytes());
    let restamped = replace_all(&restamped, xmp_date(&t1).as_bytes(), xmp_date(&t2).as_bytes());
    assert_eq!(restamped.len(), second.len());

    // everything before the trailer /ID matches once dates are aligned
    let id_at = |bytes: &[u8]| bytes.windows(4).position(|w| w == b"/ID ").unwrap();
    assert_eq!(id_at(&restamped), id_at(&second));
    assert_eq!(restamped[..id_at(&second)], second[..id_at(&second)]);
}

#[test]
fn test_title_and_author_reach_info_and_xmp() {
    let source = build_minimal_pdf_with_pages(1);
    let bytes = Packager::new()
        .title("Invoice INV-00001")
        .author("ACME d.o.o.")
        .package(&source, INVOICE, "invoice.xml")
        .unwrap();
    let doc = PDFDocument::new(&bytes).unwrap();
    let info = doc.info().unwrap();
    assert_eq!(info_text(info, "Title").as_deref(), Some("Invoice INV-00001"));
    assert_eq!(info_text(info, "Author").as_deref(), Some("ACME d.o.o."));

    let metadata = doc.resolve(&doc.catalog()["Metadata"]).unwrap();
    let packet = doc.decode_stream(metadata.as_stream().unwrap()).unwrap();
    let xmp = pdfa3pack_core::metadata::parse_packet(&packet).unwrap();
    assert_eq!(xmp.title.as_deref(), Some("Invoice INV-00001"));
    assert_eq!(xmp.creators, vec!["ACME d.o.o.".to_string()]);
}

#[test]
fn test_compressed_attachment_keeps_uncompressed_size() {
    let config = PackConfig {
        attachment: AttachmentConfig {
            compress: true,
            ..AttachmentConfig::default()
        },
        ..PackConfig::default()
    };
    let source = build_minimal_pdf_with_pages(1);
    let bytes = Packager::new()
        .with_config(config)
        .package(&source, INVOICE, "invoice.xml")
        .unwrap();
    let doc = PDFDocument::new(&bytes).unwrap();
    let stream = embedded_stream(&doc);
    assert_eq!(stream.get("Filter"), Some(&PDFObject::name("FlateDecode")));
    assert_eq!(doc.decode_stream(&stream).unwrap(), INVOICE);
    assert_eq!(list_attachments(&bytes).unwrap()[0].size, Some(37));
}

#[test]
fn test_required_profile_missing_fails() {
    let mut config = PackConfig::default();
    config.output_intent.require_configured_profile = true;
    let source = build_minimal_pdf_with_pages(1);
    let err = Packager::new()
        .with_config(config)
        .package(&source, INVOICE, "invoice.xml")
        .unwrap_err();
    assert!(matches!(err, PackError::Config(_)), "got {err:?}");
}
