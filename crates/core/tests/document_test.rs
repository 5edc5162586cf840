//! Reading source documents.

mod common;

use common::build_minimal_pdf_with_pages;
use pdfa3pack_core::document::PDFDocument;
use pdfa3pack_core::error::PdfError;
use pdfa3pack_core::graph::ObjectGraph;
use pdfa3pack_core::model::PDFObject;

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_shared_types_are_send_and_sync() {
    assert_send_sync::<PDFDocument>();
    assert_send_sync::<ObjectGraph>();
    assert_send_sync::<pdfa3pack_core::Packager>();
}

#[test]
fn test_get_zero_objid_is_not_found() {
    let doc = PDFDocument::new(build_minimal_pdf_with_pages(1)).unwrap();
    assert!(matches!(doc.getobj(0), Err(PdfError::ObjectNotFound(0))));
}

#[test]
fn test_pages_and_contents_resolve() {
    let doc = PDFDocument::new(build_minimal_pdf_with_pages(4)).unwrap();
    assert_eq!(doc.page_count(), 4);
    assert_eq!(doc.header_version(), Some((1, 4)));
    let page = &doc.page_tree().pages[2];
    assert_eq!(page.mediabox(&doc), Some([0.0, 0.0, 200.0, 200.0]));
    let contents = doc.resolve(&page.attrs["Contents"]).unwrap();
    assert!(matches!(contents, PDFObject::Stream(_)));
}

#[test]
fn test_truncated_file_still_reads_by_scanning() {
    let mut pdf = build_minimal_pdf_with_pages(2);
    let xref = pdf.windows(5).position(|w| w == b"xref\n").unwrap();
    pdf.truncate(xref);
    pdf.extend_from_slice(b"trailer\n<< /Root 1 0 R >>\n%%EOF");
    let doc = PDFDocument::new(&pdf).unwrap();
    assert_eq!(doc.page_count(), 2);
}
