//! Metadata synchronization.
//!
//! The document information dictionary and the XMP packet are written from
//! the same [`DocumentInfo`] and stamped with the same instant.
//!
//! - `info` - the `/Info` dictionary
//! - `xmp` - XMP packet writing and reading

pub mod info;
pub mod xmp;

pub use info::{info_text, write_info};
pub use xmp::{XmpSummary, build_packet, parse_packet};

use crate::config::DocumentConfig;
use crate::error::PackResult;
use crate::graph::ObjectGraph;
use crate::model::{PDFObjRef, PDFObject, PDFStream, dict};
use chrono::{DateTime, SubsecRound, Utc};

/// Descriptive fields shared by `/Info` and XMP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub title: String,
    pub author: String,
    pub producer: String,
    pub creator_tool: String,
}

impl DocumentInfo {
    /// Caller-supplied title and author, with blanks replaced by the
    /// configured defaults.
    pub fn resolve(title: Option<&str>, author: Option<&str>, config: &DocumentConfig) -> Self {
        let pick = |value: Option<&str>, fallback: &str| match value {
            Some(v) if !v.trim().is_empty() => v.to_string(),
            _ => fallback.to_string(),
        };
        Self {
            title: pick(title, &config.title),
            author: pick(author, &config.author),
            producer: config.producer.clone(),
            creator_tool: config.creator_tool.clone(),
        }
    }
}

impl Default for DocumentInfo {
    fn default() -> Self {
        Self::resolve(None, None, &DocumentConfig::default())
    }
}

/// Current time in UTC, truncated to whole seconds.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// PDF date string, e.g. `D:20240102030405+00'00'`.
pub fn pdf_date(instant: &DateTime<Utc>) -> String {
    instant.format("D:%Y%m%d%H%M%S+00'00'").to_string()
}

/// XMP date, e.g. `2024-01-02T03:04:05Z`.
pub fn xmp_date(instant: &DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Write `/Info` and an XMP packet for `info`, both stamped with
/// `instant`, and point the catalog `/Metadata` at the packet.
///
/// The packet is re-read before it is stored; nothing is inserted when
/// writing or re-reading fails.
pub fn synchronize(
    graph: &mut ObjectGraph,
    info: &DocumentInfo,
    instant: &DateTime<Utc>,
) -> PackResult<PDFObjRef> {
    let packet = build_packet(info, instant)?;
    parse_packet(&packet)?;

    write_info(graph, info, instant)?;
    let stream = PDFStream::new(
        dict([
            ("Type", PDFObject::name("Metadata")),
            ("Subtype", PDFObject::name("XML")),
        ]),
        packet,
    );
    let metadata = graph.add_object(PDFObject::from(stream));
    graph
        .catalog_mut()?
        .insert("Metadata".into(), PDFObject::Ref(metadata));
    tracing::debug!(objid = metadata.objid, "metadata synchronized");
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn blank_fields_take_defaults() {
        let config = DocumentConfig::default();
        let info = DocumentInfo::resolve(Some(" "), Some("ACME"), &config);
        assert_eq!(info.title, "PDF/A-3 with UBL");
        assert_eq!(info.author, "ACME");
        assert_eq!(info.producer, config.producer);
    }

    #[test]
    fn date_formats() {
        let when = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(pdf_date(&when), "D:20240102030405+00'00'");
        assert_eq!(xmp_date(&when), "2024-01-02T03:04:05Z");
    }

    #[test]
    fn synchronize_links_catalog_to_stream() {
        let mut graph = ObjectGraph::new();
        let when = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let metadata = synchronize(&mut graph, &DocumentInfo::default(), &when).unwrap();

        assert_eq!(graph.catalog().unwrap()["Metadata"], PDFObject::Ref(metadata));
        let stream = graph.get(metadata.objid).unwrap().as_stream().unwrap();
        assert!(!stream.has_filters());
        assert_eq!(stream.get("Subtype"), Some(&PDFObject::name("XML")));

        let info = graph.info().unwrap();
        assert_eq!(info["CreationDate"], info["ModDate"]);
        assert_eq!(info["ModDate"], PDFObject::string("D:20240102030405+00'00'"));
        let xmp = parse_packet(stream.get_rawdata()).unwrap();
        assert_eq!(xmp.create_date.as_deref(), Some("2024-01-02T03:04:05Z"));
    }
}
