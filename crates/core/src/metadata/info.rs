//! Document information dictionary.

use super::{DocumentInfo, pdf_date};
use crate::error::PackResult;
use crate::graph::ObjectGraph;
use crate::model::text::decode_text_string;
use crate::model::{PDFDict, PDFObject};
use chrono::{DateTime, Utc};

/// Fill the graph's `/Info` dictionary. Existing keys are overwritten.
pub fn write_info(graph: &mut ObjectGraph, info: &DocumentInfo, instant: &DateTime<Utc>) -> PackResult<()> {
    let date = pdf_date(instant);
    let dict = graph.info_mut()?;
    dict.insert("Title".into(), PDFObject::text(&info.title));
    dict.insert("Author".into(), PDFObject::text(&info.author));
    dict.insert("Creator".into(), PDFObject::text(&info.creator_tool));
    dict.insert("Producer".into(), PDFObject::text(&info.producer));
    dict.insert("CreationDate".into(), PDFObject::string(&date));
    dict.insert("ModDate".into(), PDFObject::string(&date));
    Ok(())
}

/// A text string entry of an info dictionary, decoded.
pub fn info_text(dict: &PDFDict, key: &str) -> Option<String> {
    match dict.get(key)? {
        PDFObject::String(s) => Some(decode_text_string(s)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn unicode_author_round_trips() {
        let mut graph = ObjectGraph::new();
        let info = DocumentInfo {
            author: "Preduzeće d.o.o.".into(),
            ..DocumentInfo::default()
        };
        let when = Utc.with_ymd_and_hms(2024, 6, 30, 23, 59, 59).unwrap();
        write_info(&mut graph, &info, &when).unwrap();
        let dict = graph.info().unwrap();
        assert_eq!(info_text(dict, "Author").as_deref(), Some("Preduzeće d.o.o."));
        assert_eq!(info_text(dict, "Title").as_deref(), Some("PDF/A-3 with UBL"));
        assert_eq!(info_text(dict, "Missing"), None);
    }
}
