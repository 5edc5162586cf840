//! XMP packet writing and reading.

use super::{DocumentInfo, xmp_date};
use crate::error::{PackError, PackResult};
use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesPI, BytesStart, BytesText, Event};

const PACKET_ID: &str = "W5M0MpCehiHzreSzNTczkc9d";

const NS_X: &str = "adobe:ns:meta/";
const NS_RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
const NS_DC: &str = "http://purl.org/dc/elements/1.1/";
const NS_XMP: &str = "http://ns.adobe.com/xap/1.0/";
const NS_PDF: &str = "http://ns.adobe.com/pdf/1.3/";
const NS_PDFAID: &str = "http://www.aiim.org/pdfa/ns/id/";

/// Whitespace after the packet body so it can be edited in place.
const PADDING_LINES: usize = 20;

/// PDF/A identification written into every packet.
pub const PDFA_PART: &str = "3";
pub const PDFA_CONFORMANCE: &str = "B";

fn xml_err(e: impl std::fmt::Display) -> PackError {
    PackError::MetadataError(e.to_string())
}

struct PacketWriter {
    writer: Writer<Vec<u8>>,
}

impl PacketWriter {
    fn event(&mut self, event: Event<'_>) -> PackResult<()> {
        self.writer.write_event(event).map_err(xml_err)
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> PackResult<()> {
        let mut elem = BytesStart::new(name);
        for attr in attrs {
            elem.push_attribute(*attr);
        }
        self.event(Event::Start(elem))
    }

    fn end(&mut self, name: &str) -> PackResult<()> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn leaf(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> PackResult<()> {
        self.start(name, attrs)?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    /// `rdf:Description` for one schema, with `body` writing its properties.
    fn description<F>(&mut self, prefix: &str, ns: &str, body: F) -> PackResult<()>
    where
        F: FnOnce(&mut Self) -> PackResult<()>,
    {
        let xmlns = format!("xmlns:{prefix}");
        self.start("rdf:Description", &[("rdf:about", ""), (xmlns.as_str(), ns)])?;
        body(self)?;
        self.end("rdf:Description")
    }
}

/// Serialize the XMP packet for `info`.
pub fn build_packet(info: &DocumentInfo, instant: &DateTime<Utc>) -> PackResult<Vec<u8>> {
    let date = xmp_date(instant);
    let mut w = PacketWriter {
        writer: Writer::new_with_indent(Vec::new(), b' ', 1),
    };

    w.event(Event::PI(BytesPI::new(format!(
        "xpacket begin=\"\u{feff}\" id=\"{PACKET_ID}\""
    ))))?;
    w.start("x:xmpmeta", &[("xmlns:x", NS_X)])?;
    w.start("rdf:RDF", &[("xmlns:rdf", NS_RDF)])?;

    w.description("dc", NS_DC, |w| {
        w.start("dc:title", &[])?;
        w.start("rdf:Alt", &[])?;
        w.leaf("rdf:li", &[("xml:lang", "x-default")], &info.title)?;
        w.end("rdf:Alt")?;
        w.end("dc:title")?;
        w.start("dc:creator", &[])?;
        w.start("rdf:Seq", &[])?;
        w.leaf("rdf:li", &[], &info.author)?;
        w.end("rdf:Seq")?;
        w.end("dc:creator")
    })?;
    w.description("pdfaid", NS_PDFAID, |w| {
        w.leaf("pdfaid:part", &[], PDFA_PART)?;
        w.leaf("pdfaid:conformance", &[], PDFA_CONFORMANCE)
    })?;
    w.description("xmp", NS_XMP, |w| {
        w.leaf("xmp:CreateDate", &[], &date)?;
        w.leaf("xmp:ModifyDate", &[], &date)?;
        w.leaf("xmp:MetadataDate", &[], &date)?;
        w.leaf("xmp:CreatorTool", &[], &info.creator_tool)
    })?;
    w.description("pdf", NS_PDF, |w| w.leaf("pdf:Producer", &[], &info.producer))?;

    w.end("rdf:RDF")?;
    w.end("x:xmpmeta")?;

    let out = w.writer.get_mut();
    out.push(b'\n');
    for _ in 0..PADDING_LINES {
        out.extend_from_slice(&[b' '; 99]);
        out.push(b'\n');
    }
    w.event(Event::PI(BytesPI::new("xpacket end=\"w\"")))?;
    Ok(w.writer.into_inner())
}

/// Fields read back from an XMP packet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmpSummary {
    pub part: Option<String>,
    pub conformance: Option<String>,
    pub title: Option<String>,
    pub creators: Vec<String>,
    pub producer: Option<String>,
    pub creator_tool: Option<String>,
    pub create_date: Option<String>,
    pub modify_date: Option<String>,
}

impl XmpSummary {
    fn set(&mut self, property: &str, value: String) {
        match property {
            "part" => self.part = Some(value),
            "conformance" => self.conformance = Some(value),
            "title" => self.title = Some(value),
            "creator" => self.creators.push(value),
            "Producer" => self.producer = Some(value),
            "CreatorTool" => self.creator_tool = Some(value),
            "CreateDate" => self.create_date = Some(value),
            "ModifyDate" => self.modify_date = Some(value),
            _ => {}
        }
    }
}

fn local_name(qname: &[u8]) -> String {
    let local = qname.rsplit(|&b| b == b':').next().unwrap_or(qname);
    String::from_utf8_lossy(local).into_owned()
}

/// Parse an XMP packet. Properties may be written as elements or as
/// attributes of `rdf:Description`; namespace prefixes are ignored.
///
/// Fails with `MetadataError` on malformed XML or when there is no
/// `rdf:RDF` element.
pub fn parse_packet(data: &[u8]) -> PackResult<XmpSummary> {
    let mut reader = Reader::from_reader(data);
    reader.config_mut().trim_text(true);

    let mut summary = XmpSummary::default();
    let mut stack: Vec<String> = Vec::new();
    let mut saw_rdf = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            xml_err(format!("at byte {}: {e}", reader.buffer_position()))
        })?;
        match &event {
            Event::Start(e) | Event::Empty(e) if local_name(e.name().as_ref()) == "Description" => {
                for attr in e.attributes() {
                    let attr = attr.map_err(xml_err)?;
                    let value = attr.unescape_value().map_err(xml_err)?;
                    summary.set(&local_name(attr.key.as_ref()), value.into_owned());
                }
                if matches!(event, Event::Start(_)) {
                    stack.push("Description".into());
                }
            }
            Event::Start(e) => {
                let name = local_name(e.name().as_ref());
                saw_rdf |= name == "RDF";
                stack.push(name);
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(t) => {
                let value = t.unescape().map_err(xml_err)?.into_owned();
                let property = match stack.last().map(String::as_str) {
                    Some("li") => stack.len().checked_sub(3).map(|i| stack[i].as_str()),
                    other => other,
                };
                if let Some(property) = property {
                    summary.set(property, value);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(xml_err(format!("unclosed element <{}>", stack.join("/"))));
    }
    if !saw_rdf {
        return Err(xml_err("no rdf:RDF element"));
    }
    Ok(summary)
}
