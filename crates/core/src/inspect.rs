//! Read-only introspection of packaged documents.

use crate::document::PDFDocument;
use crate::error::PackResult;
use crate::graph::{DEFAULT_MAX_DEPTH, WalkControl, embedded_files_root, name_tree_entries, walk};
use crate::model::{PDFObject, PDFStream};
use crate::writer::render;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// One entry of the `/EmbeddedFiles` name tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentInfo {
    pub name: String,
    /// Uncompressed size, from `/Params /Size` or the decoded stream.
    pub size: Option<u64>,
    pub mime_subtype: Option<String>,
    pub relationship: Option<String>,
}

fn resolved(doc: &PDFDocument, obj: Option<&PDFObject>) -> Option<PDFObject> {
    match doc.resolve(obj?) {
        Ok(PDFObject::Null) | Err(_) => None,
        Ok(obj) => Some(obj),
    }
}

fn stream_size(doc: &PDFDocument, stream: &PDFStream) -> Option<u64> {
    let declared = resolved(doc, stream.get("Params"))
        .and_then(|params| match resolved(doc, params.as_dict().ok()?.get("Size")) {
            Some(PDFObject::Int(n)) => u64::try_from(n).ok(),
            _ => None,
        });
    declared.or_else(|| doc.decode_stream(stream).ok().map(|data| data.len() as u64))
}

/// Embedded files in name-tree order.
pub fn list_attachments(bytes: &[u8]) -> PackResult<Vec<AttachmentInfo>> {
    let doc = PDFDocument::new(bytes)?;
    let catalog = doc
        .catalog_ref()
        .map_or_else(|| PDFObject::Dict(doc.catalog().clone()), PDFObject::Ref);
    let Some(root) = embedded_files_root(&doc, &catalog) else {
        return Ok(Vec::new());
    };

    let associated = match resolved(&doc, doc.catalog().get("AF")) {
        Some(PDFObject::Array(entries)) => entries,
        _ => Vec::new(),
    };

    let attachments = name_tree_entries(&doc, &root, DEFAULT_MAX_DEPTH)
        .into_iter()
        .map(|(name, entry)| {
            let spec = resolved(&doc, Some(&entry));
            let declared = spec
                .as_ref()
                .and_then(|s| s.as_dict().ok()?.get("AFRelationship"));
            let relationship = match declared {
                Some(PDFObject::Name(rel)) => Some(rel.clone()),
                // listed in /AF without a declared relationship
                _ if spec.as_ref().is_some_and(|s| in_associated_files(&associated, &entry, s)) => {
                    Some("Associated".to_string())
                }
                _ => None,
            };
            let spec = spec.as_ref().and_then(|s| s.as_dict().ok());
            let stream = spec
                .and_then(|s| resolved(&doc, s.get("EF")))
                .and_then(|ef| resolved(&doc, ef.as_dict().ok()?.get("F")));
            let (size, mime_subtype) = match &stream {
                Some(PDFObject::Stream(stream)) => {
                    let subtype = match stream.get("Subtype") {
                        Some(PDFObject::Name(subtype)) => Some(subtype.clone()),
                        _ => None,
                    };
                    (stream_size(&doc, stream), subtype)
                }
                _ => (None, None),
            };
            AttachmentInfo {
                name,
                size,
                mime_subtype,
                relationship,
            }
        })
        .collect();
    Ok(attachments)
}

/// Whether a name-tree value is one of the catalog `/AF` entries. References
/// match by object number, direct dictionaries by value.
fn in_associated_files(associated: &[PDFObject], entry: &PDFObject, spec: &PDFObject) -> bool {
    associated.iter().any(|af| match (af, entry) {
        (PDFObject::Ref(a), PDFObject::Ref(b)) => a.objid == b.objid,
        (PDFObject::Ref(_), _) | (_, PDFObject::Ref(_)) => false,
        (af, _) => af == spec,
    })
}

fn render_or_null(obj: Option<&PDFObject>) -> String {
    obj.map_or_else(|| "null".to_string(), render)
}

/// Human-readable dump of the catalog, the embedded files tree, the root
/// `/AF` array and any singular `/EmbeddedFile` keys under the catalog.
pub fn dump_structure(bytes: &[u8]) -> PackResult<String> {
    let doc = PDFDocument::new(bytes)?;
    let catalog = doc.catalog();
    let mut out = String::with_capacity(4096);

    let _ = writeln!(out, "== Catalog ==\n{}\n", render(&PDFObject::Dict(catalog.clone())));

    match resolved(&doc, catalog.get("Names")) {
        Some(PDFObject::Dict(names)) => {
            let keys: Vec<&str> = names.keys().map(String::as_str).collect();
            let _ = writeln!(out, "== Names dictionary ==\n[{}]", keys.join(", "));
            let root = catalog_root(&doc);
            match embedded_files_root(&doc, &root).and_then(|tree| resolved(&doc, Some(&tree))) {
                None => out.push_str("No /EmbeddedFiles tree\n"),
                Some(tree) => {
                    let _ = writeln!(out, "EmbeddedFiles tree (root):\n{}", render(&tree));
                    for (name, spec) in name_tree_entries(&doc, &tree, DEFAULT_MAX_DEPTH) {
                        let spec = resolved(&doc, Some(&spec));
                        let dict = spec.as_ref().and_then(|s| s.as_dict().ok());
                        let ef = dict.and_then(|d| resolved(&doc, d.get("EF")));
                        let relationship = dict.and_then(|d| resolved(&doc, d.get("AFRelationship")));
                        let _ = writeln!(out, "  name: {name}");
                        let _ = writeln!(out, "  FileSpec: {}", render_or_null(spec.as_ref()));
                        let _ = writeln!(out, "  EF: {}", render_or_null(ef.as_ref()));
                        let _ = writeln!(out, "  AFRelationship: {}\n", render_or_null(relationship.as_ref()));
                    }
                }
            }
        }
        _ => out.push_str("No /Names dictionary\n"),
    }

    out.push_str("== Root /AF array ==\n");
    match resolved(&doc, catalog.get("AF")) {
        Some(af) => {
            let _ = writeln!(out, "{}", render(&af));
        }
        None => out.push_str("No /AF\n"),
    }

    out.push_str("\n== Scan for singular /EmbeddedFile keys under Catalog ==\n");
    let report = walk(&doc, &catalog_root(&doc), "Catalog", DEFAULT_MAX_DEPTH, |v| {
        if let Ok(dict) = v.node.as_dict()
            && let Some(value) = dict.get("EmbeddedFile")
        {
            let _ = writeln!(out, "Found /EmbeddedFile at {}", v.path);
            let _ = writeln!(out, "  -> {}", render_or_null(resolved(&doc, Some(value)).as_ref()));
        }
        WalkControl::Descend
    });
    for path in &report.truncated {
        let _ = writeln!(out, "Max depth reached at {path}");
    }
    Ok(out)
}

fn catalog_root(doc: &PDFDocument) -> PDFObject {
    doc.catalog_ref()
        .map_or_else(|| PDFObject::Dict(doc.catalog().clone()), PDFObject::Ref)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_attachment(extra: &str) -> Vec<u8> {
        format!(
            "%PDF-1.4
1 0 obj << /Type /Catalog /Pages 2 0 R /Names 3 0 R /AF [4 0 R]{extra} >> endobj
2 0 obj << /Type /Pages /Kids [] /Count 0 >> endobj
3 0 obj << /EmbeddedFiles << /Names [(invoice.xml) 4 0 R] >> >> endobj
4 0 obj << /Type /Filespec /F (invoice.xml) /UF (invoice.xml) /AFRelationship /Data /EF << /F 5 0 R /UF 5 0 R >> >> endobj
5 0 obj << /Type /EmbeddedFile /Subtype /application#2Fxml /Params << /Size 37 >> /Length 4 >>
stream
<a/>
endstream
endobj
trailer << /Root 1 0 R >>
%%EOF"
        )
        .into_bytes()
    }

    #[test]
    fn lists_attachment_fields() {
        let attachments = list_attachments(&with_attachment("")).unwrap();
        assert_eq!(
            attachments,
            vec![AttachmentInfo {
                name: "invoice.xml".into(),
                size: Some(37),
                mime_subtype: Some("application/xml".into()),
                relationship: Some("Data".into()),
            }]
        );
    }

    #[test]
    fn af_entry_without_relationship_is_associated() {
        let pdf = String::from_utf8(with_attachment(""))
            .unwrap()
            .replace(" /AFRelationship /Data", "");
        let attachments = list_attachments(pdf.as_bytes()).unwrap();
        assert_eq!(attachments[0].relationship.as_deref(), Some("Associated"));

        let outside_af = pdf.replace("/AF [4 0 R]", "/AF []");
        let attachments = list_attachments(outside_af.as_bytes()).unwrap();
        assert_eq!(attachments[0].relationship, None);
    }

    #[test]
    fn no_names_means_no_attachments() {
        let pdf = b"%PDF-1.4
1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj
2 0 obj << /Type /Pages /Kids [] /Count 0 >> endobj
trailer << /Root 1 0 R >>
%%EOF";
        assert!(list_attachments(pdf).unwrap().is_empty());
        let dump = dump_structure(pdf).unwrap();
        assert!(dump.contains("No /Names dictionary\n"));
        assert!(dump.contains("No /AF\n"));
    }

    #[test]
    fn dump_lists_tree_and_af() {
        let dump = dump_structure(&with_attachment("")).unwrap();
        assert!(dump.starts_with("== Catalog ==\n<< /Type /Catalog"));
        assert!(dump.contains("== Names dictionary ==\n[EmbeddedFiles]\n"));
        assert!(dump.contains("  name: invoice.xml\n"));
        assert!(dump.contains("  AFRelationship: /Data\n"));
        assert!(dump.contains("== Root /AF array ==\n[4 0 R]\n"));
        assert!(!dump.contains("Found /EmbeddedFile"));
    }

    #[test]
    fn dump_finds_singular_key() {
        let dump = dump_structure(&with_attachment(" /Odd << /EmbeddedFile 5 0 R >>")).unwrap();
        assert!(dump.contains("Found /EmbeddedFile at Catalog/Odd\n"));
        assert!(dump.contains("  -> << /Type /EmbeddedFile"));
    }
}
