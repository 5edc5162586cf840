//! Attachment helper capability.

use super::AttachmentRequest;
use super::manual::{build_embedded_file_stream, build_filespec};
use crate::graph::ObjectGraph;
use crate::model::text::decode_text_string;
use crate::model::{PDFDict, PDFObjRef, PDFObject};
use thiserror::Error;

/// The helper cannot embed this request; the caller falls back to manual
/// embedding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("attachment helper unavailable: {0}")]
pub struct HelperUnavailable(pub String);

/// Objects created by a helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentHandle {
    pub filespec: PDFObjRef,
    pub stream: PDFObjRef,
    /// Key under which the file specification was registered.
    pub name: String,
}

/// Something that can embed one attachment into a graph.
///
/// Implementations register the file specification in the
/// `/EmbeddedFiles` name tree. The catalog `/AF` array is set by the caller.
pub trait AttachmentHelper: Send + Sync {
    fn embed(
        &self,
        graph: &mut ObjectGraph,
        request: &AttachmentRequest,
    ) -> Result<AttachmentHandle, HelperUnavailable>;
}

/// Bundled helper. Merges the new entry into an existing flat
/// `/EmbeddedFiles` leaf, keeping keys sorted; nested trees are not
/// handled.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardAttachmentHelper;

impl AttachmentHelper for StandardAttachmentHelper {
    fn embed(
        &self,
        graph: &mut ObjectGraph,
        request: &AttachmentRequest,
    ) -> Result<AttachmentHandle, HelperUnavailable> {
        let catalog = graph
            .catalog()
            .ok_or_else(|| HelperUnavailable("catalog missing".into()))?;
        let names_entry = catalog.get("Names").cloned();
        let mut names: PDFDict = names_entry
            .as_ref()
            .and_then(|n| graph.resolve_dict(n))
            .cloned()
            .unwrap_or_default();
        let mut leaf: PDFDict = names
            .get("EmbeddedFiles")
            .and_then(|e| graph.resolve_dict(e))
            .cloned()
            .unwrap_or_default();
        if leaf.contains_key("Kids") {
            return Err(HelperUnavailable("nested EmbeddedFiles tree".into()));
        }

        let mut entries: Vec<(String, PDFObject, PDFObject)> = match leaf.get("Names") {
            Some(PDFObject::Array(items)) => items
                .chunks_exact(2)
                .filter_map(|pair| match &pair[0] {
                    PDFObject::String(s) => {
                        Some((decode_text_string(s), pair[0].clone(), pair[1].clone()))
                    }
                    _ => None,
                })
                .filter(|(key, _, _)| *key != request.name)
                .collect(),
            Some(_) => return Err(HelperUnavailable("EmbeddedFiles /Names is not an array".into())),
            None => Vec::new(),
        };

        let stream = build_embedded_file_stream(request)
            .map_err(|e| HelperUnavailable(e.to_string()))?;
        let stream = graph.add_object(PDFObject::from(stream));
        let filespec = graph.add_object(PDFObject::Dict(build_filespec(request, stream)));

        entries.push((
            request.name.clone(),
            PDFObject::text(&request.name),
            PDFObject::Ref(filespec),
        ));
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        let items = entries.into_iter().flat_map(|(_, k, v)| [k, v]).collect();
        leaf.shift_remove("Limits");
        leaf.insert("Names".into(), PDFObject::Array(items));
        names.insert("EmbeddedFiles".into(), PDFObject::Dict(leaf));

        match names_entry {
            Some(PDFObject::Ref(r)) => graph.set_object(r.objid, PDFObject::Dict(names)),
            _ => {
                graph
                    .catalog_mut()
                    .map_err(|e| HelperUnavailable(e.to_string()))?
                    .insert("Names".into(), PDFObject::Dict(names));
            }
        }

        Ok(AttachmentHandle {
            filespec,
            stream,
            name: request.name.clone(),
        })
    }
}
