//! Embedded file subsystem.
//!
//! Places one payload in the graph so that a file specification points at
//! an embedded file stream, the `/EmbeddedFiles` name tree holds one leaf
//! keyed by the display name, and the catalog `/AF` array references the
//! same file specification.
//!
//! - `helper` - the [`AttachmentHelper`] capability and its bundled implementation
//! - `manual` - direct construction with a forced structure rebuild

pub mod helper;
pub mod manual;

pub use helper::{AttachmentHandle, AttachmentHelper, HelperUnavailable, StandardAttachmentHelper};
pub use manual::{build_embedded_file_stream, build_filespec, embed_manual, sanitize_embedded_file_keys};

use crate::config::AttachmentConfig;
use crate::error::{PackError, PackResult};
use crate::graph::{DEFAULT_MAX_DEPTH, ObjectGraph, embedded_files_root, name_tree_entries};
use crate::model::{PDFObjRef, PDFObject};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One attachment to embed.
#[derive(Debug, Clone)]
pub struct AttachmentRequest {
    pub payload: Bytes,
    /// Display name, used as the name tree key and `/UF`.
    pub name: String,
    /// MIME type, stored as the stream `/Subtype`.
    pub mime: String,
    /// `/AFRelationship` value.
    pub relationship: String,
    /// `/Desc` text.
    pub description: String,
    pub mod_date: DateTime<Utc>,
    /// Store the payload Flate-compressed.
    pub compress: bool,
}

impl AttachmentRequest {
    /// Request with the given payload and name, everything else from `config`.
    /// A blank name falls back to `config.default_name`.
    pub fn new(
        payload: impl Into<Bytes>,
        name: &str,
        config: &AttachmentConfig,
        mod_date: DateTime<Utc>,
    ) -> Self {
        let name = if name.trim().is_empty() {
            config.default_name.clone()
        } else {
            name.to_string()
        };
        Self {
            payload: payload.into(),
            description: format!("{}{}", config.description_prefix, name),
            name,
            mime: config.mime_type.clone(),
            relationship: config.relationship.clone(),
            mod_date,
            compress: config.compress,
        }
    }

    pub fn size(&self) -> usize {
        self.payload.len()
    }
}

/// Which path produced the attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedStrategy {
    Helper,
    Manual,
}

/// Result of [`embed_attachment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedOutcome {
    pub strategy: EmbedStrategy,
    pub filespec: PDFObjRef,
    pub stream: PDFObjRef,
    pub name: String,
    pub size: usize,
}

/// Embed `request`, preferring `helper` and falling back to the manual
/// path when the helper is absent, unavailable, or leaves an attachment
/// that cannot be found or has no live stream.
pub fn embed_attachment(
    graph: &mut ObjectGraph,
    request: &AttachmentRequest,
    helper: Option<&dyn AttachmentHelper>,
) -> PackResult<EmbedOutcome> {
    embed_attachment_with_depth(graph, request, helper, DEFAULT_MAX_DEPTH)
}

/// [`embed_attachment`] with an explicit walk depth limit for the
/// stray-key cleanup.
pub fn embed_attachment_with_depth(
    graph: &mut ObjectGraph,
    request: &AttachmentRequest,
    helper: Option<&dyn AttachmentHelper>,
    max_depth: usize,
) -> PackResult<EmbedOutcome> {
    if let Some(helper) = helper {
        match helper.embed(graph, request) {
            Ok(handle) => match accept_helper_result(graph, request, &handle, max_depth) {
                Ok(stream) => {
                    graph
                        .catalog_mut()?
                        .insert("AF".into(), PDFObject::Array(vec![PDFObject::Ref(handle.filespec)]));
                    tracing::debug!(name = %request.name, "attachment embedded by helper");
                    return Ok(EmbedOutcome {
                        strategy: EmbedStrategy::Helper,
                        filespec: handle.filespec,
                        stream,
                        name: request.name.clone(),
                        size: request.size(),
                    });
                }
                Err(err) => {
                    tracing::warn!(error = %err, "helper result rejected, using manual embedding");
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "attachment helper unavailable, using manual embedding");
            }
        }
    }
    embed_manual(graph, request, max_depth)
}

fn accept_helper_result(
    graph: &mut ObjectGraph,
    request: &AttachmentRequest,
    handle: &AttachmentHandle,
    max_depth: usize,
) -> PackResult<PDFObjRef> {
    let catalog = PDFObject::reference(graph.catalog_id());
    let listed = embedded_files_root(graph, &catalog)
        .map(|root| name_tree_entries(graph, &root, max_depth))
        .unwrap_or_default()
        .into_iter()
        .any(|(key, value)| key == handle.name && value == PDFObject::Ref(handle.filespec));
    if !listed {
        return Err(PackError::EmbedFailed(format!(
            "{:?} not found in the EmbeddedFiles name tree",
            handle.name
        )));
    }
    verify_embedded_stream(graph, handle.filespec, request)
}

/// Require the file specification's `/EF /F` to resolve to a live stream.
///
/// A dangling or null entry is repaired once with a freshly built stream,
/// attached under both `/F` and `/UF`.
pub fn verify_embedded_stream(
    graph: &mut ObjectGraph,
    filespec: PDFObjRef,
    request: &AttachmentRequest,
) -> PackResult<PDFObjRef> {
    let ef = {
        let spec = graph
            .get(filespec.objid)
            .and_then(|o| o.as_dict().ok())
            .ok_or_else(|| PackError::EmbedFailed("file specification missing".into()))?;
        spec.get("EF")
            .cloned()
            .ok_or_else(|| PackError::EmbedFailed("EF dict missing".into()))?
    };
    if let Some(stream) = live_stream_ref(graph, &ef) {
        return Ok(stream);
    }

    tracing::warn!(name = %request.name, "EF/F does not resolve to a stream, rebuilding");
    let fresh = graph.add_object(PDFObject::from(build_embedded_file_stream(request)?));
    let ef_dict = match ef {
        PDFObject::Ref(r) => graph.dict_mut(r.objid)?,
        _ => graph
            .dict_mut(filespec.objid)?
            .get_mut("EF")
            .and_then(|o| o.as_dict_mut().ok())
            .ok_or_else(|| PackError::EmbedFailed("EF is not a dictionary".into()))?,
    };
    ef_dict.insert("F".into(), PDFObject::Ref(fresh));
    ef_dict.insert("UF".into(), PDFObject::Ref(fresh));

    let ef = graph
        .get(filespec.objid)
        .and_then(|o| o.as_dict().ok())
        .and_then(|d| d.get("EF"))
        .cloned()
        .unwrap_or(PDFObject::Null);
    live_stream_ref(graph, &ef)
        .ok_or_else(|| PackError::EmbedFailed("EF/F still dangling after rebuild".into()))
}

/// `/EF /F` as an indirect reference to a stream, if it is one.
fn live_stream_ref(graph: &ObjectGraph, ef: &PDFObject) -> Option<PDFObjRef> {
    let f = graph.resolve_dict(ef)?.get("F")?;
    match f {
        PDFObject::Ref(r) if matches!(graph.get(r.objid), Some(PDFObject::Stream(_))) => Some(*r),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AttachmentConfig;
    use chrono::TimeZone;

    fn request(name: &str) -> AttachmentRequest {
        let when = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        AttachmentRequest::new(
            b"<Invoice><ID>INV-00001</ID></Invoice>".to_vec(),
            name,
            &AttachmentConfig::default(),
            when,
        )
    }

    #[derive(Debug)]
    struct Unavailable;

    impl AttachmentHelper for Unavailable {
        fn embed(
            &self,
            _graph: &mut ObjectGraph,
            _request: &AttachmentRequest,
        ) -> Result<AttachmentHandle, HelperUnavailable> {
            Err(HelperUnavailable("not installed".into()))
        }
    }

    /// Reports success without touching the name tree.
    #[derive(Debug)]
    struct Forgetful;

    impl AttachmentHelper for Forgetful {
        fn embed(
            &self,
            graph: &mut ObjectGraph,
            request: &AttachmentRequest,
        ) -> Result<AttachmentHandle, HelperUnavailable> {
            let stream = graph.add_object(PDFObject::Null);
            let filespec = graph.add_object(PDFObject::Dict(build_filespec(request, stream)));
            Ok(AttachmentHandle {
                filespec,
                stream,
                name: request.name.clone(),
            })
        }
    }

    #[test]
    fn blank_name_uses_default() {
        let req = request("  ");
        assert_eq!(req.name, "invoice.xml");
        assert_eq!(req.description, "Embedded UBL: invoice.xml");
        assert_eq!(req.size(), 37);
    }

    #[test]
    fn standard_helper_is_preferred() {
        let mut graph = ObjectGraph::new();
        let outcome =
            embed_attachment(&mut graph, &request("invoice.xml"), Some(&StandardAttachmentHelper))
                .unwrap();
        assert_eq!(outcome.strategy, EmbedStrategy::Helper);
        let af = graph.catalog().unwrap()["AF"].as_array().unwrap();
        assert_eq!(af, &vec![PDFObject::Ref(outcome.filespec)]);
    }

    #[test]
    fn unavailable_helper_falls_back_to_manual() {
        let mut graph = ObjectGraph::new();
        let outcome = embed_attachment(&mut graph, &request("invoice.xml"), Some(&Unavailable)).unwrap();
        assert_eq!(outcome.strategy, EmbedStrategy::Manual);
        assert_eq!(outcome.name, "invoice.xml");
        assert_eq!(outcome.size, 37);
    }

    #[test]
    fn unlisted_helper_result_falls_back_to_manual() {
        let mut graph = ObjectGraph::new();
        let outcome = embed_attachment(&mut graph, &request("invoice.xml"), Some(&Forgetful)).unwrap();
        assert_eq!(outcome.strategy, EmbedStrategy::Manual);
        let stream = graph.get(outcome.stream.objid).unwrap().as_stream().unwrap();
        assert_eq!(stream.len(), 37);
    }

    #[test]
    fn dangling_stream_is_rebuilt_once() {
        let mut graph = ObjectGraph::new();
        let req = request("invoice.xml");
        let dead = graph.reserve();
        let filespec = graph.add_object(PDFObject::Dict(build_filespec(&req, PDFObjRef::new(dead, 0))));
        let stream = verify_embedded_stream(&mut graph, filespec, &req).unwrap();
        assert_ne!(stream.objid, dead);
        let ef = graph.resolve_dict(&PDFObject::Ref(filespec)).unwrap()["EF"].clone();
        let ef = ef.as_dict().unwrap();
        assert_eq!(ef["F"], PDFObject::Ref(stream));
        assert_eq!(ef["UF"], PDFObject::Ref(stream));
    }

    #[test]
    fn missing_ef_dict_fails() {
        let mut graph = ObjectGraph::new();
        let req = request("invoice.xml");
        let filespec = graph.add_object(PDFObject::Dict(crate::model::dict([(
            "Type",
            PDFObject::name("Filespec"),
        )])));
        let err = verify_embedded_stream(&mut graph, filespec, &req).unwrap_err();
        assert!(matches!(err, PackError::EmbedFailed(msg) if msg.contains("EF dict missing")));
    }
}
