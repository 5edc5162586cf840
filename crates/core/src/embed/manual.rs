//! Manual embedding: build the objects directly and rebuild the catalog
//! structures that point at them.

use super::{AttachmentRequest, EmbedOutcome, EmbedStrategy, verify_embedded_stream};
use crate::codec::flate::flate_encode;
use crate::error::{PackError, PackResult};
use crate::graph::{ObjectGraph, WalkControl, walk};
use crate::metadata::pdf_date;
use crate::model::text::ascii_file_name;
use crate::model::{PDFDict, PDFObjRef, PDFObject, PDFStream, dict};
use rustc_hash::FxHashSet;

/// Singular key some producers write in place of `/EF`.
const STRAY_KEY: &str = "EmbeddedFile";

/// Embedded file stream for `request`. `/Params /Size` is the payload
/// length before compression.
pub fn build_embedded_file_stream(request: &AttachmentRequest) -> PackResult<PDFStream> {
    let checksum = md5::compute(&request.payload);
    let params = dict([
        ("Size", PDFObject::Int(request.size() as i64)),
        ("ModDate", PDFObject::string(&pdf_date(&request.mod_date))),
        ("CheckSum", PDFObject::String(checksum.0.to_vec())),
    ]);
    let mut attrs = dict([
        ("Type", PDFObject::name("EmbeddedFile")),
        ("Subtype", PDFObject::name(&request.mime)),
        ("Params", PDFObject::Dict(params)),
    ]);
    let data = if request.compress {
        attrs.insert("Filter".into(), PDFObject::name("FlateDecode"));
        flate_encode(&request.payload)
            .map_err(|e| PackError::EmbedFailed(format!("compressing payload: {e}")))?
            .into()
    } else {
        request.payload.clone()
    };
    Ok(PDFStream::new(attrs, data))
}

/// File specification pointing at `stream` under both `/EF /F` and `/EF /UF`.
pub fn build_filespec(request: &AttachmentRequest, stream: PDFObjRef) -> PDFDict {
    dict([
        ("Type", PDFObject::name("Filespec")),
        ("F", PDFObject::string(&ascii_file_name(&request.name))),
        ("UF", PDFObject::text(&request.name)),
        ("Desc", PDFObject::text(&request.description)),
        ("AFRelationship", PDFObject::name(&request.relationship)),
        (
            "EF",
            PDFObject::Dict(dict([("F", PDFObject::Ref(stream)), ("UF", PDFObject::Ref(stream))])),
        ),
    ])
}

/// Build the attachment from scratch, replace the catalog `/Names` and
/// `/AF` entries, and strip stray `/EmbeddedFile` keys.
pub fn embed_manual(
    graph: &mut ObjectGraph,
    request: &AttachmentRequest,
    max_depth: usize,
) -> PackResult<EmbedOutcome> {
    let stream = graph.add_object(PDFObject::from(build_embedded_file_stream(request)?));
    let filespec = graph.add_object(PDFObject::Dict(build_filespec(request, stream)));
    rebuild_structure(graph, filespec, &request.name)?;

    let removed = sanitize_embedded_file_keys(graph, max_depth);
    if removed > 0 {
        tracing::debug!(removed, "removed stray /EmbeddedFile keys");
    }

    let stream = verify_embedded_stream(graph, filespec, request)?;
    tracing::debug!(name = %request.name, "attachment embedded manually");
    Ok(EmbedOutcome {
        strategy: EmbedStrategy::Manual,
        filespec,
        stream,
        name: request.name.clone(),
        size: request.size(),
    })
}

/// Replace `/Names` with a single-leaf `/EmbeddedFiles` tree and `/AF`
/// with `[filespec]`.
fn rebuild_structure(graph: &mut ObjectGraph, filespec: PDFObjRef, name: &str) -> PackResult<()> {
    let catalog = graph.catalog_mut()?;
    catalog.shift_remove("Names");
    catalog.shift_remove("AF");
    let leaf = dict([(
        "Names",
        PDFObject::Array(vec![PDFObject::text(name), PDFObject::Ref(filespec)]),
    )]);
    catalog.insert(
        "Names".into(),
        PDFObject::Dict(dict([("EmbeddedFiles", PDFObject::Dict(leaf))])),
    );
    catalog.insert("AF".into(), PDFObject::Array(vec![PDFObject::Ref(filespec)]));
    Ok(())
}

/// Remove every `/EmbeddedFile` key reachable from the catalog. Returns the
/// number of keys removed.
pub fn sanitize_embedded_file_keys(graph: &mut ObjectGraph, max_depth: usize) -> usize {
    let mut owners = Vec::new();
    let mut seen = FxHashSet::default();
    let root = PDFObject::reference(graph.catalog_id());
    let report = walk(graph, &root, "Catalog", max_depth, |v| {
        if let Ok(d) = v.node.as_dict()
            && d.contains_key(STRAY_KEY)
            && let Some(owner) = v.owner
        {
            tracing::debug!(path = %v.path, "found stray /EmbeddedFile");
            if seen.insert(owner) {
                owners.push(owner);
            }
        }
        WalkControl::Descend
    });
    for path in &report.truncated {
        tracing::warn!(path = %path, "stray key scan stopped at depth limit");
    }

    let mut removed = 0;
    for id in owners {
        if let Some(obj) = graph.get_mut(id) {
            removed += strip_key(obj, STRAY_KEY, max_depth);
        }
    }
    removed
}

/// Remove `key` from `obj` and its direct children, not following references.
fn strip_key(obj: &mut PDFObject, key: &str, depth_left: usize) -> usize {
    if depth_left == 0 {
        return 0;
    }
    match obj {
        PDFObject::Array(items) => items
            .iter_mut()
            .map(|item| strip_key(item, key, depth_left - 1))
            .sum(),
        PDFObject::Dict(_) | PDFObject::Stream(_) => {
            let Ok(d) = obj.as_dict_mut() else {
                return 0;
            };
            let mut removed = usize::from(d.shift_remove(key).is_some());
            for value in d.values_mut() {
                removed += strip_key(value, key, depth_left - 1);
            }
            removed
        }
        _ => 0,
    }
}
