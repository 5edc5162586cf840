//! Pre-serialization structural checks.

use crate::error::{InvariantKind, PackError, PackResult};
use crate::graph::{DEFAULT_MAX_DEPTH, ObjectGraph, embedded_files_root, name_tree_entries};
use crate::model::PDFObject;

fn violated(kind: InvariantKind) -> PackError {
    PackError::StructuralInvariantViolated(kind)
}

/// Check, in order: `/AF` present, non-empty, first entry live; the name
/// tree leaf for `display_name` (if present) has a live `/EF /F` stream;
/// `/Metadata` is a stream. Stops at the first failure.
pub fn check(graph: &ObjectGraph, display_name: &str) -> PackResult<()> {
    let catalog = graph
        .catalog()
        .ok_or_else(|| violated(InvariantKind::DanglingReference { objid: graph.catalog_id() }))?;

    let af = match catalog.get("AF").and_then(|af| graph.resolve(af)) {
        Some(PDFObject::Array(af)) => af,
        _ => return Err(violated(InvariantKind::AssociatedFilesMissing)),
    };
    let Some(first) = af.first() else {
        return Err(violated(InvariantKind::AssociatedFilesEmpty));
    };
    if graph.resolve(first).is_none_or(PDFObject::is_null) {
        return Err(violated(InvariantKind::AssociatedFilesNullEntry));
    }

    let catalog_ref = PDFObject::reference(graph.catalog_id());
    if let Some(root) = embedded_files_root(graph, &catalog_ref) {
        let leaf = name_tree_entries(graph, &root, DEFAULT_MAX_DEPTH)
            .into_iter()
            .find(|(key, _)| key == display_name);
        if let Some((_, spec)) = leaf {
            let stream = graph
                .resolve_dict(&spec)
                .and_then(|spec| spec.get("EF"))
                .and_then(|ef| graph.resolve_dict(ef))
                .and_then(|ef| ef.get("F"))
                .and_then(|f| graph.resolve(f));
            if !matches!(stream, Some(PDFObject::Stream(_))) {
                return Err(violated(InvariantKind::EmbeddedStreamNull {
                    name: display_name.to_string(),
                }));
            }
        }
    }

    match catalog.get("Metadata").and_then(|m| graph.resolve(m)) {
        Some(PDFObject::Stream(_)) => Ok(()),
        _ => Err(violated(InvariantKind::MetadataNotStream)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AttachmentConfig;
    use crate::embed::{AttachmentRequest, embed_manual};
    use crate::metadata::{DocumentInfo, now_utc, synchronize};

    fn packaged_graph() -> ObjectGraph {
        let mut graph = ObjectGraph::new();
        let request =
            AttachmentRequest::new(b"<a/>".to_vec(), "invoice.xml", &AttachmentConfig::default(), now_utc());
        embed_manual(&mut graph, &request, 64).unwrap();
        synchronize(&mut graph, &DocumentInfo::default(), &now_utc()).unwrap();
        graph
    }

    fn kind(result: PackResult<()>) -> InvariantKind {
        match result {
            Err(PackError::StructuralInvariantViolated(kind)) => kind,
            other => panic!("expected invariant violation, got {other:?}"),
        }
    }

    #[test]
    fn complete_graph_passes() {
        check(&packaged_graph(), "invoice.xml").unwrap();
    }

    #[test]
    fn missing_af() {
        let mut graph = packaged_graph();
        graph.catalog_mut().unwrap().shift_remove("AF");
        assert_eq!(kind(check(&graph, "invoice.xml")), InvariantKind::AssociatedFilesMissing);
    }

    #[test]
    fn empty_af() {
        let mut graph = packaged_graph();
        graph
            .catalog_mut()
            .unwrap()
            .insert("AF".into(), PDFObject::Array(vec![]));
        assert_eq!(kind(check(&graph, "invoice.xml")), InvariantKind::AssociatedFilesEmpty);
    }

    #[test]
    fn null_first_af_entry() {
        let mut graph = packaged_graph();
        let dead = graph.reserve();
        graph
            .catalog_mut()
            .unwrap()
            .insert("AF".into(), PDFObject::Array(vec![PDFObject::reference(dead)]));
        assert_eq!(kind(check(&graph, "invoice.xml")), InvariantKind::AssociatedFilesNullEntry);
    }

    #[test]
    fn dangling_embedded_stream() {
        let mut graph = packaged_graph();
        let af = graph.catalog().unwrap()["AF"].as_array().unwrap()[0].clone();
        let spec_id = af.as_ref().unwrap().objid;
        let dead = graph.reserve();
        let spec = graph.dict_mut(spec_id).unwrap();
        spec.get_mut("EF")
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .insert("F".into(), PDFObject::reference(dead));
        assert_eq!(
            kind(check(&graph, "invoice.xml")),
            InvariantKind::EmbeddedStreamNull {
                name: "invoice.xml".into()
            }
        );
        // only the leaf for the display name is inspected
        check(&graph, "other.xml").unwrap();
    }

    #[test]
    fn metadata_must_be_a_stream() {
        let mut graph = packaged_graph();
        graph
            .catalog_mut()
            .unwrap()
            .insert("Metadata".into(), PDFObject::Null);
        assert_eq!(kind(check(&graph, "invoice.xml")), InvariantKind::MetadataNotStream);
    }
}
