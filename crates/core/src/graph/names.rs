//! Name tree reading.

use super::walk::{ObjectSource, WalkControl, resolve_with, walk};
use crate::model::PDFObject;
use crate::model::text::decode_text_string;

/// `(key, value)` pairs of a name tree, in tree order. Values are returned
/// unresolved so callers can keep references intact.
pub fn name_tree_entries<S>(source: &S, root: &PDFObject, max_depth: usize) -> Vec<(String, PDFObject)>
where
    S: ObjectSource + ?Sized,
{
    let mut entries = Vec::new();
    walk(source, root, "", max_depth, |v| {
        if matches!(v.key, Some("Names" | "Limits")) {
            return WalkControl::Skip;
        }
        let Ok(dict) = v.node.as_dict() else {
            return WalkControl::Descend;
        };
        if let Some(names) = dict.get("Names")
            && let Some(names) = resolve_with(source, names)
            && let Ok(items) = names.as_array()
        {
            for pair in items.chunks_exact(2) {
                let key = match resolve_with(source, &pair[0]).as_deref() {
                    Some(PDFObject::String(s)) => decode_text_string(s),
                    _ => continue,
                };
                entries.push((key, pair[1].clone()));
            }
        }
        WalkControl::Descend
    });
    entries
}

/// The `/EmbeddedFiles` name tree root under a catalog's `/Names`.
pub fn embedded_files_root<S>(source: &S, catalog: &PDFObject) -> Option<PDFObject>
where
    S: ObjectSource + ?Sized,
{
    let catalog = resolve_with(source, catalog)?;
    let names = resolve_with(source, catalog.as_dict().ok()?.get("Names")?)?;
    let root = names.as_dict().ok()?.get("EmbeddedFiles")?.clone();
    Some(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ObjectGraph;
    use crate::model::dict;

    #[test]
    fn reads_nested_kids_in_order() {
        let mut graph = ObjectGraph::new();
        let leaf_a = graph.add_object(PDFObject::Dict(dict([
            ("Limits", PDFObject::Array(vec![PDFObject::string("a"), PDFObject::string("a")])),
            ("Names", PDFObject::Array(vec![PDFObject::string("a.xml"), PDFObject::Int(1)])),
        ])));
        let leaf_b = graph.add_object(PDFObject::Dict(dict([(
            "Names",
            PDFObject::Array(vec![
                PDFObject::text("b.xml"),
                PDFObject::Int(2),
                PDFObject::text("Račun.xml"),
                PDFObject::Int(3),
            ]),
        )])));
        let root = PDFObject::Dict(dict([(
            "Kids",
            PDFObject::Array(vec![PDFObject::Ref(leaf_a), PDFObject::Ref(leaf_b)]),
        )]));

        let entries = name_tree_entries(&graph, &root, 16);
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a.xml", "b.xml", "Račun.xml"]);
        assert_eq!(entries[2].1, PDFObject::Int(3));
    }
}
