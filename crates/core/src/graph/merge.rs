//! Page import from a source document into the destination graph.

use super::ObjectGraph;
use super::walk::{DEFAULT_MAX_DEPTH, WalkControl, walk};
use crate::document::{PDFDocument, normalize_page_boxes};
use crate::error::{PackError, PackResult};
use crate::model::{PDFDict, PDFObject, PDFStream};
use rustc_hash::{FxHashMap, FxHashSet};

/// Page keys that point into source structures which are not imported.
const DROPPED_PAGE_KEYS: [&str; 2] = ["B", "StructParents"];

/// US Letter, used when neither the page nor its ancestors give a MediaBox.
const DEFAULT_MEDIABOX: [i64; 4] = [0, 0, 612, 792];

/// Import every page of `source`, in document order, under the graph's
/// page tree root. Returns the number of pages imported.
///
/// Objects shared between pages are copied once. References to source
/// page-tree nodes map to the destination root.
pub fn import_pages(graph: &mut ObjectGraph, source: &PDFDocument) -> PackResult<usize> {
    import_pages_with_depth(graph, source, DEFAULT_MAX_DEPTH)
}

/// [`import_pages`] with an explicit depth limit for collecting the objects
/// each page depends on. Objects beyond the limit are not copied and their
/// references are dropped.
pub fn import_pages_with_depth(
    graph: &mut ObjectGraph,
    source: &PDFDocument,
    max_depth: usize,
) -> PackResult<usize> {
    let tree = source.page_tree();
    if tree.pages.is_empty() {
        return Err(PackError::EmptySource);
    }

    // source objid -> destination objid
    let mut map: FxHashMap<u32, u32> = FxHashMap::default();
    for node in &tree.nodes {
        map.insert(*node, graph.pages_id());
    }
    let page_ids: Vec<u32> = tree
        .pages
        .iter()
        .map(|page| {
            let dest = graph.reserve();
            map.insert(page.pageid, dest);
            dest
        })
        .collect();
    let structural: FxHashSet<u32> = map.keys().copied().collect();

    // Everything reachable from the pages, short of the page tree itself.
    let mut to_copy = Vec::new();
    let mut queued = FxHashSet::default();
    for page in &tree.pages {
        let root = PDFObject::Dict(page.attrs.clone());
        let report = walk(source, &root, "Page", max_depth, |v| {
            if v.depth == 1 && v.key.is_some_and(|k| k == "Parent" || DROPPED_PAGE_KEYS.contains(&k)) {
                return WalkControl::Skip;
            }
            match v.objid {
                Some(id) if structural.contains(&id) => WalkControl::Skip,
                Some(id) => {
                    if queued.insert(id) {
                        to_copy.push(id);
                    }
                    WalkControl::Descend
                }
                None => WalkControl::Descend,
            }
        });
        for path in &report.truncated {
            tracing::warn!(page = page.pageid, path = %path, "page import depth limit reached");
        }
        if !report.missing.is_empty() {
            tracing::debug!(page = page.pageid, missing = ?report.missing, "dropping references to missing objects");
        }
    }

    for &src in &to_copy {
        let dest = graph.reserve();
        map.insert(src, dest);
    }
    for &src in &to_copy {
        let Ok(obj) = source.getobj(src) else {
            continue;
        };
        if let Some(&dest) = map.get(&src) {
            graph.set_object(dest, translate(&obj, &map));
        }
    }

    let mut kids = Vec::with_capacity(page_ids.len());
    for (page, &dest) in tree.pages.iter().zip(&page_ids) {
        let mut attrs = match translate(&PDFObject::Dict(page.attrs.clone()), &map) {
            PDFObject::Dict(d) => d,
            _ => PDFDict::new(),
        };
        for key in DROPPED_PAGE_KEYS {
            attrs.shift_remove(key);
        }
        attrs.insert("Type".into(), PDFObject::name("Page"));
        attrs.insert("Parent".into(), PDFObject::reference(graph.pages_id()));
        if !attrs.contains_key("MediaBox") {
            attrs.insert(
                "MediaBox".into(),
                PDFObject::Array(DEFAULT_MEDIABOX.iter().map(|&v| PDFObject::Int(v)).collect()),
            );
        }
        normalize_page_boxes(&mut attrs);
        graph.set_object(dest, PDFObject::Dict(attrs));
        kids.push(PDFObject::reference(dest));
    }

    let count = kids.len();
    let pages_id = graph.pages_id();
    let root = graph.dict_mut(pages_id)?;
    let mut all_kids = match root.shift_remove("Kids") {
        Some(PDFObject::Array(existing)) => existing,
        _ => Vec::new(),
    };
    all_kids.extend(kids);
    root.insert("Count".into(), PDFObject::Int(all_kids.len() as i64));
    root.insert("Kids".into(), PDFObject::Array(all_kids));

    tracing::debug!(pages = count, objects = to_copy.len(), "imported pages");
    Ok(count)
}

/// Copy `obj`, rewriting references through `map`. Unmapped references
/// become null, and null dictionary values are dropped.
fn translate(obj: &PDFObject, map: &FxHashMap<u32, u32>) -> PDFObject {
    match obj {
        PDFObject::Ref(r) => match map.get(&r.objid) {
            Some(&dest) => PDFObject::reference(dest),
            None => PDFObject::Null,
        },
        PDFObject::Array(arr) => PDFObject::Array(arr.iter().map(|o| translate(o, map)).collect()),
        PDFObject::Dict(d) => PDFObject::Dict(translate_dict(d, map)),
        PDFObject::Stream(s) => PDFObject::from(PDFStream::new(
            translate_dict(&s.attrs, map),
            s.rawdata_bytes(),
        )),
        other => other.clone(),
    }
}

fn translate_dict(d: &PDFDict, map: &FxHashMap<u32, u32>) -> PDFDict {
    d.iter()
        .filter_map(|(k, v)| {
            let v = translate(v, map);
            (!v.is_null()).then(|| (k.clone(), v))
        })
        .collect()
}
