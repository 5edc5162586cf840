//! Page tree traversal with inherited attributes.

use super::catalog::PDFDocument;
use crate::model::{PDFDict, PDFObject};
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// A page leaf with inheritable attributes materialized.
#[derive(Debug, Clone)]
pub struct PDFPage {
    /// Page object ID
    pub pageid: u32,
    /// Page dictionary, with Resources/MediaBox/CropBox/Rotate filled in
    /// from ancestors when the leaf lacks them
    pub attrs: PDFDict,
}

impl PDFPage {
    /// Media box (physical page size), resolved through references.
    pub fn mediabox(&self, doc: &PDFDocument) -> Option<[f64; 4]> {
        parse_box(self.attrs.get("MediaBox")?, doc)
    }
}

/// Pages in document order plus the intermediate `/Pages` nodes visited.
#[derive(Debug, Default)]
pub struct PageTree {
    pub pages: Vec<PDFPage>,
    pub nodes: Vec<u32>,
}

#[derive(Debug)]
struct InheritedNode {
    parent: Option<Arc<InheritedNode>>,
    resources: Option<PDFObject>,
    mediabox: Option<PDFObject>,
    cropbox: Option<PDFObject>,
    rotate: Option<PDFObject>,
}

impl InheritedNode {
    fn from_dict(parent: Option<Arc<InheritedNode>>, dict: &PDFDict) -> Arc<Self> {
        Arc::new(Self {
            parent,
            resources: dict.get("Resources").cloned(),
            mediabox: dict.get("MediaBox").cloned(),
            cropbox: dict.get("CropBox").cloned(),
            rotate: dict.get("Rotate").cloned(),
        })
    }

    fn lookup(&self, pick: fn(&Self) -> Option<&PDFObject>) -> Option<&PDFObject> {
        pick(self).or_else(|| self.parent.as_ref().and_then(|p| p.lookup(pick)))
    }

    fn apply_to(&self, dest: &mut PDFDict) {
        let inherited: [(&str, fn(&Self) -> Option<&PDFObject>); 4] = [
            ("Resources", |n| n.resources.as_ref()),
            ("MediaBox", |n| n.mediabox.as_ref()),
            ("CropBox", |n| n.cropbox.as_ref()),
            ("Rotate", |n| n.rotate.as_ref()),
        ];
        for (key, pick) in inherited {
            if !dest.contains_key(key)
                && let Some(val) = self.lookup(pick)
            {
                dest.insert(key.to_string(), val.clone());
            }
        }
    }
}

impl PDFDocument {
    /// Walk the page tree. Falls back to every `/Type /Page` object when
    /// the tree yields nothing.
    pub fn page_tree(&self) -> PageTree {
        let tree = self.collect_from_page_tree();
        if !tree.pages.is_empty() {
            return tree;
        }
        PageTree {
            pages: self.collect_from_fallback(),
            nodes: tree.nodes,
        }
    }

    /// Get the total number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.page_tree().pages.len()
    }

    fn collect_from_page_tree(&self) -> PageTree {
        let mut tree = PageTree::default();
        let Some(PDFObject::Ref(pages_ref)) = self.catalog().get("Pages") else {
            return tree;
        };
        let mut stack = vec![(pages_ref.objid, InheritedNode::from_dict(None, &PDFDict::new()))];
        let mut visited = FxHashSet::default();

        while let Some((objid, parent_inherited)) = stack.pop() {
            if !visited.insert(objid) {
                continue;
            }

            let Ok(obj) = self.getobj_shared(objid) else {
                continue;
            };
            let Ok(dict) = obj.as_dict() else {
                continue;
            };
            let obj_type = dict.get("Type").or_else(|| dict.get("type"));

            match obj_type {
                Some(PDFObject::Name(name)) if name == "Pages" => {
                    tree.nodes.push(objid);
                    let inherited =
                        InheritedNode::from_dict(Some(Arc::clone(&parent_inherited)), dict);
                    if let Some(kids) = dict.get("Kids")
                        && let Ok(kids) = self.resolve(kids)
                        && let Ok(kids_arr) = kids.as_array()
                    {
                        for kid in kids_arr.iter().rev() {
                            if let Ok(kid_ref) = kid.as_ref() {
                                stack.push((kid_ref.objid, Arc::clone(&inherited)));
                            }
                        }
                    }
                }
                Some(PDFObject::Name(name)) if name == "Page" => {
                    let mut attrs = dict.clone();
                    parent_inherited.apply_to(&mut attrs);
                    tree.pages.push(PDFPage {
                        pageid: objid,
                        attrs,
                    });
                }
                _ => {}
            }
        }

        tree
    }

    fn collect_from_fallback(&self) -> Vec<PDFPage> {
        self.get_objids()
            .into_iter()
            .filter_map(|objid| {
                let obj = self.getobj_shared(objid).ok()?;
                if !obj.has_type("Page") {
                    return None;
                }
                Some(PDFPage {
                    pageid: objid,
                    attrs: obj.as_dict().ok()?.clone(),
                })
            })
            .collect()
    }
}

/// Parse a 4-number rectangle, resolving references.
pub fn parse_box(obj: &PDFObject, doc: &PDFDocument) -> Option<[f64; 4]> {
    let resolved = doc.resolve_shared(obj).ok()?;
    let arr = resolved.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let mut out = [0.0; 4];
    for (slot, item) in out.iter_mut().zip(arr) {
        *slot = doc.resolve(item).ok()?.as_num().ok()?;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::dict;

    #[test]
    fn test_inherited_node_apply_to_fills_missing() {
        let root = dict([
            ("MediaBox", PDFObject::name("root")),
            ("Rotate", PDFObject::Int(90)),
        ]);
        let mid = dict([("Resources", PDFObject::name("mid"))]);

        let root_node = InheritedNode::from_dict(None, &root);
        let mid_node = InheritedNode::from_dict(Some(root_node), &mid);

        let mut leaf = dict([("Resources", PDFObject::name("leaf"))]);
        mid_node.apply_to(&mut leaf);

        assert_eq!(leaf.get("Resources"), Some(&PDFObject::name("leaf")));
        assert_eq!(leaf.get("MediaBox"), Some(&PDFObject::name("root")));
        assert_eq!(leaf.get("Rotate"), Some(&PDFObject::Int(90)));
        assert!(!leaf.contains_key("CropBox"));
    }

    #[test]
    fn test_pages_inherit_mediabox_from_tree() {
        let pdf = b"%PDF-1.4
1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj
2 0 obj << /Type /Pages /Kids [3 0 R 4 0 R] /Count 2 /MediaBox [0 0 300 400] >> endobj
3 0 obj << /Type /Page /Parent 2 0 R >> endobj
4 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 10 20] >> endobj
trailer << /Root 1 0 R >>
%%EOF";
        let doc = PDFDocument::new(pdf).unwrap();
        let tree = doc.page_tree();
        assert_eq!(tree.nodes, vec![2]);
        let ids: Vec<u32> = tree.pages.iter().map(|p| p.pageid).collect();
        assert_eq!(ids, vec![3, 4]);
        assert_eq!(tree.pages[0].mediabox(&doc), Some([0.0, 0.0, 300.0, 400.0]));
        assert_eq!(tree.pages[1].mediabox(&doc), Some([0.0, 0.0, 10.0, 20.0]));
    }

    #[test]
    fn test_page_tree_cycle_terminates() {
        let pdf = b"%PDF-1.4
1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj
2 0 obj << /Type /Pages /Kids [2 0 R 3 0 R] /Count 1 >> endobj
3 0 obj << /Type /Page /Parent 2 0 R >> endobj
trailer << /Root 1 0 R >>
%%EOF";
        let doc = PDFDocument::new(pdf).unwrap();
        assert_eq!(doc.page_count(), 1);
    }
}
