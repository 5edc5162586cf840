//! Bounded traversal over an object graph.
//!
//! Every pass that walks objects (stray-key cleanup, reachability for the
//! writer, page import, the diagnostic scan, validation) goes through
//! [`walk`], so cycles and runaway nesting are handled in one place.

use crate::document::PDFDocument;
use crate::model::PDFObject;
use rustc_hash::FxHashSet;
use std::borrow::Cow;

/// Default nesting limit for a walk.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Anything that can resolve an object number to an object.
pub trait ObjectSource {
    /// The live object stored under `objid`, if any.
    fn lookup(&self, objid: u32) -> Option<Cow<'_, PDFObject>>;
}

impl ObjectSource for PDFDocument {
    fn lookup(&self, objid: u32) -> Option<Cow<'_, PDFObject>> {
        match self.getobj(objid) {
            Ok(PDFObject::Null) | Err(_) => None,
            Ok(obj) => Some(Cow::Owned(obj)),
        }
    }
}

/// Follow references through `source` until a direct object.
pub fn resolve_with<'s, S>(source: &'s S, obj: &PDFObject) -> Option<Cow<'s, PDFObject>>
where
    S: ObjectSource + ?Sized,
{
    let mut current = match obj {
        PDFObject::Ref(r) => source.lookup(r.objid)?,
        other => return Some(Cow::Owned(other.clone())),
    };
    for _ in 0..32 {
        let next = match current.as_ref() {
            PDFObject::Ref(r) => r.objid,
            _ => return Some(current),
        };
        current = source.lookup(next)?;
    }
    None
}

/// One node seen during a walk.
#[derive(Debug)]
pub struct Visit<'a> {
    /// Slash-separated key path from the root, e.g. `Catalog/Names/EmbeddedFiles`.
    pub path: &'a str,
    /// Dictionary key or array index that led here, if any.
    pub key: Option<&'a str>,
    pub depth: usize,
    /// Object number when this node was reached through a reference.
    pub objid: Option<u32>,
    /// Innermost indirect object containing this node.
    pub owner: Option<u32>,
    pub node: &'a PDFObject,
}

/// Whether to descend into the node just visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    Descend,
    Skip,
}

/// What the walk could not fully cover.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WalkReport {
    /// Paths where the depth limit stopped the walk.
    pub truncated: Vec<String>,
    /// Referenced object numbers that resolved to nothing.
    pub missing: Vec<u32>,
    /// Distinct indirect objects visited.
    pub visited: usize,
}

struct Walker<'s, S: ?Sized, F> {
    source: &'s S,
    max_depth: usize,
    seen: FxHashSet<u32>,
    report: WalkReport,
    visit: F,
}

impl<S, F> Walker<'_, S, F>
where
    S: ObjectSource + ?Sized,
    F: FnMut(&Visit<'_>) -> WalkControl,
{
    fn node(
        &mut self,
        obj: &PDFObject,
        path: &str,
        key: Option<&str>,
        depth: usize,
        owner: Option<u32>,
    ) {
        if let PDFObject::Ref(r) = obj {
            if !self.seen.insert(r.objid) {
                return;
            }
            let source = self.source;
            let Some(target) = source.lookup(r.objid) else {
                self.report.missing.push(r.objid);
                return;
            };
            self.report.visited += 1;
            self.resolved(&target, path, key, depth, Some(r.objid), Some(r.objid));
        } else {
            self.resolved(obj, path, key, depth, None, owner);
        }
    }

    fn resolved(
        &mut self,
        obj: &PDFObject,
        path: &str,
        key: Option<&str>,
        depth: usize,
        objid: Option<u32>,
        owner: Option<u32>,
    ) {
        let control = (self.visit)(&Visit {
            path,
            key,
            depth,
            objid,
            owner,
            node: obj,
        });
        if control == WalkControl::Skip {
            return;
        }

        let has_children = match obj {
            PDFObject::Array(arr) => !arr.is_empty(),
            PDFObject::Dict(d) => !d.is_empty(),
            PDFObject::Stream(s) => !s.attrs.is_empty(),
            _ => false,
        };
        if !has_children {
            return;
        }
        if depth >= self.max_depth {
            self.report.truncated.push(path.to_string());
            return;
        }

        match obj {
            PDFObject::Array(arr) => {
                for (i, item) in arr.iter().enumerate() {
                    let index = format!("[{i}]");
                    let child = format!("{path}{index}");
                    self.node(item, &child, Some(&index), depth + 1, owner);
                }
            }
            PDFObject::Dict(_) | PDFObject::Stream(_) => {
                let Ok(dict) = obj.as_dict() else {
                    return;
                };
                for (k, v) in dict {
                    let child = format!("{path}/{k}");
                    self.node(v, &child, Some(k), depth + 1, owner);
                }
            }
            _ => {}
        }
    }
}

/// Depth-first walk from `root`, following references at most once each.
///
/// `visit` sees every node after reference resolution and decides whether
/// its children are explored.
pub fn walk<S, F>(
    source: &S,
    root: &PDFObject,
    root_path: &str,
    max_depth: usize,
    visit: F,
) -> WalkReport
where
    S: ObjectSource + ?Sized,
    F: FnMut(&Visit<'_>) -> WalkControl,
{
    let mut walker = Walker {
        source,
        max_depth,
        seen: FxHashSet::default(),
        report: WalkReport::default(),
        visit,
    };
    walker.node(root, root_path, None, 0, None);
    walker.report
}

/// Object numbers reachable from `roots`, in first-visit order.
pub fn reachable_ids<S>(source: &S, roots: &[PDFObject], max_depth: usize) -> (Vec<u32>, WalkReport)
where
    S: ObjectSource + ?Sized,
{
    let mut ids = Vec::new();
    let mut seen = FxHashSet::default();
    let mut combined = WalkReport::default();
    for root in roots {
        let report = walk(source, root, "", max_depth, |v| {
            if let Some(id) = v.objid
                && seen.insert(id)
            {
                ids.push(id);
            }
            WalkControl::Descend
        });
        combined.truncated.extend(report.truncated);
        combined.missing.extend(report.missing);
        combined.visited += report.visited;
    }
    (ids, combined)
}
