//! The destination object graph.
//!
//! - `walk` - bounded traversal shared by every pass
//! - `names` - name tree reading
//! - `merge` - page import from a source [`PDFDocument`](crate::document::PDFDocument)

pub mod merge;
pub mod names;
pub mod walk;

pub use merge::{import_pages, import_pages_with_depth};
pub use names::{embedded_files_root, name_tree_entries};
pub use walk::{
    DEFAULT_MAX_DEPTH, ObjectSource, Visit, WalkControl, WalkReport, reachable_ids, resolve_with,
    walk,
};

use crate::error::{InvariantKind, PackError, PackResult};
use crate::model::{PDFDict, PDFObjRef, PDFObject, dict};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Arena of indirect objects keyed by object number.
///
/// Slot ids are never reused. A slot holding `Null` is a placeholder and
/// is not live.
#[derive(Debug, Clone)]
pub struct ObjectGraph {
    objects: BTreeMap<u32, PDFObject>,
    next_id: u32,
    catalog_id: u32,
    pages_id: u32,
    info_id: u32,
    version: (u8, u8),
}

impl Default for ObjectGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectGraph {
    /// Empty document: catalog, empty page tree root, empty info dictionary.
    pub fn new() -> Self {
        let mut graph = Self {
            objects: BTreeMap::new(),
            next_id: 1,
            catalog_id: 0,
            pages_id: 0,
            info_id: 0,
            version: (1, 4),
        };
        let pages = graph.add_object(PDFObject::Dict(dict([
            ("Type", PDFObject::name("Pages")),
            ("Kids", PDFObject::Array(Vec::new())),
            ("Count", PDFObject::Int(0)),
        ])));
        let catalog = graph.add_object(PDFObject::Dict(dict([
            ("Type", PDFObject::name("Catalog")),
            ("Pages", PDFObject::Ref(pages)),
        ])));
        let info = graph.add_object(PDFObject::Dict(PDFDict::new()));
        graph.pages_id = pages.objid;
        graph.catalog_id = catalog.objid;
        graph.info_id = info.objid;
        graph
    }

    pub fn catalog_id(&self) -> u32 {
        self.catalog_id
    }

    pub fn pages_id(&self) -> u32 {
        self.pages_id
    }

    pub fn info_id(&self) -> u32 {
        self.info_id
    }

    pub fn version(&self) -> (u8, u8) {
        self.version
    }

    pub fn set_version(&mut self, major: u8, minor: u8) {
        self.version = (major, minor);
    }

    /// Store a new indirect object.
    pub fn add_object(&mut self, obj: PDFObject) -> PDFObjRef {
        let objid = self.reserve();
        self.objects.insert(objid, obj);
        PDFObjRef::new(objid, 0)
    }

    /// Allocate an object number holding a `Null` placeholder.
    pub fn reserve(&mut self) -> u32 {
        let objid = self.next_id;
        self.next_id += 1;
        self.objects.insert(objid, PDFObject::Null);
        objid
    }

    /// Replace the object stored under `objid`.
    pub fn set_object(&mut self, objid: u32, obj: PDFObject) {
        if objid >= self.next_id {
            self.next_id = objid + 1;
        }
        self.objects.insert(objid, obj);
    }

    pub fn get(&self, objid: u32) -> Option<&PDFObject> {
        self.objects.get(&objid)
    }

    pub fn get_mut(&mut self, objid: u32) -> Option<&mut PDFObject> {
        self.objects.get_mut(&objid)
    }

    /// True when `objid` holds something other than a placeholder.
    pub fn is_live(&self, objid: u32) -> bool {
        self.objects.get(&objid).is_some_and(|o| !o.is_null())
    }

    /// Follow references until a direct object. Missing slots and
    /// reference loops resolve to `None`.
    pub fn resolve<'a>(&'a self, obj: &'a PDFObject) -> Option<&'a PDFObject> {
        let mut current = obj;
        let mut hops = 0;
        while let PDFObject::Ref(r) = current {
            hops += 1;
            if hops > 32 {
                return None;
            }
            current = self.objects.get(&r.objid)?;
        }
        Some(current)
    }

    /// Resolve and require a dictionary (or stream attributes).
    pub fn resolve_dict<'a>(&'a self, obj: &'a PDFObject) -> Option<&'a PDFDict> {
        self.resolve(obj)?.as_dict().ok()
    }

    /// Object numbers in ascending order.
    pub fn object_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.objects.keys().copied()
    }

    pub fn catalog(&self) -> Option<&PDFDict> {
        self.get(self.catalog_id)?.as_dict().ok()
    }

    /// Mutable catalog dictionary.
    pub fn catalog_mut(&mut self) -> PackResult<&mut PDFDict> {
        let objid = self.catalog_id;
        Self::dict_slot(self.objects.get_mut(&objid), objid)
    }

    pub fn info(&self) -> Option<&PDFDict> {
        self.get(self.info_id)?.as_dict().ok()
    }

    /// Mutable document information dictionary.
    pub fn info_mut(&mut self) -> PackResult<&mut PDFDict> {
        let objid = self.info_id;
        Self::dict_slot(self.objects.get_mut(&objid), objid)
    }

    /// Mutable dictionary stored under `objid`.
    pub fn dict_mut(&mut self, objid: u32) -> PackResult<&mut PDFDict> {
        Self::dict_slot(self.objects.get_mut(&objid), objid)
    }

    fn dict_slot(slot: Option<&mut PDFObject>, objid: u32) -> PackResult<&mut PDFDict> {
        slot.and_then(|obj| obj.as_dict_mut().ok()).ok_or(
            PackError::StructuralInvariantViolated(InvariantKind::DanglingReference { objid }),
        )
    }

    /// Number of leaf pages listed under the page tree root.
    pub fn page_count(&self) -> usize {
        self.get(self.pages_id)
            .and_then(|p| p.as_dict().ok())
            .and_then(|d| d.get("Kids"))
            .and_then(|k| k.as_array().ok())
            .map_or(0, Vec::len)
    }
}

impl ObjectSource for ObjectGraph {
    fn lookup(&self, objid: u32) -> Option<Cow<'_, PDFObject>> {
        self.objects
            .get(&objid)
            .filter(|o| !o.is_null())
            .map(Cow::Borrowed)
    }
}
