//! Serialization of an [`ObjectGraph`] to a complete, non-incremental PDF.
//!
//! - `serializer` - object syntax

pub mod serializer;

pub use serializer::{format_real, render, write_name, write_object, write_string};

use crate::error::{InvariantKind, PackError, PackResult};
use crate::graph::{DEFAULT_MAX_DEPTH, ObjectGraph, reachable_ids};
use crate::model::PDFObject;
use rustc_hash::FxHashMap;
use std::io::Write;

/// Binary marker comment following the header line.
const BINARY_MARKER: &[u8] = b"%\xE2\xE3\xCF\xD3\n";

/// Writes the objects reachable from the catalog and the info dictionary,
/// renumbered densely in object-number order, followed by a classic xref
/// table and a trailer with a content-derived `/ID`.
#[derive(Debug)]
pub struct PdfWriter<'g> {
    graph: &'g ObjectGraph,
    max_depth: usize,
}

impl<'g> PdfWriter<'g> {
    pub fn new(graph: &'g ObjectGraph) -> Self {
        Self {
            graph,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn write(&self) -> PackResult<Vec<u8>> {
        let graph = self.graph;
        let roots = [
            PDFObject::reference(graph.catalog_id()),
            PDFObject::reference(graph.info_id()),
        ];
        let (mut ids, report) = reachable_ids(graph, &roots, self.max_depth);
        if let Some(&objid) = report.missing.first() {
            return Err(PackError::StructuralInvariantViolated(
                InvariantKind::DanglingReference { objid },
            ));
        }
        for path in &report.truncated {
            tracing::warn!(path = %path, "writer reachability stopped at depth limit");
        }
        ids.sort_unstable();

        let renumber: FxHashMap<u32, u32> = ids
            .iter()
            .enumerate()
            .map(|(i, &old)| (old, i as u32 + 1))
            .collect();
        let remap = |objid: u32| renumber.get(&objid).copied();
        let new_id = |objid: u32| {
            remap(objid).ok_or(PackError::StructuralInvariantViolated(
                InvariantKind::DanglingReference { objid },
            ))
        };
        let root = new_id(graph.catalog_id())?;
        let info = new_id(graph.info_id())?;

        let (major, minor) = graph.version();
        let mut out = Vec::new();
        writeln!(out, "%PDF-{major}.{minor}")?;
        out.extend_from_slice(BINARY_MARKER);

        let mut offsets = Vec::with_capacity(ids.len());
        for (i, &old) in ids.iter().enumerate() {
            let obj = graph.get(old).ok_or(PackError::StructuralInvariantViolated(
                InvariantKind::DanglingReference { objid: old },
            ))?;
            offsets.push(out.len());
            writeln!(out, "{} 0 obj", i + 1)?;
            write_object(&mut out, obj, &remap).map_err(PackError::StructuralInvariantViolated)?;
            out.extend_from_slice(b"\nendobj\n");
        }

        let id = format!("{:x}", md5::compute(&out));
        let xref_start = out.len();
        writeln!(out, "xref\n0 {}", ids.len() + 1)?;
        out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in &offsets {
            writeln!(out, "{offset:010} 00000 n ")?;
        }
        write!(
            out,
            "trailer\n<< /Size {} /Root {root} 0 R /Info {info} 0 R /ID [<{id}> <{id}>] >>\nstartxref\n{xref_start}\n%%EOF\n",
            ids.len() + 1
        )?;

        tracing::debug!(objects = ids.len(), bytes = out.len(), "serialized document");
        Ok(out)
    }
}

/// Serialize `graph` with the default depth limit.
pub fn serialize(graph: &ObjectGraph) -> PackResult<Vec<u8>> {
    PdfWriter::new(graph).write()
}
