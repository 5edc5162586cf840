//! PDF Document - read-only access to an existing PDF.
//!
//! Handles:
//! - XRef tables and streams, including `Prev` chains and hybrid files
//! - Object resolution, object streams (ObjStm)
//! - Trailer parsing (catalog, info)
//! - Recovery by scanning for `N G obj` when the xref is unusable

use crate::codec;
use crate::error::{PdfError, Result};
use crate::model::{PDFDict, PDFObjRef, PDFObject, PDFStream};
use crate::parser::PDFParser;
use bytes::Bytes;
use regex::bytes::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::RefCell;
use std::sync::{Arc, Mutex, RwLock};

/// XRef entry - location of an object in the PDF file.
#[derive(Debug, Clone)]
struct XRefEntry {
    /// Byte offset in file (for regular objects) or index in stream (for compressed objects)
    offset: usize,
    /// Whether this is in an object stream
    in_stream: bool,
    /// Object stream ID (if in_stream is true)
    stream_objid: Option<u32>,
}

/// Cross-reference table for locating objects in a PDF.
#[derive(Debug, Default)]
struct XRef {
    offsets: FxHashMap<u32, XRefEntry>,
    trailer: PDFDict,
    /// Whether this xref was loaded via fallback (object scanning)
    is_fallback: bool,
}

impl XRef {
    fn get_pos(&self, objid: u32) -> Option<&XRefEntry> {
        self.offsets.get(&objid)
    }

    fn get_objids(&self) -> impl Iterator<Item = u32> + '_ {
        self.offsets.keys().copied()
    }
}

/// PDF Document - provides access to PDF objects and metadata.
/// Owns its data via Bytes so stream data can be sliced without copying.
pub struct PDFDocument {
    data: Bytes,
    xrefs: Vec<XRef>,
    catalog: PDFDict,
    catalog_ref: Option<PDFObjRef>,
    info: Option<PDFDict>,
    cache: Mutex<FxHashMap<u32, Arc<PDFObject>>>,
    objstm_index: RwLock<Option<FxHashMap<u32, (u32, usize)>>>,
}

impl PDFDocument {
    /// Parse a document from a byte buffer.
    pub fn new<D: AsRef<[u8]>>(data: D) -> Result<Self> {
        Self::from_bytes(Bytes::copy_from_slice(data.as_ref()))
    }

    /// Parse a document from shared bytes without copying.
    pub fn from_bytes(data: Bytes) -> Result<Self> {
        let mut doc = Self {
            data,
            xrefs: Vec::new(),
            catalog: PDFDict::new(),
            catalog_ref: None,
            info: None,
            cache: Mutex::new(FxHashMap::default()),
            objstm_index: RwLock::new(None),
        };
        doc.parse()?;
        Ok(doc)
    }

    /// Raw file bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    fn parse(&mut self) -> Result<()> {
        if self.header_offset().is_none() {
            return Err(PdfError::SyntaxError("missing %PDF- header".into()));
        }

        let startxref = self.find_startxref();

        // Try loading xrefs, fallback if necessary
        let mut loaded = false;
        if let Ok(pos) = startxref
            && self.load_xrefs(pos).is_ok()
            && !self.xrefs.is_empty()
        {
            loaded = true;
        }

        if !loaded {
            tracing::debug!("xref unusable, scanning for objects");
            self.xrefs.clear();
            let xref = self.load_xref_fallback()?;
            self.xrefs.push(xref);
        }

        if self.xrefs.iter().any(|x| x.trailer.contains_key("Encrypt")) {
            return Err(PdfError::EncryptionError(
                "encrypted documents are not supported".into(),
            ));
        }

        self.load_root_and_info();
        if self.catalog_ref.is_none() && !self.all_xrefs_are_fallback() {
            // xref offsets that point nowhere; rescan the file
            if let Ok(xref) = self.load_xref_fallback() {
                self.xrefs.push(xref);
                if let Ok(mut cache) = self.cache.lock() {
                    cache.clear();
                }
                self.load_root_and_info();
            }
        }
        if self.catalog_ref.is_none() {
            self.recover_catalog();
        }
        if self.catalog_ref.is_none() {
            return Err(PdfError::SyntaxError("no document catalog".into()));
        }

        Ok(())
    }

    /// Extract catalog and info from the trailers, newest first.
    fn load_root_and_info(&mut self) {
        for idx in 0..self.xrefs.len() {
            let root = self.xrefs[idx].trailer.get("Root").cloned();
            let info = self.xrefs[idx].trailer.get("Info").cloned();
            if self.catalog_ref.is_none()
                && let Some(PDFObject::Ref(root_ref)) = root
                && let Ok(root_obj) = self.getobj(root_ref.objid)
                && let Ok(dict) = root_obj.as_dict()
            {
                self.catalog = dict.clone();
                self.catalog_ref = Some(root_ref);
            }
            if self.info.is_none()
                && let Some(info_ref) = info
                && let Ok(info_obj) = self.resolve(&info_ref)
                && let Ok(dict) = info_obj.as_dict()
            {
                self.info = Some(dict.clone());
            }
        }
    }

    /// Last resort when no trailer names a usable `/Root`.
    fn recover_catalog(&mut self) {
        for objid in self.get_objids() {
            if let Ok(obj) = self.getobj(objid)
                && obj.has_type("Catalog")
                && let Ok(dict) = obj.as_dict()
            {
                self.catalog = dict.clone();
                self.catalog_ref = Some(PDFObjRef::new(objid, 0));
                return;
            }
        }
    }

    fn header_offset(&self) -> Option<usize> {
        let window = &self.data[..self.data.len().min(1024)];
        window.windows(5).position(|w| w == b"%PDF-")
    }

    /// Version from the `%PDF-M.m` header, if present.
    pub fn header_version(&self) -> Option<(u8, u8)> {
        let start = self.header_offset()? + 5;
        let rest = self.data.get(start..start + 3)?;
        if rest[0].is_ascii_digit() && rest[1] == b'.' && rest[2].is_ascii_digit() {
            Some((rest[0] - b'0', rest[2] - b'0'))
        } else {
            None
        }
    }

    /// Find the startxref position by scanning the last 1024 bytes.
    fn find_startxref(&self) -> Result<usize> {
        let needle = b"startxref";
        let data = &self.data[..];

        if data.len() < needle.len() {
            return Err(PdfError::SyntaxError("PDF too small".into()));
        }
        let search_start = data.len().saturating_sub(1024);
        let Some(i) = data[search_start..]
            .windows(needle.len())
            .rposition(|w| w == needle)
            .map(|p| search_start + p)
        else {
            return Err(PdfError::NoValidXRef);
        };

        let rest = &data[i + needle.len()..];
        let start = skip_ws(rest, 0);
        let (pos, _) = read_number(&rest[start..]).map_err(|_| PdfError::NoValidXRef)?;
        if pos < 0 || pos as usize >= data.len() {
            return Err(PdfError::NoValidXRef);
        }
        Ok(pos as usize)
    }

    /// Load xref tables starting from given position.
    fn load_xrefs(&mut self, mut pos: usize) -> Result<()> {
        let mut visited = FxHashSet::default();

        while visited.insert(pos) {
            let xref = self.load_xref_at(pos)?;

            // Hybrid-reference files carry an extra xref stream
            let xref_stm = xref
                .trailer
                .get("XRefStm")
                .and_then(|p| p.as_int().ok())
                .and_then(|n| usize::try_from(n).ok());
            let prev = xref
                .trailer
                .get("Prev")
                .and_then(|p| p.as_int().ok())
                .and_then(|n| usize::try_from(n).ok());

            self.xrefs.push(xref);

            if let Some(xref_stm_pos) = xref_stm
                && visited.insert(xref_stm_pos)
                && let Ok(xref_stm) = self.load_xref_stream(xref_stm_pos)
            {
                self.xrefs.push(xref_stm);
            }

            match prev {
                Some(prev_pos) if prev_pos < self.data.len() => pos = prev_pos,
                _ => break,
            }
        }

        Ok(())
    }

    fn load_xref_at(&self, pos: usize) -> Result<XRef> {
        let data = self
            .data
            .get(pos..)
            .ok_or(PdfError::NoValidXRef)?;
        let start = skip_ws(data, 0);

        if data[start..].starts_with(b"xref") {
            self.load_traditional_xref(pos + start)
        } else {
            self.load_xref_stream(pos + start)
        }
    }

    /// Load traditional xref table.
    fn load_traditional_xref(&self, pos: usize) -> Result<XRef> {
        let mut xref = XRef::default();
        let data = &self.data[pos..];

        let mut cursor = 4; // "xref"

        // Parse xref sections until we hit "trailer"
        loop {
            cursor = skip_ws(data, cursor);
            if cursor >= data.len() {
                break;
            }
            if data[cursor..].starts_with(b"trailer") {
                cursor += 7;
                break;
            }

            let (start_objid, consumed) = read_number(&data[cursor..])?;
            cursor += consumed;
            cursor = skip_ws(data, cursor);
            let (count, consumed) = read_number(&data[cursor..])?;
            cursor += consumed;
            cursor = next_line(data, cursor);

            let mut base_objid = start_objid;
            for i in 0..count {
                // Nominally 20 bytes per entry, parsed flexibly
                let (offset, consumed) = read_number(&data[cursor..])?;
                cursor += consumed;
                cursor = skip_spaces(data, cursor);
                let (genno, consumed) = read_number(&data[cursor..])?;
                cursor += consumed;
                cursor = skip_spaces(data, cursor);

                let marker = data.get(cursor).copied().unwrap_or(b'f');
                cursor = (cursor + 1).min(data.len());

                // Subsection declared from 1 but still listing the object 0
                // free entry: shift so the entries line up.
                if i == 0 && base_objid > 0 && marker == b'f' && offset == 0 && genno == 65535 {
                    base_objid -= 1;
                }

                let objid = base_objid.checked_add(i).and_then(|n| u32::try_from(n).ok());
                cursor = next_line(data, cursor);

                if marker == b'n'
                    && let Some(objid) = objid
                    && let Ok(offset) = usize::try_from(offset)
                {
                    xref.offsets.insert(
                        objid,
                        XRefEntry {
                            offset,
                            in_stream: false,
                            stream_objid: None,
                        },
                    );
                }
            }
        }

        let cursor = skip_ws(data, cursor);
        if data[cursor..].starts_with(b"<<") {
            let mut parser = PDFParser::new(&data[cursor..]);
            if let Ok(PDFObject::Dict(dict)) = parser.parse_object() {
                xref.trailer = dict;
            }
        }

        Ok(xref)
    }

    /// Load xref stream (PDF 1.5+).
    fn load_xref_stream(&self, pos: usize) -> Result<XRef> {
        let obj = self.parse_object_at(pos, false)?;
        let stream = obj.as_stream()?;
        if !obj.has_type("XRef") {
            return Err(PdfError::SyntaxError(format!(
                "object at {pos} is not an xref stream"
            )));
        }

        let w_arr = stream
            .get("W")
            .ok_or_else(|| PdfError::SyntaxError("missing W in xref stream".into()))?
            .as_array()?;
        if w_arr.len() != 3 {
            return Err(PdfError::SyntaxError("W must have 3 elements".into()));
        }
        let w0 = to_usize(w_arr[0].as_int()?, "W")?;
        let w1 = to_usize(w_arr[1].as_int()?, "W")?;
        let w2 = to_usize(w_arr[2].as_int()?, "W")?;
        let entry_size = w0
            .checked_add(w1)
            .and_then(|n| n.checked_add(w2))
            .ok_or_else(|| PdfError::SyntaxError("W overflows in xref stream".into()))?;
        if entry_size == 0 {
            return Err(PdfError::SyntaxError("empty W in xref stream".into()));
        }

        let size = stream
            .get("Size")
            .ok_or_else(|| PdfError::SyntaxError("missing Size in xref stream".into()))?
            .as_int()?;
        let size = to_usize(size, "Size")?;

        // Index defaults to [0 Size]
        let index = match stream.get("Index") {
            Some(idx) => {
                let arr = idx.as_array()?;
                let mut pairs = Vec::with_capacity(arr.len() / 2);
                for pair in arr.chunks_exact(2) {
                    let start = u32::try_from(pair[0].as_int()?).map_err(|_| {
                        PdfError::SyntaxError("Index start out of range".into())
                    })?;
                    pairs.push((start, to_usize(pair[1].as_int()?, "Index count")?));
                }
                pairs
            }
            None => vec![(0, size)],
        };

        let data = self.decode_stream(stream)?;

        let mut xref = XRef::default();
        let mut entries = data.chunks_exact(entry_size);

        'sections: for (start_objid, count) in index {
            for i in 0..count {
                let Some(entry) = entries.next() else {
                    break 'sections;
                };
                let Some(objid) = u32::try_from(i)
                    .ok()
                    .and_then(|i| start_objid.checked_add(i))
                else {
                    return Err(PdfError::SyntaxError(format!(
                        "xref stream section at {start_objid} exceeds object number range"
                    )));
                };

                // Type defaults to 1 when W[0] is 0
                let obj_type = if w0 > 0 {
                    read_bytes_as_int(&entry[..w0])
                } else {
                    1
                };
                let field1 = read_bytes_as_int(&entry[w0..w0 + w1]);
                let field2 = read_bytes_as_int(&entry[w0 + w1..]);

                match obj_type {
                    1 => {
                        let Ok(offset) = usize::try_from(field1) else {
                            continue;
                        };
                        xref.offsets.insert(
                            objid,
                            XRefEntry {
                                offset,
                                in_stream: false,
                                stream_objid: None,
                            },
                        );
                    }
                    2 => {
                        let (Ok(index), Ok(stream_objid)) =
                            (usize::try_from(field2), u32::try_from(field1))
                        else {
                            continue;
                        };
                        xref.offsets.insert(
                            objid,
                            XRefEntry {
                                offset: index,
                                in_stream: true,
                                stream_objid: Some(stream_objid),
                            },
                        );
                    }
                    _ => {}
                }
            }
        }

        for (key, value) in &stream.attrs {
            if !matches!(
                key.as_str(),
                "Length" | "Filter" | "DecodeParms" | "W" | "Index" | "Type"
            ) {
                xref.trailer.insert(key.clone(), value.clone());
            }
        }

        Ok(xref)
    }

    /// Fallback xref loading: scan file for "N M obj" patterns.
    fn load_xref_fallback(&self) -> Result<XRef> {
        let mut xref = XRef {
            is_fallback: true,
            ..XRef::default()
        };

        for (objid, _, pos) in scan_object_headers(&self.data) {
            // later definitions win, as with incremental updates
            xref.offsets.insert(
                objid,
                XRefEntry {
                    offset: pos,
                    in_stream: false,
                    stream_objid: None,
                },
            );
        }

        if let Some(trailer_pos) = self.find_trailer() {
            let cursor = skip_ws(&self.data, trailer_pos + 7);
            if self.data[cursor..].starts_with(b"<<") {
                let mut parser = PDFParser::new(&self.data[cursor..]);
                if let Ok(PDFObject::Dict(dict)) = parser.parse_object() {
                    xref.trailer = dict;
                }
            }
        }

        if xref.offsets.is_empty() {
            return Err(PdfError::NoValidXRef);
        }

        Ok(xref)
    }

    /// Find the last "trailer" keyword.
    fn find_trailer(&self) -> Option<usize> {
        self.data.windows(7).rposition(|w| w == b"trailer")
    }

    /// Get an object by ID.
    pub fn getobj(&self, objid: u32) -> Result<PDFObject> {
        Ok((*self.getobj_shared(objid)?).clone())
    }

    /// Get an object by ID without cloning the cached object.
    pub fn getobj_shared(&self, objid: u32) -> Result<Arc<PDFObject>> {
        if objid == 0 {
            return Err(PdfError::ObjectNotFound(0));
        }

        // Per-thread set of objects being resolved, to stop /Length cycles
        thread_local! {
            static RESOLVING: RefCell<FxHashSet<u32>> = RefCell::new(FxHashSet::default());
        }

        struct ResolvingGuard {
            objid: u32,
        }

        impl Drop for ResolvingGuard {
            fn drop(&mut self) {
                RESOLVING.with(|set| {
                    set.borrow_mut().remove(&self.objid);
                });
            }
        }

        if let Ok(cache) = self.cache.lock()
            && let Some(obj) = cache.get(&objid)
        {
            return Ok(Arc::clone(obj));
        }

        let is_circular = RESOLVING.with(|set| !set.borrow_mut().insert(objid));
        if is_circular {
            return Err(PdfError::SyntaxError(format!(
                "circular reference detected for obj {objid}"
            )));
        }
        let _guard = ResolvingGuard { objid };

        for xref in &self.xrefs {
            let Some(entry) = xref.get_pos(objid) else {
                continue;
            };
            let parsed = if entry.in_stream {
                match entry.stream_objid {
                    Some(stream_objid) => self.parse_object_from_stream(stream_objid, entry.offset),
                    None => continue,
                }
            } else {
                self.parse_object_at(entry.offset, xref.is_fallback)
            };
            // A bad entry in a newer section may still be found in an older one
            let Ok(obj) = parsed else {
                continue;
            };

            let obj = Arc::new(obj);
            if let Ok(mut cache) = self.cache.lock() {
                cache.insert(objid, Arc::clone(&obj));
            }
            return Ok(obj);
        }

        // Objects missing from an incomplete xref may still live in an ObjStm.
        if !self.all_xrefs_are_fallback()
            && let Ok(Some(obj)) = self.find_obj_in_objstms(objid)
        {
            let obj = Arc::new(obj);
            if let Ok(mut cache) = self.cache.lock() {
                cache.insert(objid, Arc::clone(&obj));
            }
            return Ok(obj);
        }

        Err(PdfError::ObjectNotFound(objid))
    }

    /// Fallback scan for an object inside any ObjStm stream.
    fn find_obj_in_objstms(&self, objid: u32) -> Result<Option<PDFObject>> {
        if let Ok(index_guard) = self.objstm_index.read()
            && let Some(index) = index_guard.as_ref()
        {
            return match index.get(&objid).copied() {
                Some((stream_objid, idx)) => {
                    Ok(Some(self.parse_object_from_stream(stream_objid, idx)?))
                }
                None => Ok(None),
            };
        }

        let mut index: FxHashMap<u32, (u32, usize)> = FxHashMap::default();
        for (stream_objid, _, pos) in scan_object_headers(&self.data) {
            let Ok(obj) = self.parse_object_at(pos, true) else {
                continue;
            };
            if !obj.has_type("ObjStm") {
                continue;
            }
            let Ok(stream) = obj.as_stream() else {
                continue;
            };
            let Ok((data, first, n)) = self.objstm_header(stream) else {
                continue;
            };
            let mut header_parser = PDFParser::new(&data[..first]);
            for i in 0..n {
                let Ok(obj_id) = header_parser.parse_object().and_then(|o| o.as_int()) else {
                    break;
                };
                if header_parser.parse_object().is_err() {
                    break;
                }
                if let Ok(obj_id) = u32::try_from(obj_id) {
                    index.entry(obj_id).or_insert((stream_objid, i));
                }
            }
        }

        let found = index.get(&objid).copied();
        if let Ok(mut index_guard) = self.objstm_index.write() {
            *index_guard = Some(index);
        }

        match found {
            Some((stream_objid, idx)) => Ok(Some(self.parse_object_from_stream(stream_objid, idx)?)),
            None => Ok(None),
        }
    }

    /// Decoded ObjStm data with its `/First` offset and `/N` count.
    fn objstm_header(&self, stream: &PDFStream) -> Result<(Vec<u8>, usize, usize)> {
        let data = self.decode_stream(stream)?;
        let n = stream
            .get("N")
            .ok_or_else(|| PdfError::SyntaxError("missing N in ObjStm".into()))?
            .as_int()?;
        let n = to_usize(n, "N")?;
        let first = stream
            .get("First")
            .ok_or_else(|| PdfError::SyntaxError("missing First in ObjStm".into()))?
            .as_int()?;
        let first = to_usize(first, "First")?;
        if first > data.len() {
            return Err(PdfError::SyntaxError("ObjStm First beyond data".into()));
        }
        Ok((data, first, n))
    }

    /// Parse an object from an object stream (ObjStm).
    fn parse_object_from_stream(&self, stream_objid: u32, index: usize) -> Result<PDFObject> {
        let stream_obj = self.getobj_shared(stream_objid)?;
        let stream = stream_obj.as_stream()?;
        let (data, first, n) = self.objstm_header(stream)?;

        if index >= n {
            return Err(PdfError::SyntaxError(format!("index {index} >= N {n}")));
        }

        // Header: objid1 offset1 objid2 offset2 ...
        let mut header_parser = PDFParser::new(&data[..first]);
        let mut offset = 0;
        for _ in 0..=index {
            header_parser.parse_object()?.as_int()?;
            offset = to_usize(header_parser.parse_object()?.as_int()?, "ObjStm offset")?;
        }

        let obj_offset = first.checked_add(offset).unwrap_or(usize::MAX);
        if obj_offset >= data.len() {
            return Err(PdfError::SyntaxError(format!(
                "ObjStm {stream_objid} offset {obj_offset} out of range"
            )));
        }
        PDFParser::new(&data[obj_offset..]).parse_object()
    }

    /// Parse an indirect object at the given offset.
    fn parse_object_at(&self, offset: usize, fallback: bool) -> Result<PDFObject> {
        if offset >= self.data.len() {
            return Err(PdfError::SyntaxError(format!(
                "object offset {} exceeds file size {}",
                offset,
                self.data.len()
            )));
        }

        let mut parser = PDFParser::new_at(&self.data, offset);
        parser.parse_object_header()?;
        let obj = parser.parse_object()?;

        let PDFObject::Dict(dict) = obj else {
            return Ok(obj);
        };

        // Stream keyword follows the dictionary?
        let mut pos = skip_ws(&self.data, parser.tell());
        if !self.data[pos..].starts_with(b"stream") {
            return Ok(PDFObject::Dict(dict));
        }
        pos += 6;
        if self.data.get(pos) == Some(&b'\r') {
            pos += 1;
        }
        if self.data.get(pos) == Some(&b'\n') {
            pos += 1;
        }
        let stream_start = pos;

        // XRef and ObjStm streams are located by scanning for endstream.
        let force_scan = matches!(
            dict.get("Type"),
            Some(PDFObject::Name(name)) if name == "XRef" || name == "ObjStm"
        );

        let length = if fallback || force_scan {
            None
        } else {
            dict.get("Length")
                .and_then(|len_obj| self.resolve(len_obj).ok())
                .and_then(|resolved| resolved.as_int().ok())
                .and_then(|len| usize::try_from(len).ok())
        };

        let end = match length.and_then(|len| stream_start.checked_add(len)) {
            // Trust declared /Length when endstream follows it
            Some(end) if self.endstream_follows(end) => end,
            _ => find_endstream(&self.data[stream_start..])
                .map(|end| stream_start + end)
                .unwrap_or(self.data.len()),
        };

        Ok(PDFObject::from(PDFStream::new(
            dict,
            self.data.slice(stream_start..end),
        )))
    }

    fn endstream_follows(&self, pos: usize) -> bool {
        pos <= self.data.len() && self.data[skip_ws(&self.data, pos)..].starts_with(b"endstream")
    }

    /// Decode a stream's data through its `/Filter` chain.
    pub fn decode_stream(&self, stream: &PDFStream) -> Result<Vec<u8>> {
        let filters = match stream.get("Filter").map(|f| self.resolve(f)).transpose()? {
            None | Some(PDFObject::Null) => Vec::new(),
            Some(PDFObject::Name(name)) => vec![name],
            Some(PDFObject::Array(arr)) => arr
                .iter()
                .map(|f| self.resolve(f).and_then(|f| f.as_name().map(str::to_string)))
                .collect::<Result<_>>()?,
            Some(other) => {
                return Err(PdfError::TypeError {
                    expected: "name or array",
                    got: other.type_name(),
                });
            }
        };
        if filters.is_empty() {
            return Ok(stream.get_rawdata().to_vec());
        }

        let parms: Vec<Option<PDFDict>> = match stream.get("DecodeParms").map(|p| self.resolve(p)) {
            Some(Ok(PDFObject::Dict(d))) => vec![Some(d)],
            Some(Ok(PDFObject::Array(arr))) => arr
                .iter()
                .map(|p| match self.resolve(p) {
                    Ok(PDFObject::Dict(d)) => Some(d),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };

        let mut output = stream.get_rawdata().to_vec();
        for (i, filter) in filters.iter().enumerate() {
            let parm = parms.get(i).and_then(|p| p.as_ref());
            output = codec::apply_filter(&output, filter, parm)?;
        }
        Ok(output)
    }

    /// Get document catalog.
    pub const fn catalog(&self) -> &PDFDict {
        &self.catalog
    }

    /// Reference to the catalog object.
    pub fn catalog_ref(&self) -> Option<PDFObjRef> {
        self.catalog_ref
    }

    /// Get the document information dictionary, if any.
    pub fn info(&self) -> Option<&PDFDict> {
        self.info.as_ref()
    }

    /// The most recent trailer dictionary.
    pub fn trailer(&self) -> Option<&PDFDict> {
        self.xrefs.first().map(|x| &x.trailer)
    }

    /// True when every xref came from scanning rather than a real table.
    pub fn all_xrefs_are_fallback(&self) -> bool {
        self.xrefs.iter().all(|x| x.is_fallback)
    }

    /// Resolve a reference to its actual object.
    pub fn resolve(&self, obj: &PDFObject) -> Result<PDFObject> {
        Ok((*self.resolve_shared(obj)?).clone())
    }

    /// Resolve a reference to its actual object without cloning.
    pub fn resolve_shared(&self, obj: &PDFObject) -> Result<Arc<PDFObject>> {
        let mut seen = FxHashSet::default();
        let mut current = match obj {
            PDFObject::Ref(r) => {
                seen.insert(r.objid);
                self.getobj_shared(r.objid)?
            }
            _ => return Ok(Arc::new(obj.clone())),
        };
        while let PDFObject::Ref(r) = current.as_ref() {
            if !seen.insert(r.objid) {
                return Err(PdfError::SyntaxError(format!(
                    "circular reference detected for obj {}",
                    r.objid
                )));
            }
            current = self.getobj_shared(r.objid)?;
        }
        Ok(current)
    }

    /// Get all object IDs from xrefs.
    pub fn get_objids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.xrefs.iter().flat_map(|x| x.get_objids()).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// `(objid, genno, offset)` for every `N G obj` header in the file.
fn scan_object_headers(data: &[u8]) -> Vec<(u32, u32, usize)> {
    static OBJ_HEADER: once_cell::sync::Lazy<Option<Regex>> =
        once_cell::sync::Lazy::new(|| Regex::new(r"(\d+)\s+(\d+)\s+obj\b").ok());

    let Some(re) = OBJ_HEADER.as_ref() else {
        return Vec::new();
    };
    re.captures_iter(data)
        .filter_map(|cap| {
            let objid = std::str::from_utf8(cap.get(1)?.as_bytes())
                .ok()?
                .parse::<u32>()
                .ok()?;
            let genno = std::str::from_utf8(cap.get(2)?.as_bytes())
                .ok()?
                .parse::<u32>()
                .ok()?;
            Some((objid, genno, cap.get(0)?.start()))
        })
        .collect()
}

fn is_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x00' | b'\x0c')
}

fn skip_ws(data: &[u8], mut pos: usize) -> usize {
    while pos < data.len() && is_ws(data[pos]) {
        pos += 1;
    }
    pos.min(data.len())
}

fn skip_spaces(data: &[u8], mut pos: usize) -> usize {
    while pos < data.len() && data[pos] == b' ' {
        pos += 1;
    }
    pos
}

/// Advance past the rest of the current line and its terminator.
fn next_line(data: &[u8], mut pos: usize) -> usize {
    while pos < data.len() && data[pos] != b'\n' && data[pos] != b'\r' {
        pos += 1;
    }
    while pos < data.len() && (data[pos] == b'\n' || data[pos] == b'\r') {
        pos += 1;
    }
    pos
}

/// Read a decimal number from data, return (value, bytes_consumed).
fn read_number(data: &[u8]) -> Result<(i64, usize)> {
    let negative = data.first() == Some(&b'-');
    let start = usize::from(negative);
    let mut pos = start;
    while pos < data.len() && data[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos == start {
        return Err(PdfError::SyntaxError("expected number".into()));
    }

    let num: i64 = std::str::from_utf8(&data[start..pos])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| PdfError::SyntaxError("invalid number".into()))?;

    Ok((if negative { -num } else { num }, pos))
}

/// Convert a count or offset read from the file, rejecting negatives.
fn to_usize(value: i64, what: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| PdfError::SyntaxError(format!("invalid {what}: {value}")))
}

fn read_bytes_as_int(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |val, &b| (val << 8) | b as u64)
}

/// Offset of `endstream` with preceding EOL whitespace trimmed.
fn find_endstream(data: &[u8]) -> Option<usize> {
    let needle = b"endstream";
    let pos = data.windows(needle.len()).position(|w| w == needle)?;
    let mut end = pos;
    while end > 0 && matches!(data[end - 1], b'\n' | b'\r') {
        end -= 1;
    }
    Some(end)
}
