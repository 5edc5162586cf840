//! PDF object types.
//!
//! Shared by the read-only [`PDFDocument`](crate::document::PDFDocument)
//! and the mutable [`ObjectGraph`](crate::graph::ObjectGraph).

use crate::error::{PdfError, Result};
use bytes::Bytes;
use indexmap::IndexMap;

/// Insertion-ordered dictionary, so serialized output is deterministic.
pub type PDFDict = IndexMap<String, PDFObject>;

/// PDF Object types - the fundamental value type in PDF.
#[derive(Debug, Clone, PartialEq)]
pub enum PDFObject {
    /// Null object
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Real (floating point) value
    Real(f64),
    /// Name object (e.g., /Type, /Filespec)
    Name(String),
    /// String (byte array)
    String(Vec<u8>),
    /// Array of objects
    Array(Vec<Self>),
    /// Dictionary (name -> object mapping)
    Dict(PDFDict),
    /// Stream (dictionary + binary data)
    Stream(Box<PDFStream>),
    /// Indirect object reference
    Ref(PDFObjRef),
}

impl PDFObject {
    /// Name object from a string slice.
    pub fn name(name: &str) -> Self {
        Self::Name(name.to_string())
    }

    /// Byte string from ASCII text.
    pub fn string(text: &str) -> Self {
        Self::String(text.as_bytes().to_vec())
    }

    /// Text string, UTF-16BE with BOM when the text is not plain ASCII.
    pub fn text(text: &str) -> Self {
        Self::String(super::text::encode_text_string(text))
    }

    /// Indirect reference to generation 0 of `objid`.
    pub const fn reference(objid: u32) -> Self {
        Self::Ref(PDFObjRef::new(objid, 0))
    }

    /// Check if this is a null object
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get as boolean
    pub const fn as_bool(&self) -> Result<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            _ => Err(PdfError::TypeError {
                expected: "bool",
                got: self.type_name(),
            }),
        }
    }

    /// Get as integer
    pub const fn as_int(&self) -> Result<i64> {
        match self {
            Self::Int(n) => Ok(*n),
            _ => Err(PdfError::TypeError {
                expected: "int",
                got: self.type_name(),
            }),
        }
    }

    /// Get numeric value (int or real coerced to f64)
    pub const fn as_num(&self) -> Result<f64> {
        match self {
            Self::Int(n) => Ok(*n as f64),
            Self::Real(n) => Ok(*n),
            _ => Err(PdfError::TypeError {
                expected: "number",
                got: self.type_name(),
            }),
        }
    }

    /// Get as name string
    pub fn as_name(&self) -> Result<&str> {
        match self {
            Self::Name(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "name",
                got: self.type_name(),
            }),
        }
    }

    /// Get as byte string
    pub fn as_string(&self) -> Result<&[u8]> {
        match self {
            Self::String(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "string",
                got: self.type_name(),
            }),
        }
    }

    /// Get as array
    pub const fn as_array(&self) -> Result<&Vec<Self>> {
        match self {
            Self::Array(arr) => Ok(arr),
            _ => Err(PdfError::TypeError {
                expected: "array",
                got: self.type_name(),
            }),
        }
    }

    /// Get as mutable array
    pub fn as_array_mut(&mut self) -> Result<&mut Vec<Self>> {
        match self {
            Self::Array(arr) => Ok(arr),
            other => Err(PdfError::TypeError {
                expected: "array",
                got: other.type_name(),
            }),
        }
    }

    /// Get as dictionary. Streams expose their attribute dictionary.
    pub fn as_dict(&self) -> Result<&PDFDict> {
        match self {
            Self::Dict(d) => Ok(d),
            Self::Stream(s) => Ok(&s.attrs),
            _ => Err(PdfError::TypeError {
                expected: "dict",
                got: self.type_name(),
            }),
        }
    }

    /// Get as mutable dictionary. Streams expose their attribute dictionary.
    pub fn as_dict_mut(&mut self) -> Result<&mut PDFDict> {
        match self {
            Self::Dict(d) => Ok(d),
            Self::Stream(s) => Ok(&mut s.attrs),
            other => Err(PdfError::TypeError {
                expected: "dict",
                got: other.type_name(),
            }),
        }
    }

    /// Get as stream
    pub fn as_stream(&self) -> Result<&PDFStream> {
        match self {
            Self::Stream(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "stream",
                got: self.type_name(),
            }),
        }
    }

    /// Get as object reference
    pub const fn as_ref(&self) -> Result<&PDFObjRef> {
        match self {
            Self::Ref(r) => Ok(r),
            _ => Err(PdfError::TypeError {
                expected: "ref",
                got: self.type_name(),
            }),
        }
    }

    /// Get type name for error messages
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Real(_) => "real",
            Self::Name(_) => "name",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Dict(_) => "dict",
            Self::Stream(_) => "stream",
            Self::Ref(_) => "ref",
        }
    }

    /// True when this is a dictionary (or stream) whose `/Type` is `type_name`.
    pub fn has_type(&self, type_name: &str) -> bool {
        matches!(
            self.as_dict().ok().and_then(|d| d.get("Type")),
            Some(Self::Name(n)) if n == type_name
        )
    }
}

impl From<PDFDict> for PDFObject {
    fn from(dict: PDFDict) -> Self {
        Self::Dict(dict)
    }
}

impl From<PDFStream> for PDFObject {
    fn from(stream: PDFStream) -> Self {
        Self::Stream(Box::new(stream))
    }
}

impl From<PDFObjRef> for PDFObject {
    fn from(r: PDFObjRef) -> Self {
        Self::Ref(r)
    }
}

/// PDF indirect object reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PDFObjRef {
    /// Object ID
    pub objid: u32,
    /// Generation number
    pub genno: u32,
}

impl PDFObjRef {
    /// Create a new object reference.
    pub const fn new(objid: u32, genno: u32) -> Self {
        Self { objid, genno }
    }
}

impl std::fmt::Display for PDFObjRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.objid, self.genno)
    }
}

/// PDF Stream - dictionary attributes + raw (possibly encoded) data.
#[derive(Debug, Clone, PartialEq)]
pub struct PDFStream {
    /// Stream dictionary attributes
    pub attrs: PDFDict,
    rawdata: Bytes,
}

impl PDFStream {
    /// Create a new stream.
    pub fn new(attrs: PDFDict, rawdata: impl Into<Bytes>) -> Self {
        Self {
            attrs,
            rawdata: rawdata.into(),
        }
    }

    /// Get raw (undecoded) data.
    pub fn get_rawdata(&self) -> &[u8] {
        self.rawdata.as_ref()
    }

    /// Get raw data as shared bytes.
    pub fn rawdata_bytes(&self) -> Bytes {
        self.rawdata.clone()
    }

    /// Replace the raw data. `/Length` is recomputed by the writer.
    pub fn set_rawdata(&mut self, data: impl Into<Bytes>) {
        self.rawdata = data.into();
    }

    /// Length of the raw data in bytes.
    pub fn len(&self) -> usize {
        self.rawdata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rawdata.is_empty()
    }

    /// Check if stream contains a key.
    pub fn contains(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Get attribute by name.
    pub fn get(&self, name: &str) -> Option<&PDFObject> {
        self.attrs.get(name)
    }

    /// True when the stream declares a `/Filter`.
    pub fn has_filters(&self) -> bool {
        self.attrs.get("Filter").is_some_and(|f| match f {
            PDFObject::Array(arr) => !arr.is_empty(),
            PDFObject::Null => false,
            _ => true,
        })
    }
}

/// Build a dictionary from `(key, value)` pairs, keeping their order.
pub fn dict<I, K>(entries: I) -> PDFDict
where
    I: IntoIterator<Item = (K, PDFObject)>,
    K: Into<String>,
{
    entries.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_exposes_attrs_as_dict() {
        let stream = PDFStream::new(dict([("Type", PDFObject::name("Metadata"))]), b"x".to_vec());
        let obj = PDFObject::from(stream);
        assert!(obj.has_type("Metadata"));
        assert_eq!(obj.as_dict().unwrap().len(), 1);
        assert!(obj.as_stream().is_ok());
    }

    #[test]
    fn type_error_names_both_sides() {
        let err = PDFObject::Int(3).as_name().unwrap_err();
        assert!(matches!(
            err,
            PdfError::TypeError {
                expected: "name",
                got: "int"
            }
        ));
    }

    #[test]
    fn empty_filter_array_is_unfiltered() {
        let stream = PDFStream::new(dict([("Filter", PDFObject::Array(vec![]))]), Vec::new());
        assert!(!stream.has_filters());
    }
}
