//! PDF object syntax.

use crate::error::InvariantKind;
use crate::model::{PDFDict, PDFObject};
use std::io::Write;

/// Serialize `obj`, renumbering references through `remap`. A reference
/// that `remap` cannot place is a dangling reference.
pub fn write_object<F>(out: &mut Vec<u8>, obj: &PDFObject, remap: &F) -> Result<(), InvariantKind>
where
    F: Fn(u32) -> Option<u32>,
{
    match obj {
        PDFObject::Null => out.extend_from_slice(b"null"),
        PDFObject::Bool(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
        PDFObject::Int(n) => out.extend_from_slice(n.to_string().as_bytes()),
        PDFObject::Real(v) => out.extend_from_slice(format_real(*v).as_bytes()),
        PDFObject::Name(name) => write_name(out, name),
        PDFObject::String(bytes) => write_string(out, bytes),
        PDFObject::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                write_object(out, item, remap)?;
            }
            out.push(b']');
        }
        PDFObject::Dict(d) => write_dict(out, d, None, remap)?,
        PDFObject::Stream(s) => {
            let data = s.get_rawdata();
            write_dict(out, &s.attrs, Some(data.len()), remap)?;
            out.extend_from_slice(b"\nstream\n");
            out.extend_from_slice(data);
            out.extend_from_slice(b"\nendstream");
        }
        PDFObject::Ref(r) => {
            let objid = remap(r.objid).ok_or(InvariantKind::DanglingReference { objid: r.objid })?;
            let _ = write!(out, "{objid} 0 R");
        }
    }
    Ok(())
}

/// Dictionary syntax. `length` overrides any `/Length` entry.
fn write_dict<F>(out: &mut Vec<u8>, d: &PDFDict, length: Option<usize>, remap: &F) -> Result<(), InvariantKind>
where
    F: Fn(u32) -> Option<u32>,
{
    out.extend_from_slice(b"<<");
    for (key, value) in d {
        if length.is_some() && key == "Length" {
            continue;
        }
        out.push(b' ');
        write_name(out, key);
        out.push(b' ');
        write_object(out, value, remap)?;
    }
    if let Some(len) = length {
        let _ = write!(out, " /Length {len}");
    }
    out.extend_from_slice(b" >>");
    Ok(())
}

fn is_regular(b: u8) -> bool {
    (0x21..0x7F).contains(&b) && !b"()<>[]{}/%#".contains(&b)
}

/// `/Name` with `#xx` escapes for delimiters, whitespace and non-ASCII bytes.
pub fn write_name(out: &mut Vec<u8>, name: &str) {
    out.push(b'/');
    for &b in name.as_bytes() {
        if is_regular(b) {
            out.push(b);
        } else {
            let _ = write!(out, "#{b:02X}");
        }
    }
}

/// Literal string when the bytes are printable text, hex string otherwise.
pub fn write_string(out: &mut Vec<u8>, bytes: &[u8]) {
    let printable = bytes
        .iter()
        .all(|&b| (0x20..0x7F).contains(&b) || matches!(b, b'\n' | b'\r' | b'\t'));
    if !printable {
        out.push(b'<');
        for b in bytes {
            let _ = write!(out, "{b:02X}");
        }
        out.push(b'>');
        return;
    }
    out.push(b'(');
    for &b in bytes {
        match b {
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'(' => out.extend_from_slice(b"\\("),
            b')' => out.extend_from_slice(b"\\)"),
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            _ => out.push(b),
        }
    }
    out.push(b')');
}

/// Decimal notation without an exponent, trailing zeros trimmed.
pub fn format_real(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let s = format!("{v:.6}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "" | "-" | "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Human-readable rendering with references kept as they are and stream
/// data summarized.
pub fn render(obj: &PDFObject) -> String {
    let mut out = Vec::new();
    let summary = match obj {
        PDFObject::Stream(s) => {
            let _ = write_dict(&mut out, &s.attrs, None, &Some);
            Some(s.len())
        }
        other => {
            let _ = write_object(&mut out, other, &Some);
            None
        }
    };
    let mut text = String::from_utf8_lossy(&out).into_owned();
    if let Some(len) = summary {
        text.push_str(&format!(" stream[{len} bytes]"));
    }
    text
}
