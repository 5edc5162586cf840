//! PDF text strings and file names.

use unicode_normalization::UnicodeNormalization;

const UTF16BE_BOM: [u8; 2] = [0xFE, 0xFF];

/// Encode a PDF text string: plain bytes for printable ASCII, otherwise
/// UTF-16BE prefixed with a byte order mark.
pub fn encode_text_string(text: &str) -> Vec<u8> {
    if text.bytes().all(|b| (0x20..0x7F).contains(&b)) {
        return text.as_bytes().to_vec();
    }
    let mut out = Vec::with_capacity(2 + text.len() * 2);
    out.extend_from_slice(&UTF16BE_BOM);
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_be_bytes());
    }
    out
}

/// Decode a PDF text string (UTF-16BE with BOM, UTF-8 with BOM, or
/// single-byte text read as Latin-1).
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&UTF16BE_BOM) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// ASCII-only rendition of a file name for `/F`.
///
/// Accents are stripped through NFKD decomposition; anything left outside
/// printable ASCII becomes `_`.
pub fn ascii_file_name(name: &str) -> String {
    let ascii: String = name
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| {
            if c.is_ascii_graphic() || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if ascii.trim().is_empty() {
        "attachment".to_string()
    } else {
        ascii
    }
}

fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF)
}
