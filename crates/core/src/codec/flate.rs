//! FlateDecode with PNG predictors, and the Flate encoder used for output.

use crate::error::{PdfError, Result};
use crate::model::PDFDict;
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::io::{Read, Write};

/// Inflate zlib data, then undo any predictor named in `parms`.
pub fn flate_decode(data: &[u8], parms: Option<&PDFDict>) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut decompressed = Vec::new();
    if decoder.read_to_end(&mut decompressed).is_err() {
        // Fall back to lenient decompression for corrupted streams.
        decompressed = decompress_corrupted(data);
    }

    let Some(parms) = parms else {
        return Ok(decompressed);
    };
    let int_param = |key: &str, default: i64| {
        parms
            .get(key)
            .and_then(|v| v.as_int().ok())
            .unwrap_or(default)
    };

    let predictor = int_param("Predictor", 1);
    if predictor >= 10 {
        let columns = int_param("Columns", 1).max(1) as usize;
        let colors = int_param("Colors", 1).max(1) as usize;
        let bits = int_param("BitsPerComponent", 8).max(1) as usize;
        return Ok(apply_png_predictor(&decompressed, columns, colors, bits));
    }
    if predictor != 1 {
        return Err(PdfError::DecodeError(format!(
            "unsupported predictor {predictor}"
        )));
    }
    Ok(decompressed)
}

/// Deflate `data` with zlib framing.
pub fn flate_encode(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Best-effort zlib decompression for corrupted streams.
///
/// Returns partial output up to the point the decoder fails (often CRC
/// errors near the end).
fn decompress_corrupted(data: &[u8]) -> Vec<u8> {
    use flate2::{Decompress, FlushDecompress, Status};
    let mut decoder = Decompress::new(true);
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut buf = [0u8; 4096];
    let mut i = 0usize;
    while i < data.len() {
        let before_out = decoder.total_out();
        let before_in = decoder.total_in();
        let res = decoder.decompress(&data[i..i + 1], &mut buf, FlushDecompress::None);
        let produced = (decoder.total_out() - before_out) as usize;
        if produced > 0 {
            out.extend_from_slice(&buf[..produced]);
        }
        let consumed = (decoder.total_in() - before_in) as usize;
        i += consumed.max(1);
        match res {
            Ok(Status::StreamEnd) | Err(_) => break,
            Ok(_) => {}
        }
    }
    out
}

/// Reverse PNG row prediction. Each row carries a leading filter byte.
fn apply_png_predictor(
    data: &[u8],
    columns: usize,
    colors: usize,
    bits_per_component: usize,
) -> Vec<u8> {
    let row_bytes = (colors * columns * bits_per_component).div_ceil(8);
    let bpp = std::cmp::max(1, colors * bits_per_component / 8); // bytes per pixel
    let row_size = row_bytes + 1;

    let mut result = Vec::with_capacity(data.len());
    let mut prev_row = vec![0u8; row_bytes];

    for row in data.chunks_exact(row_size) {
        let filter_type = row[0];
        let row_data = &row[1..];
        let mut current_row = vec![0u8; row_bytes];

        match filter_type {
            1 => {
                // Sub
                for i in 0..row_bytes {
                    let left = if i >= bpp { current_row[i - bpp] } else { 0 };
                    current_row[i] = row_data[i].wrapping_add(left);
                }
            }
            2 => {
                // Up
                for i in 0..row_bytes {
                    current_row[i] = row_data[i].wrapping_add(prev_row[i]);
                }
            }
            3 => {
                // Average
                for i in 0..row_bytes {
                    let left = if i >= bpp {
                        current_row[i - bpp] as u16
                    } else {
                        0
                    };
                    let above = prev_row[i] as u16;
                    current_row[i] = row_data[i].wrapping_add(((left + above) / 2) as u8);
                }
            }
            4 => {
                // Paeth
                for i in 0..row_bytes {
                    let left = if i >= bpp { current_row[i - bpp] } else { 0 };
                    let above = prev_row[i];
                    let upper_left = if i >= bpp { prev_row[i - bpp] } else { 0 };
                    current_row[i] = row_data[i].wrapping_add(paeth_predictor(left, above, upper_left));
                }
            }
            // 0 (None) and unknown filter types copy the row
            _ => current_row.copy_from_slice(row_data),
        }

        result.extend_from_slice(&current_row);
        prev_row = current_row;
    }

    result
}

const fn paeth_predictor(left: u8, above: u8, upper_left: u8) -> u8 {
    let a = left as i32;
    let b = above as i32;
    let c = upper_left as i32;
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();

    if pa <= pb && pa <= pc {
        left
    } else if pb <= pc {
        above
    } else {
        upper_left
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PDFObject, dict};

    #[test]
    fn encode_then_decode_is_identity() {
        let payload = b"<Invoice><ID>INV-00001</ID></Invoice>";
        let encoded = flate_encode(payload).unwrap();
        assert_eq!(flate_decode(&encoded, None).unwrap(), payload);
    }

    #[test]
    fn png_up_predictor() {
        // two rows of 3 columns, second row uses Up
        let raw = [0u8, 1, 2, 3, 2, 1, 1, 1];
        let parms = dict([
            ("Predictor", PDFObject::Int(12)),
            ("Columns", PDFObject::Int(3)),
        ]);
        let encoded = flate_encode(&raw).unwrap();
        assert_eq!(
            flate_decode(&encoded, Some(&parms)).unwrap(),
            vec![1, 2, 3, 2, 3, 4]
        );
    }

    #[test]
    fn truncated_stream_yields_partial_output() {
        let encoded = flate_encode(&[b'a'; 2000]).unwrap();
        let truncated = &encoded[..encoded.len() - 4];
        let out = flate_decode(truncated, None).unwrap();
        assert!(out.iter().all(|&b| b == b'a'));
    }

    #[test]
    fn paeth_prefers_left_on_tie() {
        assert_eq!(paeth_predictor(10, 10, 10), 10);
        assert_eq!(paeth_predictor(1, 200, 1), 200);
    }
}
