//! Stream filters.
//!
//! - `flate`: FlateDecode (with PNG predictors) and the output encoder
//! - `ascii`: ASCII85 and ASCIIHex decoding

pub mod ascii;
pub mod flate;

pub use ascii::{ascii85decode, asciihexdecode};
pub use flate::{flate_decode, flate_encode};

use crate::error::{PdfError, Result};
use crate::model::PDFDict;

/// Apply one named decode filter.
///
/// LZW and image filters are reported as unsupported; callers that only
/// need stream lengths work from the raw bytes.
pub fn apply_filter(data: &[u8], filter: &str, parms: Option<&PDFDict>) -> Result<Vec<u8>> {
    match filter {
        "FlateDecode" | "Fl" => flate_decode(data, parms),
        "ASCIIHexDecode" | "AHx" => asciihexdecode(data),
        "ASCII85Decode" | "A85" => ascii85decode(data),
        other => Err(PdfError::DecodeError(format!(
            "unsupported filter /{other}"
        ))),
    }
}
