//! ICC colour profiles: the built-in sRGB profile and header inspection.

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use once_cell::sync::Lazy;
use std::io::{Cursor, Seek, SeekFrom};

const HEADER_LEN: usize = 128;
const TAG_ENTRY_LEN: usize = 12;

/// D50 illuminant, s15Fixed16.
const D50: [f64; 3] = [0.9642, 1.0, 0.8249];

/// sRGB primaries adapted to D50.
const RED: [f64; 3] = [0.4361, 0.2225, 0.0139];
const GREEN: [f64; 3] = [0.3851, 0.7169, 0.0971];
const BLUE: [f64; 3] = [0.1431, 0.0606, 0.7141];

/// Gamma 2.2 as u8Fixed8.
const GAMMA: u16 = 0x0233;

const DESCRIPTION: &str = "sRGB IEC61966-2.1";
const COPYRIGHT: &str = "No copyright, use freely";

/// Minimal sRGB ICC v2 display profile, built on first use.
pub static SRGB_PROFILE: Lazy<Vec<u8>> = Lazy::new(build_srgb_profile);

fn s15_fixed16(v: f64) -> u32 {
    (v * 65536.0).round() as i32 as u32
}

fn xyz_tag(xyz: [f64; 3]) -> Vec<u8> {
    let mut tag = vec![0u8; 20];
    tag[..4].copy_from_slice(b"XYZ ");
    for (i, v) in xyz.iter().enumerate() {
        BigEndian::write_u32(&mut tag[8 + i * 4..12 + i * 4], s15_fixed16(*v));
    }
    tag
}

fn curve_tag(gamma: u16) -> Vec<u8> {
    let mut tag = vec![0u8; 14];
    tag[..4].copy_from_slice(b"curv");
    BigEndian::write_u32(&mut tag[8..12], 1);
    BigEndian::write_u16(&mut tag[12..14], gamma);
    tag
}

fn text_tag(text: &str) -> Vec<u8> {
    let mut tag = vec![0u8; 8];
    tag[..4].copy_from_slice(b"text");
    tag.extend_from_slice(text.as_bytes());
    tag.push(0);
    tag
}

/// textDescriptionType with an ASCII description and empty Unicode and
/// ScriptCode parts.
fn desc_tag(text: &str) -> Vec<u8> {
    let mut tag = vec![0u8; 12];
    tag[..4].copy_from_slice(b"desc");
    BigEndian::write_u32(&mut tag[8..12], text.len() as u32 + 1);
    tag.extend_from_slice(text.as_bytes());
    tag.push(0);
    // unicode language, unicode count, scriptcode code, scriptcode count, 67 bytes
    tag.extend_from_slice(&[0u8; 4 + 4 + 2 + 1 + 67]);
    tag
}

fn build_srgb_profile() -> Vec<u8> {
    let trc = curve_tag(GAMMA);
    // (signature, data); the three TRC tags share one data block
    let tags: Vec<(&[u8; 4], Vec<u8>)> = vec![
        (b"desc", desc_tag(DESCRIPTION)),
        (b"cprt", text_tag(COPYRIGHT)),
        (b"wtpt", xyz_tag(D50)),
        (b"rXYZ", xyz_tag(RED)),
        (b"gXYZ", xyz_tag(GREEN)),
        (b"bXYZ", xyz_tag(BLUE)),
        (b"rTRC", trc),
    ];
    let shared_trc: [&[u8; 4]; 2] = [b"gTRC", b"bTRC"];
    let entry_count = tags.len() + shared_trc.len();

    let mut table = Vec::with_capacity(entry_count * TAG_ENTRY_LEN);
    let mut data = Vec::new();
    let data_start = HEADER_LEN + 4 + entry_count * TAG_ENTRY_LEN;
    let mut trc_entry = (0u32, 0u32);
    for (sig, body) in &tags {
        let offset = (data_start + data.len()) as u32;
        let size = body.len() as u32;
        if *sig == b"rTRC" {
            trc_entry = (offset, size);
        }
        table.push((**sig, offset, size));
        data.extend_from_slice(body);
        while data.len() % 4 != 0 {
            data.push(0);
        }
    }
    for sig in shared_trc {
        table.push((*sig, trc_entry.0, trc_entry.1));
    }

    let total = data_start + data.len();
    let mut profile = vec![0u8; data_start];
    BigEndian::write_u32(&mut profile[0..4], total as u32);
    BigEndian::write_u32(&mut profile[8..12], 0x0210_0000);
    profile[12..16].copy_from_slice(b"mntr");
    profile[16..20].copy_from_slice(b"RGB ");
    profile[20..24].copy_from_slice(b"XYZ ");
    for (i, v) in [2024u16, 1, 1, 0, 0, 0].iter().enumerate() {
        BigEndian::write_u16(&mut profile[24 + i * 2..26 + i * 2], *v);
    }
    profile[36..40].copy_from_slice(b"acsp");
    for (i, v) in D50.iter().enumerate() {
        BigEndian::write_u32(&mut profile[68 + i * 4..72 + i * 4], s15_fixed16(*v));
    }
    BigEndian::write_u32(&mut profile[HEADER_LEN..HEADER_LEN + 4], entry_count as u32);
    for (i, (sig, offset, size)) in table.iter().enumerate() {
        let at = HEADER_LEN + 4 + i * TAG_ENTRY_LEN;
        profile[at..at + 4].copy_from_slice(sig);
        BigEndian::write_u32(&mut profile[at + 4..at + 8], *offset);
        BigEndian::write_u32(&mut profile[at + 8..at + 12], *size);
    }
    profile.extend_from_slice(&data);
    profile
}

/// Fields of an ICC profile header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IccHeader {
    pub size: u32,
    /// Major version number.
    pub major: u8,
    pub class: String,
    pub color_space: String,
    pub tag_count: u32,
}

impl IccHeader {
    /// Read the header, or `None` when `data` is not an ICC profile.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < HEADER_LEN + 4 || &data[36..40] != b"acsp" {
            return None;
        }
        let mut cursor = Cursor::new(data);
        let size = cursor.read_u32::<BigEndian>().ok()?;
        cursor.seek(SeekFrom::Start(8)).ok()?;
        let major = cursor.read_u8().ok()?;
        cursor.seek(SeekFrom::Start(HEADER_LEN as u64)).ok()?;
        let tag_count = cursor.read_u32::<BigEndian>().ok()?;
        Some(Self {
            size,
            major,
            class: String::from_utf8_lossy(&data[12..16]).into_owned(),
            color_space: String::from_utf8_lossy(&data[16..20]).trim_end().to_string(),
            tag_count,
        })
    }

    /// Colour components implied by the profile's colour space.
    pub fn components(&self) -> Option<u32> {
        match self.color_space.as_str() {
            "GRAY" => Some(1),
            "RGB" | "Lab" | "XYZ" => Some(3),
            "CMYK" => Some(4),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_profile_header() {
        let header = IccHeader::parse(&SRGB_PROFILE).unwrap();
        assert_eq!(header.size as usize, SRGB_PROFILE.len());
        assert_eq!(header.major, 2);
        assert_eq!(header.class, "mntr");
        assert_eq!(header.color_space, "RGB");
        assert_eq!(header.components(), Some(3));
        assert_eq!(header.tag_count, 9);
        assert_eq!(hex::encode(&SRGB_PROFILE[36..40]), "61637370");
    }

    #[test]
    fn tag_offsets_are_aligned_and_in_bounds() {
        let count = BigEndian::read_u32(&SRGB_PROFILE[128..132]) as usize;
        for i in 0..count {
            let at = 132 + i * 12;
            let offset = BigEndian::read_u32(&SRGB_PROFILE[at + 4..at + 8]) as usize;
            let size = BigEndian::read_u32(&SRGB_PROFILE[at + 8..at + 12]) as usize;
            assert_eq!(offset % 4, 0);
            assert!(offset + size <= SRGB_PROFILE.len());
        }
    }

    #[test]
    fn white_point_is_d50() {
        assert_eq!(hex::encode(&SRGB_PROFILE[68..80]), "0000f6d6000100000000d32d");
    }

    #[test]
    fn non_profile_is_rejected() {
        assert!(IccHeader::parse(b"not an icc profile").is_none());
        assert!(IccHeader::parse(&[0u8; 200]).is_none());
    }
}
