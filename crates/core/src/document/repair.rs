//! Page box repair.
//!
//! Normalizes MediaBox/CropBox-style rectangles so that the lower-left
//! corner comes first.

use crate::model::{PDFDict, PDFObject};

/// Page boundary keys that hold rectangles.
pub const BOX_KEYS: [&str; 5] = ["MediaBox", "CropBox", "BleedBox", "TrimBox", "ArtBox"];

/// Reorder every direct page box in `page`. Returns true if anything changed.
pub fn normalize_page_boxes(page: &mut PDFDict) -> bool {
    let mut changed = false;
    for key in BOX_KEYS {
        if let Some(rect) = page.get_mut(key) {
            changed |= normalize_box(rect);
        }
    }
    changed
}

/// Swap coordinates of a `[x0 y0 x1 y1]` array so that x0 <= x1 and y0 <= y1.
///
/// Arrays that are not four numbers are left alone.
pub fn normalize_box(rect: &mut PDFObject) -> bool {
    let Ok(items) = rect.as_array_mut() else {
        return false;
    };
    if items.len() != 4 {
        return false;
    }
    let nums: Option<Vec<f64>> = items.iter().map(|n| n.as_num().ok()).collect();
    let Some(nums) = nums else {
        return false;
    };

    let mut changed = false;
    if nums[0] > nums[2] {
        items.swap(0, 2);
        changed = true;
    }
    if nums[1] > nums[3] {
        items.swap(1, 3);
        changed = true;
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::dict;

    fn rect(vals: [i64; 4]) -> PDFObject {
        PDFObject::Array(vals.iter().map(|&v| PDFObject::Int(v)).collect())
    }

    #[test]
    fn swaps_inverted_corners() {
        let mut page = dict([
            ("MediaBox", rect([612, 792, 0, 0])),
            ("CropBox", rect([0, 0, 10, 10])),
        ]);
        assert!(normalize_page_boxes(&mut page));
        assert_eq!(page["MediaBox"], rect([0, 0, 612, 792]));
        assert_eq!(page["CropBox"], rect([0, 0, 10, 10]));
    }

    #[test]
    fn leaves_references_and_short_arrays() {
        let mut by_ref = PDFObject::reference(7);
        assert!(!normalize_box(&mut by_ref));
        let mut short = PDFObject::Array(vec![PDFObject::Int(1)]);
        assert!(!normalize_box(&mut short));
    }
}
