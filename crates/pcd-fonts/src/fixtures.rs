//! Synthetic font sheets in the source sheet colors.

use image::RgbImage;

use crate::sheet::{
    CELL_SIZE, SHEET_BACKGROUND_COLOR, SHEET_TEXT_BACKGROUND_COLOR, SHEET_TEXT_COLOR,
    SHEET_TEXT_SHADOW_COLOR,
};

/// Glyph cells laid out per sheet row
pub const CELLS_PER_ROW: u32 = 16;

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// A cell whose glyph box spans columns 0..8 and rows 2..15 (the last row
/// being the sheet's baseline row). Columns 1..7 of rows 3..13 carry a
/// stroke and shadow pattern unique to `seed`.
pub fn ink_cell(seed: u32) -> RgbImage {
    let strokes = splitmix64(seed as u64);
    let shadows = splitmix64(strokes);

    RgbImage::from_fn(CELL_SIZE, CELL_SIZE, |x, y| {
        if x >= 8 || !(2..15).contains(&y) {
            return SHEET_BACKGROUND_COLOR;
        }
        if !(1..7).contains(&x) || !(3..13).contains(&y) {
            return SHEET_TEXT_BACKGROUND_COLOR;
        }
        // Always some ink, even for an all-zero pattern
        if (x, y) == (1, 3) {
            return SHEET_TEXT_COLOR;
        }
        let bit = (y - 3) * 6 + (x - 1);
        if strokes >> bit & 1 == 1 {
            SHEET_TEXT_COLOR
        } else if shadows >> bit & 1 == 1 {
            SHEET_TEXT_SHADOW_COLOR
        } else {
            SHEET_TEXT_BACKGROUND_COLOR
        }
    })
}

/// A sheet of `ink` glyph cells followed by empty cells, [`CELLS_PER_ROW`]
/// per row and `rows` rows tall.
pub fn sheet_with(ink: usize, rows: u32) -> RgbImage {
    let mut sheet = RgbImage::from_pixel(
        CELLS_PER_ROW * CELL_SIZE,
        rows * CELL_SIZE,
        SHEET_BACKGROUND_COLOR,
    );
    for i in 0..ink as u32 {
        place_cell(&mut sheet, i, &ink_cell(i));
    }
    sheet
}

/// Paste `cell` at grid position `index`.
pub fn place_cell(sheet: &mut RgbImage, index: u32, cell: &RgbImage) {
    image::imageops::replace(
        sheet,
        cell,
        ((index % CELLS_PER_ROW) * CELL_SIZE) as i64,
        ((index / CELLS_PER_ROW) * CELL_SIZE) as i64,
    );
}
