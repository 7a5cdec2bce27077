//! Synthetic glyph library and summary-panel renderer.
//!
//! Every glyph is a pseudo-random 7x10 pattern seeded from its font and
//! symbol, so no two templates correlate with each other. Screenshots are
//! composed from the very same bitmaps at fixed positions inside each field's
//! row band.

use anyhow::{Context, Result};
use image::{GrayImage, Luma, Rgb, RgbImage};
use pcd_fonts::sheet::PC_BACKGROUND_COLOR;
use pcd_fonts::{
    FontVariant, GlyphLibrary, GlyphTemplate, FEMALE_MARKER_FILE, GENDER_DIR, MALE_MARKER_FILE,
};
use pcd_state::Gender;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const SCREEN_WIDTH: u32 = 112;
pub const SCREEN_HEIGHT: u32 = 160;
pub const GLYPH_WIDTH: u32 = 7;
pub const GLYPH_HEIGHT: u32 = 10;
/// Horizontal distance between consecutive characters
pub const GLYPH_ADVANCE: u32 = 8;
pub const TEXT_LEFT: u32 = 4;

pub const NAME_TOP: u32 = 88;
pub const SPECIES_TOP: u32 = 105;
pub const GENDER_TOP: u32 = 120;
pub const ITEM_TOP: u32 = 140;

/// Symbols present in every synthetic font
pub const FONT_SYMBOLS: &str =
    "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz!?.-…♂♀,/";

/// Pattern of `symbol` in `variant`; `None` selects the gender marker set.
pub fn glyph_bitmap(variant: Option<FontVariant>, symbol: char) -> GrayImage {
    let mut seed: u32 = 0x811c_9dc5;
    let font = variant.map_or("genders", FontVariant::dir_name);
    let mut buf = [0u8; 4];
    for byte in font.bytes().chain(symbol.encode_utf8(&mut buf).bytes()) {
        seed ^= byte as u32;
        seed = seed.wrapping_mul(0x0100_0193);
    }

    let mut state = seed | 1;
    GrayImage::from_fn(GLYPH_WIDTH, GLYPH_HEIGHT, |_, _| {
        // xorshift32
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        Luma([(state >> 24) as u8])
    })
}

pub fn synthetic_library() -> GlyphLibrary {
    let mut fonts = HashMap::new();
    for variant in FontVariant::ALL {
        let glyphs = FONT_SYMBOLS
            .chars()
            .map(|c| GlyphTemplate::new(c, glyph_bitmap(Some(variant), c)))
            .collect();
        fonts.insert(variant, glyphs);
    }

    GlyphLibrary::from_parts(
        fonts,
        GlyphTemplate::new('♂', glyph_bitmap(None, '♂')),
        GlyphTemplate::new('♀', glyph_bitmap(None, '♀')),
    )
}

fn stamp(canvas: &mut RgbImage, glyph: &GrayImage, x: u32, y: u32) {
    for (gx, gy, px) in glyph.enumerate_pixels() {
        let v = px[0];
        canvas.put_pixel(x + gx, y + gy, Rgb([v, v, v]));
    }
}

fn write_line(canvas: &mut RgbImage, variant: FontVariant, text: &str, top: u32) {
    for (i, c) in text.chars().enumerate() {
        if c != ' ' {
            let x = TEXT_LEFT + i as u32 * GLYPH_ADVANCE;
            stamp(canvas, &glyph_bitmap(Some(variant), c), x, top);
        }
    }
}

/// Screenshot of a summary panel showing the given slot.
pub fn render_slot(name: &str, species: Option<&str>, gender: Option<Gender>, item: &str) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(SCREEN_WIDTH, SCREEN_HEIGHT, PC_BACKGROUND_COLOR);

    write_line(&mut canvas, FontVariant::Normal, name, NAME_TOP);
    if let Some(species) = species {
        write_line(&mut canvas, FontVariant::Short, species, SPECIES_TOP);
    }
    if let Some(gender) = gender {
        stamp_marker(&mut canvas, gender, 40, GENDER_TOP);
    }
    write_line(&mut canvas, FontVariant::SmallNarrow, item, ITEM_TOP);

    canvas
}

/// Draw the synthetic marker of `gender` with its top-left corner at `(x, y)`.
pub fn stamp_marker(canvas: &mut RgbImage, gender: Gender, x: u32, y: u32) {
    let symbol = match gender {
        Gender::Male => '♂',
        Gender::Female => '♀',
    };
    stamp(canvas, &glyph_bitmap(None, symbol), x, y);
}

/// Build a glyph library on disk the way a real run does: synthetic sheets
/// for every variant split by the sheet builder, plus the gender markers.
/// Returns the library directory.
pub fn build_glyph_dir(root: &Path) -> Result<PathBuf> {
    let input = root.join("input");
    let output = root.join("letters");
    std::fs::create_dir_all(&input)
        .with_context(|| format!("Failed to create {}", input.display()))?;

    for variant in FontVariant::ALL {
        let path = input.join(variant.sheet_file());
        pcd_fonts::fixtures::sheet_with(148, 10)
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    pcd_fonts::ensure_all(&input, &output)?;

    let genders = output.join(GENDER_DIR);
    std::fs::create_dir_all(&genders)
        .with_context(|| format!("Failed to create {}", genders.display()))?;
    for (symbol, file) in [('♂', MALE_MARKER_FILE), ('♀', FEMALE_MARKER_FILE)] {
        let path = genders.join(file);
        glyph_bitmap(None, symbol)
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(output)
}

/// Advance between characters drawn from a built library
pub const BUILT_GLYPH_ADVANCE: u32 = 9;

/// Screenshot of a slot drawn with the templates of `library` itself.
pub fn render_slot_from(
    library: &GlyphLibrary,
    name: &str,
    species: Option<&str>,
    item: &str,
) -> Result<RgbImage> {
    let mut canvas = RgbImage::from_pixel(SCREEN_WIDTH, SCREEN_HEIGHT, PC_BACKGROUND_COLOR);
    let mut line = |variant: FontVariant, text: &str, top: u32| -> Result<()> {
        for (i, c) in text.chars().enumerate() {
            if c == ' ' {
                continue;
            }
            let symbol = c.to_string();
            let alphabet = library.alphabet(variant, Some(symbol.as_str()))?;
            let x = TEXT_LEFT + i as u32 * BUILT_GLYPH_ADVANCE;
            stamp(&mut canvas, alphabet.glyphs()[0].bitmap(), x, top);
        }
        Ok(())
    };

    line(FontVariant::Normal, name, NAME_TOP)?;
    if let Some(species) = species {
        line(FontVariant::Short, species, SPECIES_TOP)?;
    }
    line(FontVariant::SmallNarrow, item, ITEM_TOP)?;
    Ok(canvas)
}
