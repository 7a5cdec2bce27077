use anyhow::{bail, Context, Result};
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::symbols::glyph_for_ordinal;
use crate::FontVariant;

/// Summary panel background (#9496ad).
pub const PC_BACKGROUND_COLOR: Rgb<u8> = Rgb([148, 150, 173]);
/// Summary panel text (#ffffff).
pub const PC_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
/// Summary panel text shadow (#000000).
pub const PC_TEXT_SHADOW_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// Light blue filling the unused part of every sheet cell.
pub const SHEET_BACKGROUND_COLOR: Rgb<u8> = Rgb([144, 200, 255]);
pub const SHEET_TEXT_BACKGROUND_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
pub const SHEET_TEXT_COLOR: Rgb<u8> = Rgb([56, 56, 56]);
pub const SHEET_TEXT_SHADOW_COLOR: Rgb<u8> = Rgb([216, 216, 216]);

/// Edge of all Latin font sheet cells.
pub const CELL_SIZE: u32 = 16;

/// A font sheet and where its glyphs go.
#[derive(Debug, Clone)]
pub struct SpriteSheet {
    pub image_path: PathBuf,
    pub sprite_width: u32,
    pub sprite_height: u32,
    pub output_dir: PathBuf,
}

impl SpriteSheet {
    pub fn for_variant(variant: FontVariant, fonts_input: &Path, fonts_output: &Path) -> Self {
        Self {
            image_path: fonts_input.join(variant.sheet_file()),
            sprite_width: CELL_SIZE,
            sprite_height: CELL_SIZE,
            output_dir: fonts_output.join(variant.dir_name()),
        }
    }

    /// A finished build exists. Builds are renamed into place only when
    /// complete, so a present directory is never partial.
    pub fn exists(&self) -> bool {
        self.output_dir.exists()
    }

    /// Split the sheet unless it was already split. Returns whether it built.
    pub fn ensure_split(&self) -> Result<bool> {
        if self.exists() {
            debug!("{} already built", self.output_dir.display());
            return Ok(false);
        }
        self.split()?;
        Ok(true)
    }

    fn partial_dir(&self) -> PathBuf {
        let mut name = self
            .output_dir
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".partial");
        self.output_dir.with_file_name(name)
    }

    /// Slice the sheet into glyph files. Returns the number of glyphs written.
    pub fn split(&self) -> Result<usize> {
        if self.sprite_width == 0 || self.sprite_height == 0 {
            bail!(
                "Invalid cell size {}x{} for {}",
                self.sprite_width,
                self.sprite_height,
                self.image_path.display()
            );
        }

        let sheet = image::open(&self.image_path)
            .with_context(|| format!("Failed to open sprite sheet {}", self.image_path.display()))?
            .to_rgb8();

        let partial = self.partial_dir();
        if partial.exists() {
            std::fs::remove_dir_all(&partial)
                .with_context(|| format!("Failed to remove stale {}", partial.display()))?;
        }
        std::fs::create_dir_all(&partial)
            .with_context(|| format!("Failed to create {}", partial.display()))?;

        let across = sheet.width() / self.sprite_width;
        let down = sheet.height() / self.sprite_height;

        let mut ordinal = 0usize;
        let mut written = 0usize;

        for y in 0..down {
            for x in 0..across {
                let mut cell = image::imageops::crop_imm(
                    &sheet,
                    x * self.sprite_width,
                    y * self.sprite_height,
                    self.sprite_width,
                    self.sprite_height,
                )
                .to_image();

                remap_sheet_colors(&mut cell);
                let sprite = crop_sprite(&cell);
                if is_blank(&sprite) {
                    continue;
                }

                if let Some(glyph) = glyph_for_ordinal(ordinal) {
                    let path = partial.join(glyph.file_name());
                    sprite
                        .save_with_format(&path, image::ImageFormat::Png)
                        .with_context(|| format!("Failed to write glyph {}", path.display()))?;
                    written += 1;
                }
                ordinal += 1;
            }
        }

        std::fs::rename(&partial, &self.output_dir).with_context(|| {
            format!(
                "Failed to move {} into place at {}",
                partial.display(),
                self.output_dir.display()
            )
        })?;

        info!(
            "Split {} into {} glyphs ({} ink cells) at {}",
            self.image_path.display(),
            written,
            ordinal,
            self.output_dir.display()
        );
        Ok(written)
    }
}

/// Build every font variant that is not built yet.
pub fn ensure_all(fonts_input: &Path, fonts_output: &Path) -> Result<()> {
    for variant in FontVariant::ALL {
        SpriteSheet::for_variant(variant, fonts_input, fonts_output)
            .ensure_split()
            .with_context(|| format!("Failed to build {} glyphs", variant.dir_name()))?;
    }
    Ok(())
}

/// Replace the sheet's own colors with the ones the summary panel renders.
pub fn remap_sheet_colors(cell: &mut RgbImage) {
    for px in cell.pixels_mut() {
        if *px == SHEET_TEXT_BACKGROUND_COLOR {
            *px = PC_BACKGROUND_COLOR;
        } else if *px == SHEET_TEXT_COLOR {
            *px = PC_TEXT_COLOR;
        } else if *px == SHEET_TEXT_SHADOW_COLOR {
            *px = PC_TEXT_SHADOW_COLOR;
        }
    }
}

/// Trim the sheet background off a cell.
///
/// The glyph box is anchored at the left edge: its bottom and top come from
/// column 0 and its right edge from the bottom row. The bottom row itself is
/// not kept. Returns a 0x0 image when no glyph box is found.
pub fn crop_sprite(cell: &RgbImage) -> RgbImage {
    let (w, h) = cell.dimensions();
    if w == 0 || h == 0 {
        return RgbImage::new(0, 0);
    }
    let is_sheet_bg = |x: u32, y: u32| *cell.get_pixel(x, y) == SHEET_BACKGROUND_COLOR;

    let lower = (0..h).rev().find(|&y| !is_sheet_bg(0, y)).unwrap_or(0);
    let top = (0..h).find(|&y| !is_sheet_bg(0, y)).unwrap_or(h - 1);
    let right = (0..w).rev().find(|&x| !is_sheet_bg(x, lower)).unwrap_or(0);

    if right == 0 || lower == 0 || top >= lower {
        return RgbImage::new(0, 0);
    }

    image::imageops::crop_imm(cell, 0, top, right + 1, lower - top).to_image()
}

/// Nothing but panel background and shadow: such a cell has no text and
/// does not take an ordinal.
fn is_blank(sprite: &RgbImage) -> bool {
    sprite.width() == 0
        || sprite.height() == 0
        || sprite
            .pixels()
            .all(|px| *px == PC_BACKGROUND_COLOR || *px == PC_TEXT_SHADOW_COLOR)
}
