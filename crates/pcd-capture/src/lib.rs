use anyhow::{Context, Result};
use image::{GrayImage, Luma, RgbImage};
use serde::{Deserialize, Serialize};
use std::path::Path;

mod natural;

pub use natural::{list_screenshots, natural_cmp};

/// Text fields of the storage summary panel, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Name,
    Species,
    Gender,
    HeldItem,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Name, Field::Species, Field::Gender, Field::HeldItem];

    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Species => "species",
            Field::Gender => "gender",
            Field::HeldItem => "item",
        }
    }
}

/// Fixed row bands of the summary panel.
///
/// The panel is laid out for a 160 px tall screen; bands are stored in those
/// units and scaled with integer arithmetic so that every screenshot height
/// slices the same way.
pub mod regions {
    use super::Field;

    /// Height the band offsets are expressed in.
    pub const REFERENCE_HEIGHT: u32 = 160;

    /// `(top, bottom)` in reference rows. `None` runs to the bottom edge.
    pub fn field_band(field: Field) -> (u32, Option<u32>) {
        match field {
            Field::Name => (84, Some(103)),
            Field::Species => (103, Some(117)),
            Field::Gender => (115, Some(134)),
            Field::HeldItem => (132, None),
        }
    }

    /// Pixel rows `top..bottom` of `field` for an image of the given height,
    /// clamped so the range never leaves the image.
    pub fn field_rows(field: Field, height: u32) -> (u32, u32) {
        let (top, bottom) = field_band(field);
        let scale = |v: u32| (v as u64 * height as u64 / REFERENCE_HEIGHT as u64) as u32;
        let top = scale(top).min(height);
        let bottom = bottom.map(scale).unwrap_or(height).clamp(top, height);
        (top, bottom)
    }
}

/// Read a screenshot from disk as RGB (alpha is discarded).
pub fn load_screenshot(path: &Path) -> Result<RgbImage> {
    let img = image::open(path)
        .with_context(|| format!("Failed to read screenshot {}", path.display()))?;
    Ok(img.to_rgb8())
}

/// Grayscale conversion shared by templates and screenshots.
///
/// BT.601 luma in 14-bit fixed point with rounding, so a gray RGB pixel maps
/// back to exactly its own value.
pub fn to_gray(img: &RgbImage) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b] = img.get_pixel(x, y).0;
        let y = (r as u32 * 4899 + g as u32 * 9617 + b as u32 * 1868 + (1 << 13)) >> 14;
        Luma([y.min(255) as u8])
    })
}

/// Crop the full-width band holding `field`.
pub fn crop_field(frame: &RgbImage, field: Field) -> RgbImage {
    let (top, bottom) = regions::field_rows(field, frame.height());
    image::imageops::crop_imm(frame, 0, top, frame.width(), bottom - top).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_rows_reference_height() {
        assert_eq!(regions::field_rows(Field::Name, 160), (84, 103));
        assert_eq!(regions::field_rows(Field::Species, 160), (103, 117));
        assert_eq!(regions::field_rows(Field::Gender, 160), (115, 134));
        assert_eq!(regions::field_rows(Field::HeldItem, 160), (132, 160));
    }

    #[test]
    fn test_field_rows_scale() {
        // 2x screenshot
        assert_eq!(regions::field_rows(Field::Name, 320), (168, 206));
        // Odd heights floor like the reference layout does
        assert_eq!(regions::field_rows(Field::Species, 100), (64, 73));
    }

    #[test]
    fn test_field_rows_tiny_image() {
        for field in Field::ALL {
            let (top, bottom) = regions::field_rows(field, 1);
            assert!(top <= bottom && bottom <= 1);
        }
        assert_eq!(regions::field_rows(Field::HeldItem, 0), (0, 0));
    }

    #[test]
    fn test_crop_field() {
        let img = RgbImage::from_fn(240, 160, |_, y| image::Rgb([y as u8, 0, 0]));
        let name = crop_field(&img, Field::Name);
        assert_eq!(name.dimensions(), (240, 19));
        assert_eq!(name.get_pixel(0, 0)[0], 84);

        let item = crop_field(&img, Field::HeldItem);
        assert_eq!(item.dimensions(), (240, 28));
        assert_eq!(item.get_pixel(5, 27)[0], 159);
    }

    #[test]
    fn test_crop_field_tiny_image() {
        let img = RgbImage::new(10, 3);
        for field in Field::ALL {
            let crop = crop_field(&img, field);
            assert_eq!(crop.width(), 10);
            assert!(crop.height() <= 3);
        }
    }

    #[test]
    fn test_to_gray() {
        let img = RgbImage::from_fn(4, 1, |x, _| match x {
            0 => image::Rgb([255, 255, 255]),
            1 => image::Rgb([0, 0, 0]),
            2 => image::Rgb([77, 77, 77]),
            _ => image::Rgb([148, 150, 173]),
        });
        let gray = to_gray(&img);
        assert_eq!(gray.get_pixel(0, 0)[0], 255);
        assert_eq!(gray.get_pixel(1, 0)[0], 0);
        assert_eq!(gray.get_pixel(2, 0)[0], 77);
        assert_eq!(gray.get_pixel(3, 0)[0], 152);
    }

    #[test]
    fn test_load_screenshot_missing() {
        let err = load_screenshot(Path::new("/nonexistent/shot.png")).unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/shot.png"));
    }
}
