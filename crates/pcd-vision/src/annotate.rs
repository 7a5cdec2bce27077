use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::path::PathBuf;
use tracing::warn;

use crate::glyph_matcher::Match;

pub const MALE_BOX_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const FEMALE_BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Copy of a screenshot with a box drawn around every accepted match.
/// Purely diagnostic: nothing read from it feeds back into decoding.
pub struct Annotation {
    image: RgbImage,
    path: Option<PathBuf>,
}

impl Annotation {
    pub fn new(source: &RgbImage, path: Option<PathBuf>) -> Self {
        Self {
            image: source.clone(),
            path,
        }
    }

    /// Outline `m`, whose coordinates are relative to a band starting at row
    /// `top` of the screenshot.
    pub fn outline(&mut self, m: &Match, top: u32, color: Rgb<u8>) {
        if m.width == 0 || m.height == 0 {
            return;
        }
        let rect = Rect::at(m.x as i32, (m.y + top) as i32).of_size(m.width, m.height);
        draw_hollow_rect_mut(&mut self.image, rect, color);
    }

    /// Write the current state to disk, if a destination was given.
    pub fn flush(&self) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = self.image.save_with_format(path, image::ImageFormat::Png) {
            warn!("Failed to write annotated image {}: {}", path.display(), e);
        }
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }
}
