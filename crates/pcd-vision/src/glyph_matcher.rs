use image::GrayImage;
use pcd_fonts::{Alphabet, GlyphTemplate};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Minimum correlation for a position to count as a glyph occurrence
pub const DEFAULT_THRESHOLD: f64 = 0.90;

/// A glyph found at a position of a search image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub symbol: char,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub confidence: f64,
}

/// Correlation score for every placement of a template inside a search image.
#[derive(Debug, Clone)]
pub struct ScoreMap {
    pub width: u32,
    pub height: u32,
    scores: Vec<f64>,
}

impl ScoreMap {
    pub fn get(&self, x: u32, y: u32) -> f64 {
        self.scores[(y * self.width + x) as usize]
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Summed-area tables of pixel values and their squares.
struct IntegralImage {
    stride: usize,
    sum: Vec<u64>,
    sum_sq: Vec<u64>,
}

impl IntegralImage {
    fn new(img: &GrayImage) -> Self {
        let (w, h) = (img.width() as usize, img.height() as usize);
        let stride = w + 1;
        let mut sum = vec![0u64; stride * (h + 1)];
        let mut sum_sq = vec![0u64; stride * (h + 1)];

        for y in 0..h {
            let mut row = 0u64;
            let mut row_sq = 0u64;
            for x in 0..w {
                let v = img.get_pixel(x as u32, y as u32)[0] as u64;
                row += v;
                row_sq += v * v;
                let i = (y + 1) * stride + x + 1;
                sum[i] = sum[i - stride] + row;
                sum_sq[i] = sum_sq[i - stride] + row_sq;
            }
        }

        Self {
            stride,
            sum,
            sum_sq,
        }
    }

    /// `(sum, sum of squares)` of the `w`x`h` window at `(x, y)`
    fn window(&self, x: usize, y: usize, w: usize, h: usize) -> (u64, u64) {
        let at = |table: &[u64], x: usize, y: usize| table[y * self.stride + x];
        let rect = |table: &[u64]| {
            at(table, x + w, y + h) + at(table, x, y) - at(table, x + w, y) - at(table, x, y + h)
        };
        (rect(&self.sum), rect(&self.sum_sq))
    }
}

/// Zero-mean normalized cross-correlation of `template` at every position of
/// `search`.
///
/// Scores lie in [-1, 1]. Positions where either the window or the template
/// is flat score 0. Window statistics are exact integer sums, so a given input
/// always produces the same scores.
pub fn correlate(search: &GrayImage, template: &GlyphTemplate) -> ScoreMap {
    let (sw, sh) = search.dimensions();
    let (tw, th) = (template.width(), template.height());

    if tw == 0 || th == 0 || tw > sw || th > sh {
        return ScoreMap {
            width: 0,
            height: 0,
            scores: Vec::new(),
        };
    }

    let (mw, mh) = (sw - tw + 1, sh - th + 1);
    let integral = IntegralImage::new(search);
    let centered = template.centered();
    let t_norm_sq = template.norm_sq();
    let n = (tw * th) as u128;
    let raw = search.as_raw();
    let stride = sw as usize;

    let mut scores = Vec::with_capacity((mw * mh) as usize);
    for y in 0..mh as usize {
        for x in 0..mw as usize {
            let (s, s2) = integral.window(x, y, tw as usize, th as usize);
            // n * sum((I - mean)^2), exact
            let spread = n * s2 as u128 - (s as u128) * (s as u128);
            let w_var = spread as f64 / n as f64;

            if t_norm_sq == 0.0 || w_var <= f64::min(0.5, 10.0 * f32::EPSILON as f64 * s2 as f64) {
                scores.push(0.0);
                continue;
            }

            // The template is zero-mean, so the window mean drops out
            let mut num = 0.0f64;
            for j in 0..th as usize {
                let row = &raw[(y + j) * stride + x..(y + j) * stride + x + tw as usize];
                let t_row = &centered[j * tw as usize..(j + 1) * tw as usize];
                for (p, t) in row.iter().zip(t_row) {
                    num += *p as f64 * t;
                }
            }

            let score = num / (w_var * t_norm_sq).sqrt();
            scores.push(score.clamp(-1.0, 1.0));
        }
    }

    ScoreMap {
        width: mw,
        height: mh,
        scores,
    }
}

/// Finds every occurrence of glyph templates above a correlation threshold.
#[derive(Debug, Clone, Copy)]
pub struct GlyphMatcher {
    pub threshold: f64,
}

impl Default for GlyphMatcher {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl GlyphMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// All positions of `template` in `search` scoring at least the threshold,
    /// in row-major order.
    pub fn find(&self, search: &GrayImage, template: &GlyphTemplate) -> Vec<Match> {
        let map = correlate(search, template);
        let mut matches = Vec::new();

        for y in 0..map.height {
            for x in 0..map.width {
                let confidence = map.get(x, y);
                if confidence >= self.threshold {
                    matches.push(Match {
                        symbol: template.symbol(),
                        x,
                        y,
                        width: template.width(),
                        height: template.height(),
                        confidence,
                    });
                }
            }
        }

        matches
    }

    /// Matches of every glyph of the alphabet, in alphabet order. Overlapping
    /// and duplicate hits are all kept.
    pub fn find_all(&self, search: &GrayImage, alphabet: &Alphabet<'_>) -> Vec<Match> {
        let matches: Vec<Match> = alphabet
            .glyphs()
            .iter()
            .flat_map(|glyph| self.find(search, glyph))
            .collect();

        debug!(
            "{} raw matches from {} {} glyphs",
            matches.len(),
            alphabet.len(),
            alphabet.variant.dir_name()
        );
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{glyph_bitmap, synthetic_library};
    use image::Luma;
    use pcd_fonts::FontVariant;

    fn canvas(w: u32, h: u32) -> GrayImage {
        GrayImage::from_pixel(w, h, Luma([152]))
    }

    #[test]
    fn test_ncc_identical() {
        let bitmap = glyph_bitmap(Some(FontVariant::Normal), 'Q');
        let template = GlyphTemplate::new('Q', bitmap.clone());
        let map = correlate(&bitmap, &template);
        assert_eq!((map.width, map.height), (1, 1));
        assert!(
            (map.get(0, 0) - 1.0).abs() < 1e-9,
            "Identical images should have NCC ≈ 1.0, got {}",
            map.get(0, 0)
        );
    }

    #[test]
    fn test_ncc_is_brightness_invariant() {
        let template = GlyphTemplate::new(
            'I',
            GrayImage::from_fn(4, 4, |x, y| Luma([(x * 40 + y * 10) as u8])),
        );
        let shifted = GrayImage::from_fn(4, 4, |x, y| Luma([(x * 40 + y * 10 + 50) as u8]));
        let map = correlate(&shifted, &template);
        assert!((map.get(0, 0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_ncc_inverted() {
        let template = GlyphTemplate::new(
            'I',
            GrayImage::from_fn(4, 4, |x, y| Luma([(x * 40 + y * 10) as u8])),
        );
        let inverted = GrayImage::from_fn(4, 4, |x, y| Luma([255 - (x * 40 + y * 10) as u8]));
        let map = correlate(&inverted, &template);
        assert!((map.get(0, 0) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_window_scores_zero() {
        let template = GlyphTemplate::new('x', glyph_bitmap(None, 'x'));
        let map = correlate(&canvas(20, 15), &template);
        assert!(!map.is_empty());
        for y in 0..map.height {
            for x in 0..map.width {
                assert_eq!(map.get(x, y), 0.0);
            }
        }
    }

    #[test]
    fn test_template_larger_than_search() {
        let template = GlyphTemplate::new('x', glyph_bitmap(None, 'x'));
        assert!(correlate(&canvas(3, 3), &template).is_empty());
        assert!(GlyphMatcher::default().find(&canvas(3, 3), &template).is_empty());
    }

    #[test]
    fn test_single_instance_found_once() {
        let bitmap = glyph_bitmap(Some(FontVariant::Normal), 'k');
        let template = GlyphTemplate::new('k', bitmap.clone());
        let mut search = canvas(60, 25);
        image::imageops::replace(&mut search, &bitmap, 21, 9);

        let matches = GlyphMatcher::default().find(&search, &template);
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!((m.x, m.y), (21, 9));
        assert_eq!((m.width, m.height), (bitmap.width(), bitmap.height()));
        assert!(m.confidence >= 0.9);
    }

    #[test]
    fn test_find_all_alphabet() {
        let library = synthetic_library();
        let alphabet = library.alphabet(FontVariant::Normal, Some("AbZ")).unwrap();

        let mut search = canvas(60, 20);
        image::imageops::replace(&mut search, &glyph_bitmap(Some(FontVariant::Normal), 'Z'), 4, 3);
        image::imageops::replace(&mut search, &glyph_bitmap(Some(FontVariant::Normal), 'b'), 30, 5);
        // Same symbol from another font must not match
        image::imageops::replace(&mut search, &glyph_bitmap(Some(FontVariant::Short), 'A'), 45, 4);

        let matches = GlyphMatcher::default().find_all(&search, &alphabet);
        let found: Vec<(char, u32, u32)> = matches.iter().map(|m| (m.symbol, m.x, m.y)).collect();
        assert_eq!(found.len(), 2);
        assert!(found.contains(&('Z', 4, 3)));
        assert!(found.contains(&('b', 30, 5)));
    }

    #[test]
    fn test_deterministic_scores() {
        let library = synthetic_library();
        let alphabet = library.alphabet(FontVariant::SmallNarrow, None).unwrap();
        let mut search = canvas(50, 20);
        image::imageops::replace(&mut search, &glyph_bitmap(Some(FontVariant::SmallNarrow), '7'), 10, 2);

        let matcher = GlyphMatcher::new(0.2);
        let a = matcher.find_all(&search, &alphabet);
        let b = matcher.find_all(&search, &alphabet);
        assert_eq!(a, b);
    }

    #[test]
    fn test_lower_threshold_finds_more() {
        let bitmap = glyph_bitmap(Some(FontVariant::Normal), 'w');
        let template = GlyphTemplate::new('w', bitmap.clone());
        let mut search = canvas(40, 20);
        image::imageops::replace(&mut search, &bitmap, 5, 5);

        let strict = GlyphMatcher::new(0.9).find(&search, &template);
        let loose = GlyphMatcher::new(-1.0).find(&search, &template);
        assert!(loose.len() > strict.len());
        assert_eq!(loose.len() as u32, (40 - bitmap.width() + 1) * (20 - bitmap.height() + 1));
    }
}
