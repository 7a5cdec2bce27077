use anyhow::{bail, ensure, Context, Result};
use image::GrayImage;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::symbols::symbol_for_stem;
use crate::{FontVariant, FEMALE_MARKER_FILE, GENDER_DIR, MALE_MARKER_FILE};

/// A single-character reference bitmap, ready for correlation.
#[derive(Debug, Clone)]
pub struct GlyphTemplate {
    symbol: char,
    bitmap: GrayImage,
    /// Pixels minus their mean, row-major
    centered: Vec<f64>,
    /// Sum of squares of `centered`
    norm_sq: f64,
}

impl GlyphTemplate {
    pub fn new(symbol: char, bitmap: GrayImage) -> Self {
        let n = (bitmap.width() * bitmap.height()) as f64;
        let mean = if n > 0.0 {
            bitmap.pixels().map(|p| p[0] as f64).sum::<f64>() / n
        } else {
            0.0
        };
        let centered: Vec<f64> = bitmap.pixels().map(|p| p[0] as f64 - mean).collect();
        let norm_sq = centered.iter().map(|v| v * v).sum();

        Self {
            symbol,
            bitmap,
            centered,
            norm_sq,
        }
    }

    /// Load a glyph PNG, converting it the same way screenshots are converted.
    pub fn load(symbol: char, path: &Path) -> Result<Self> {
        let img = image::open(path)
            .with_context(|| format!("Failed to open glyph {}", path.display()))?;
        Ok(Self::new(symbol, pcd_capture::to_gray(&img.to_rgb8())))
    }

    pub fn symbol(&self) -> char {
        self.symbol
    }

    pub fn bitmap(&self) -> &GrayImage {
        &self.bitmap
    }

    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }

    pub fn centered(&self) -> &[f64] {
        &self.centered
    }

    pub fn norm_sq(&self) -> f64 {
        self.norm_sq
    }
}

/// Templates of one font variant that a field may contain.
#[derive(Debug, Clone)]
pub struct Alphabet<'a> {
    pub variant: FontVariant,
    glyphs: Vec<&'a GlyphTemplate>,
}

impl<'a> Alphabet<'a> {
    pub fn glyphs(&self) -> &[&'a GlyphTemplate] {
        &self.glyphs
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// All glyph templates plus the two gender markers. Loaded once and shared by
/// every decode.
#[derive(Debug, Clone)]
pub struct GlyphLibrary {
    fonts: HashMap<FontVariant, Vec<GlyphTemplate>>,
    male: GlyphTemplate,
    female: GlyphTemplate,
}

impl GlyphLibrary {
    /// Load every font variant and the gender markers.
    /// Expects:
    ///   - dir/{variant}/{stem}.png (built by [`crate::SpriteSheet`])
    ///   - dir/genders/male.png, dir/genders/female.png
    pub fn load(dir: &Path) -> Result<Self> {
        let mut fonts = HashMap::new();
        for variant in FontVariant::ALL {
            let glyphs = load_variant(&dir.join(variant.dir_name()))
                .with_context(|| format!("Failed to load {} glyphs", variant.dir_name()))?;
            fonts.insert(variant, glyphs);
        }

        let gender_dir = dir.join(GENDER_DIR);
        let male = GlyphTemplate::load('♂', &gender_dir.join(MALE_MARKER_FILE))?;
        let female = GlyphTemplate::load('♀', &gender_dir.join(FEMALE_MARKER_FILE))?;

        let library = Self::from_parts(fonts, male, female);
        info!(
            "GlyphLibrary loaded {} templates from {}",
            library.template_count(),
            dir.display()
        );
        Ok(library)
    }

    pub fn from_parts(
        fonts: HashMap<FontVariant, Vec<GlyphTemplate>>,
        male: GlyphTemplate,
        female: GlyphTemplate,
    ) -> Self {
        Self {
            fonts,
            male,
            female,
        }
    }

    /// Templates of `variant`, restricted to the symbols in `only` when given.
    /// An alphabet with nothing left in it means the library is incomplete.
    pub fn alphabet(&self, variant: FontVariant, only: Option<&str>) -> Result<Alphabet<'_>> {
        let Some(templates) = self.fonts.get(&variant) else {
            bail!("Glyph library has no {} font", variant.dir_name());
        };

        let glyphs: Vec<&GlyphTemplate> = templates
            .iter()
            .filter(|t| only.map_or(true, |allowed| allowed.contains(t.symbol)))
            .collect();
        ensure!(
            !glyphs.is_empty(),
            "No {} glyphs for symbols {:?}",
            variant.dir_name(),
            only.unwrap_or("<any>")
        );

        Ok(Alphabet { variant, glyphs })
    }

    pub fn male_marker(&self) -> &GlyphTemplate {
        &self.male
    }

    pub fn female_marker(&self) -> &GlyphTemplate {
        &self.female
    }

    /// Number of loaded font templates (gender markers excluded)
    pub fn template_count(&self) -> usize {
        self.fonts.values().map(Vec::len).sum()
    }
}

/// Load one variant directory, ordered by file name.
fn load_variant(dir: &Path) -> Result<Vec<GlyphTemplate>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read glyph directory {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to list {}", dir.display()))?
            .path();
        if path.extension().is_some_and(|ext| ext == "png") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut glyphs = Vec::with_capacity(paths.len());
    for path in paths {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let Some(symbol) = symbol_for_stem(&stem) else {
            warn!("Ignoring unknown glyph file {}", path.display());
            continue;
        };
        glyphs.push(GlyphTemplate::load(symbol, &path)?);
    }

    ensure!(!glyphs.is_empty(), "No glyphs in {}", dir.display());
    debug!("Loaded {} glyphs from {}", glyphs.len(), dir.display());
    Ok(glyphs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sheet_with;
    use crate::sheet::CELL_SIZE;
    use crate::SpriteSheet;

    fn bar(symbol: char, height: u32) -> GlyphTemplate {
        GlyphTemplate::new(
            symbol,
            GrayImage::from_fn(3, height, |x, _| image::Luma([if x == 1 { 255 } else { 0 }])),
        )
    }

    fn small_library() -> GlyphLibrary {
        let mut fonts = HashMap::new();
        fonts.insert(FontVariant::Normal, vec![bar('A', 5), bar('b', 6), bar('2', 7)]);
        GlyphLibrary::from_parts(fonts, bar('♂', 4), bar('♀', 4))
    }

    #[test]
    fn test_template_stats() {
        let t = bar('I', 4);
        assert_eq!((t.width(), t.height()), (3, 4));
        let sum: f64 = t.centered().iter().sum();
        assert!(sum.abs() < 1e-9);
        // Each row: 0, 255, 0 around a mean of 85
        let expected = 4.0 * (85.0f64.powi(2) * 2.0 + 170.0f64.powi(2));
        assert!((t.norm_sq() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_flat_template_has_zero_norm() {
        let t = GlyphTemplate::new('.', GrayImage::from_pixel(2, 2, image::Luma([9])));
        assert_eq!(t.norm_sq(), 0.0);
    }

    #[test]
    fn test_alphabet_filter() {
        let library = small_library();
        let all = library.alphabet(FontVariant::Normal, None).unwrap();
        assert_eq!(all.len(), 3);

        let only = library.alphabet(FontVariant::Normal, Some("AB2")).unwrap();
        let symbols: Vec<char> = only.glyphs().iter().map(|g| g.symbol()).collect();
        assert_eq!(symbols, vec!['A', '2']);
    }

    #[test]
    fn test_alphabet_missing() {
        let library = small_library();
        assert!(library.alphabet(FontVariant::Short, None).is_err());
        assert!(library.alphabet(FontVariant::Normal, Some("xyz")).is_err());
    }

    #[test]
    fn test_load_built_library() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input");
        let output = dir.path().join("letters");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::create_dir_all(&output).unwrap();

        for variant in FontVariant::ALL {
            sheet_with(148, 10).save(input.join(variant.sheet_file())).unwrap();
        }
        crate::ensure_all(&input, &output).unwrap();

        let genders = output.join(GENDER_DIR);
        std::fs::create_dir_all(&genders).unwrap();
        for file in [MALE_MARKER_FILE, FEMALE_MARKER_FILE] {
            GrayImage::from_fn(5, 5, |x, y| image::Luma([((x * 7 + y * 3) * 10) as u8]))
                .save(genders.join(file))
                .unwrap();
        }
        // Stray files are skipped
        std::fs::write(output.join("latin_normal").join("notes.txt"), b"").unwrap();

        let library = GlyphLibrary::load(&output).unwrap();
        assert_eq!(library.template_count(), 72 * 4);

        let normal = library.alphabet(FontVariant::Normal, None).unwrap();
        // Sorted by file name: digits first
        assert_eq!(normal.glyphs()[0].symbol(), '0');
        assert!(normal.glyphs().iter().any(|g| g.symbol() == '…'));
        assert_eq!(library.male_marker().symbol(), '♂');
        assert_eq!(library.female_marker().width(), 5);

        let short = SpriteSheet::for_variant(FontVariant::Short, &input, &output);
        assert!(short.exists());
        assert_eq!(CELL_SIZE, short.sprite_width);
    }

    #[test]
    fn test_load_missing_gender_marker() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input");
        std::fs::create_dir_all(&input).unwrap();
        for variant in FontVariant::ALL {
            sheet_with(100, 7).save(input.join(variant.sheet_file())).unwrap();
        }
        crate::ensure_all(&input, dir.path()).unwrap();

        let err = GlyphLibrary::load(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("male.png"));
    }

    #[test]
    fn test_load_missing_variant() {
        let dir = tempfile::tempdir().unwrap();
        let err = GlyphLibrary::load(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("latin_normal"));
    }
}
