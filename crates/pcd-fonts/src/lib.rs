use image::Rgb;
use serde::{Deserialize, Serialize};

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;
mod library;
pub mod sheet;
pub mod symbols;

pub use library::{Alphabet, GlyphLibrary, GlyphTemplate};
pub use sheet::{ensure_all, SpriteSheet};

/// Subdirectory of the glyph library holding the gender markers.
pub const GENDER_DIR: &str = "genders";
pub const MALE_MARKER_FILE: &str = "male.png";
pub const FEMALE_MARKER_FILE: &str = "female.png";

/// The Latin fonts the summary panel renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontVariant {
    Normal,
    Short,
    SmallNarrow,
    Small,
}

impl FontVariant {
    pub const ALL: [FontVariant; 4] = [
        FontVariant::Normal,
        FontVariant::Short,
        FontVariant::SmallNarrow,
        FontVariant::Small,
    ];

    pub fn dir_name(self) -> &'static str {
        match self {
            FontVariant::Normal => "latin_normal",
            FontVariant::Short => "latin_short",
            FontVariant::SmallNarrow => "latin_small_narrow",
            FontVariant::Small => "latin_small",
        }
    }

    pub fn sheet_file(self) -> String {
        format!("{}.png", self.dir_name())
    }
}

/// Debug color of a symbol. Depends on the symbol alone (FNV-1a of its UTF-8
/// bytes), so a glyph is drawn the same way in every image.
pub fn symbol_color(symbol: char) -> Rgb<u8> {
    let mut buf = [0u8; 4];
    let mut hash: u32 = 0x811c_9dc5;
    for byte in symbol.encode_utf8(&mut buf).bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    let [r, g, b, _] = hash.to_le_bytes();
    Rgb([r, g, b])
}
