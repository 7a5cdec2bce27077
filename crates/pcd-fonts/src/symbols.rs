//! Ink ordinal → symbol table of the Latin font sheets.
//!
//! Ordinals count non-empty cells only. Anything outside this table is not a
//! glyph the decoder knows about and is never written.

pub const DIGIT_OFFSET: usize = 70;
pub const UPPERCASE_OFFSET: usize = 96;
pub const LOWERCASE_OFFSET: usize = 122;

/// Punctuation between the digits and the capitals, by offset from
/// [`DIGIT_OFFSET`]. Stems are used as file names since some symbols
/// cannot be.
const PUNCTUATION: [(usize, char, &str); 10] = [
    (10, '!', "exclamation"),
    (11, '?', "question"),
    (12, '.', "period"),
    (13, '-', "dash"),
    (15, '…', "ellipsis"),
    (20, '♂', "male_sign"),
    (21, '♀', "female_sign"),
    (23, ',', "comma"),
    // Multiplication sign, read as a capital X.
    (24, 'X', "times"),
    (25, '/', "slash"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphName {
    pub symbol: char,
    pub stem: String,
}

impl GlyphName {
    fn plain(symbol: char) -> Self {
        Self {
            symbol,
            stem: symbol.to_string(),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.png", self.stem)
    }
}

pub fn glyph_for_ordinal(ordinal: usize) -> Option<GlyphName> {
    let letter = |offset: usize, base: u8| char::from(base + (ordinal - offset) as u8);

    match ordinal {
        o if (DIGIT_OFFSET..DIGIT_OFFSET + 10).contains(&o) => {
            Some(GlyphName::plain(letter(DIGIT_OFFSET, b'0')))
        }
        o if (DIGIT_OFFSET + 10..UPPERCASE_OFFSET).contains(&o) => PUNCTUATION
            .iter()
            .find(|(offset, _, _)| DIGIT_OFFSET + offset == o)
            .map(|&(_, symbol, stem)| GlyphName {
                symbol,
                stem: stem.to_string(),
            }),
        o if (UPPERCASE_OFFSET..LOWERCASE_OFFSET).contains(&o) => {
            Some(GlyphName::plain(letter(UPPERCASE_OFFSET, b'A')))
        }
        o if (LOWERCASE_OFFSET..LOWERCASE_OFFSET + 26).contains(&o) => {
            Some(GlyphName::plain(letter(LOWERCASE_OFFSET, b'a')))
        }
        _ => None,
    }
}

/// Symbol stored under a glyph file stem.
pub fn symbol_for_stem(stem: &str) -> Option<char> {
    let mut chars = stem.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphanumeric() {
            return Some(c);
        }
    }

    PUNCTUATION
        .iter()
        .find(|(_, _, s)| *s == stem)
        .map(|&(_, symbol, _)| symbol)
}
