use anyhow::{bail, ensure, Context, Result};
use image::RgbImage;
use pcd_capture::{crop_field, regions, to_gray, Field};
use pcd_fonts::{symbol_color, FontVariant, GlyphLibrary};
use pcd_state::{Gender, SlotRecord, Species};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::annotate::{Annotation, FEMALE_BOX_COLOR, MALE_BOX_COLOR};
use crate::glyph_matcher::GlyphMatcher;
use crate::resolver::{text_of, MatchResolver};

/// Length every nickname in storage is given
pub const NAME_LENGTH: usize = 10;

/// Symbols a nickname may contain. `l`, `L`, `0` and `1` are never used in
/// names and are left out so they cannot be confused with `I` and `O`.
pub const NAME_SYMBOLS: &str =
    "aAbBcCdDeEfFgGhHiIjJkKmMnNoOpPqQrRsStTuUvVwWxXyYzZ23456789!?/-…♂♀";

/// Decodes one summary-panel screenshot into a [`SlotRecord`].
///
/// Holds everything a decode needs; nothing is shared between decodes except
/// the borrowed glyph library.
pub struct SlotDecoder<'a> {
    library: &'a GlyphLibrary,
    matcher: GlyphMatcher,
    resolver: MatchResolver,
    working_dir: Option<PathBuf>,
}

impl<'a> SlotDecoder<'a> {
    pub fn new(library: &'a GlyphLibrary) -> Self {
        Self {
            library,
            matcher: GlyphMatcher::default(),
            resolver: MatchResolver::default(),
            working_dir: None,
        }
    }

    pub fn with_matcher(mut self, matcher: GlyphMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_resolver(mut self, resolver: MatchResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Write annotated copies of decoded screenshots to `dir`.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Decode all four fields. `working_name` names the annotated copy
    /// (`<working_name>_res.png`); without it, or without a working
    /// directory, nothing is written.
    pub fn decode(&self, image: &RgbImage, working_name: Option<&str>) -> Result<SlotRecord> {
        let path = match (&self.working_dir, working_name) {
            (Some(dir), Some(name)) => Some(dir.join(format!("{}_res.png", name))),
            _ => None,
        };
        let mut notes = Annotation::new(image, path);

        let name = self.read_field(
            image,
            Field::Name,
            FontVariant::Normal,
            Some(NAME_SYMBOLS),
            &mut notes,
        );
        notes.flush();
        let Some(name) = name? else {
            bail!("Name could not be read");
        };
        let name = if name.chars().count() > NAME_LENGTH {
            let repaired = repair_name(&name, NAME_LENGTH);
            debug!("Repaired name {:?} -> {:?}", name, repaired);
            repaired
        } else {
            name
        };
        ensure!(
            name.chars().count() == NAME_LENGTH,
            "Expected {} characters in name, got {:?} ({})",
            NAME_LENGTH,
            name,
            name.chars().count()
        );

        let species_letters = Species::letters();
        let species = self.read_field(
            image,
            Field::Species,
            FontVariant::Short,
            Some(&species_letters),
            &mut notes,
        )?;
        notes.flush();
        match &species {
            Some(label) if Species::from_label(label).is_none() => {
                warn!("{:?} is not a known species", label)
            }
            None => debug!("No species found"),
            _ => {}
        }

        let gender = self.read_gender(image, &mut notes);
        notes.flush();

        let held_item = self
            .read_field(image, Field::HeldItem, FontVariant::SmallNarrow, None, &mut notes)?
            .unwrap_or_default();
        notes.flush();

        debug!(
            "Slot: name={:?} species={:?} gender={:?} item={:?}",
            name, species, gender, held_item
        );

        Ok(SlotRecord {
            nickname: name,
            species,
            gender,
            held_item,
        })
    }

    /// Text of one field, `None` when no glyph was found in it.
    fn read_field(
        &self,
        image: &RgbImage,
        field: Field,
        variant: FontVariant,
        only: Option<&str>,
        notes: &mut Annotation,
    ) -> Result<Option<String>> {
        let alphabet = self
            .library
            .alphabet(variant, only)
            .with_context(|| format!("Glyph library incomplete for the {} field", field.label()))?;

        let (top, _) = regions::field_rows(field, image.height());
        let search = to_gray(&crop_field(image, field));
        let matches = self.matcher.find_all(&search, &alphabet);
        let resolved = self.resolver.resolve(matches);

        for m in &resolved {
            notes.outline(m, top, symbol_color(m.symbol));
        }

        if resolved.is_empty() {
            Ok(None)
        } else {
            Ok(Some(text_of(&resolved)))
        }
    }

    /// Male is checked first; the first marker with any hit wins.
    fn read_gender(&self, image: &RgbImage, notes: &mut Annotation) -> Option<Gender> {
        let (top, _) = regions::field_rows(Field::Gender, image.height());
        let search = to_gray(&crop_field(image, Field::Gender));

        let markers = [
            (Gender::Male, self.library.male_marker(), MALE_BOX_COLOR),
            (Gender::Female, self.library.female_marker(), FEMALE_BOX_COLOR),
        ];
        for (gender, marker, color) in markers {
            if let Some(first) = self.matcher.find(&search, marker).first() {
                notes.outline(first, top, color);
                return Some(gender);
            }
        }
        None
    }
}

/// Shorten a name read with doubled characters.
///
/// A wide glyph can be matched twice in neighbouring columns. While the name
/// is longer than `target`, the second character of the first adjacent
/// identical pair is removed. Stops early when no such pair is left.
pub fn repair_name(name: &str, target: usize) -> String {
    let mut chars: Vec<char> = name.chars().collect();
    while chars.len() > target {
        let Some(i) = (1..chars.len()).find(|&i| chars[i] == chars[i - 1]) else {
            break;
        };
        chars.remove(i);
    }
    chars.into_iter().collect()
}
