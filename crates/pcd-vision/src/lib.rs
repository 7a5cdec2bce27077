mod annotate;
pub mod glyph_matcher;
pub mod resolver;
pub mod slot_decoder;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

pub use annotate::{Annotation, FEMALE_BOX_COLOR, MALE_BOX_COLOR};
pub use glyph_matcher::{correlate, GlyphMatcher, Match, ScoreMap, DEFAULT_THRESHOLD};
pub use resolver::{text_of, MatchResolver, DEFAULT_CLUSTER_WIDTH};
pub use slot_decoder::{repair_name, SlotDecoder, NAME_LENGTH, NAME_SYMBOLS};
