use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Slots per storage box.
pub const BOX_CAPACITY: usize = 30;

/// Gender marker shown next to the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }
}

/// Species the storage layout is planned around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Species {
    Poochyena,
    Nincada,
    Whismur,
    Taillow,
}

impl Species {
    pub const ALL: [Species; 4] = [
        Species::Poochyena,
        Species::Nincada,
        Species::Whismur,
        Species::Taillow,
    ];

    /// Label as rendered in the summary panel.
    pub fn label(self) -> &'static str {
        match self {
            Species::Poochyena => "POOCHYENA",
            Species::Nincada => "NINCADA",
            Species::Whismur => "WHISMUR",
            Species::Taillow => "TAILLOW",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.label() == label)
    }

    /// Every letter that can appear in a species label, first occurrence order.
    pub fn letters() -> String {
        let mut letters = String::new();
        for species in Self::ALL {
            for c in species.label().chars() {
                if !letters.contains(c) {
                    letters.push(c);
                }
            }
        }
        letters
    }
}

/// One decoded storage slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRecord {
    #[serde(rename = "name")]
    pub nickname: String,
    pub species: Option<String>,
    pub gender: Option<Gender>,
    #[serde(rename = "item")]
    pub held_item: String,
}

/// Decoded slots grouped into boxes of [`BOX_CAPACITY`], in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedBoxes {
    pub boxes: Vec<Vec<SlotRecord>>,
}

impl DecodedBoxes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a slot, opening a new box when the last one is full.
    pub fn push(&mut self, slot: SlotRecord) {
        match self.boxes.last_mut() {
            Some(current) if current.len() < BOX_CAPACITY => current.push(slot),
            _ => self.boxes.push(vec![slot]),
        }
    }

    pub fn slot_count(&self) -> usize {
        self.boxes.iter().map(Vec::len).sum()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize decoded boxes")
    }
}

impl FromIterator<SlotRecord> for DecodedBoxes {
    fn from_iter<I: IntoIterator<Item = SlotRecord>>(iter: I) -> Self {
        let mut boxes = Self::new();
        for slot in iter {
            boxes.push(slot);
        }
        boxes
    }
}
