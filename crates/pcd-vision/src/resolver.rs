use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::glyph_matcher::Match;

/// Width in pixels of the columns matches are bucketed into
pub const DEFAULT_CLUSTER_WIDTH: u32 = 4;

/// Collapses the raw matches of a text line into one match per character.
///
/// One rendered character shows up as several neighbouring hits, often from
/// more than one template. Matches are bucketed by `x / cluster_width` and
/// only the most confident one of each bucket survives.
#[derive(Debug, Clone, Copy)]
pub struct MatchResolver {
    pub cluster_width: u32,
}

impl Default for MatchResolver {
    fn default() -> Self {
        Self {
            cluster_width: DEFAULT_CLUSTER_WIDTH,
        }
    }
}

impl MatchResolver {
    pub fn new(cluster_width: u32) -> Self {
        Self { cluster_width }
    }

    /// Surviving matches, left to right.
    ///
    /// Ties keep the earliest match after a stable sort on `(x, y)`, so the
    /// input order decides between equally confident hits.
    pub fn resolve(&self, mut matches: Vec<Match>) -> Vec<Match> {
        matches.sort_by_key(|m| (m.x, m.y));

        let width = self.cluster_width.max(1);
        let mut clusters: BTreeMap<u32, Match> = BTreeMap::new();
        for m in matches {
            match clusters.entry(m.x / width) {
                Entry::Vacant(slot) => {
                    slot.insert(m);
                }
                Entry::Occupied(mut best) => {
                    if m.confidence > best.get().confidence {
                        best.insert(m);
                    }
                }
            }
        }

        clusters.into_values().collect()
    }

    /// Text read from raw matches, `None` when nothing was found.
    pub fn read(&self, matches: Vec<Match>) -> Option<String> {
        let resolved = self.resolve(matches);
        if resolved.is_empty() {
            None
        } else {
            Some(text_of(&resolved))
        }
    }
}

pub fn text_of(resolved: &[Match]) -> String {
    resolved.iter().map(|m| m.symbol).collect()
}
