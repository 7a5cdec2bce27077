use anyhow::{Context, Result};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Compare two names so that embedded numbers order by value
/// (`shot2` before `shot10`).
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (mut a_rest, mut b_rest) = (a, b);
    loop {
        match (next_chunk(a_rest), next_chunk(b_rest)) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some((ca, ra)), Some((cb, rb))) => {
                let ord = match (is_digits(ca), is_digits(cb)) {
                    (true, true) => cmp_numeric(ca, cb),
                    // Numbers sort before words, like natsort does
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    (false, false) => ca.cmp(cb),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
                a_rest = ra;
                b_rest = rb;
            }
        }
    }
}

/// Split off the leading run of digits or non-digits.
fn next_chunk(s: &str) -> Option<(&str, &str)> {
    let first = s.chars().next()?;
    let digit = first.is_ascii_digit();
    let end = s
        .char_indices()
        .find(|(_, c)| c.is_ascii_digit() != digit)
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    Some(s.split_at(end))
}

fn is_digits(chunk: &str) -> bool {
    chunk.bytes().all(|b| b.is_ascii_digit())
}

/// Compare digit runs by value without overflowing on long runs.
fn cmp_numeric(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
}

/// List the `.png` screenshots of a folder in natural file-name order.
pub fn list_screenshots(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read screenshot folder {}", dir.display()))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.ends_with(".png") {
            debug!("Skipping non-png entry {}", name);
            continue;
        }
        names.push(name);
    }

    names.sort_by(|a, b| natural_cmp(a, b));
    Ok(names.into_iter().map(|n| dir.join(n)).collect())
}
