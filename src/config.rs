use anyhow::{ensure, Context, Result};
use pcd_vision::{DEFAULT_CLUSTER_WIDTH, DEFAULT_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

pub const SCREENSHOT_FOLDER_VAR: &str = "PC_DEC_SCREENSHOT_FOLDER";
pub const WORKING_FOLDER_VAR: &str = "PC_DEC_WORKING_FOLDER";
pub const FONTS_FOLDER_VAR: &str = "PC_DEC_FONTS_FOLDER";
pub const OUTPUT_FONTS_FOLDER_VAR: &str = "PC_DEC_OUTPUT_FONTS_FOLDER";
pub const MATCH_THRESHOLD_VAR: &str = "PC_DEC_MATCH_THRESHOLD";
pub const CLUSTER_WIDTH_VAR: &str = "PC_DEC_CLUSTER_WIDTH";

/// Folders and tuning for one run of the decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Screenshots to decode
    pub screenshot_folder: PathBuf,
    /// Annotated copies of decoded screenshots; wiped on every run
    pub working_folder: PathBuf,
    /// Source sprite sheets
    pub fonts_folder: PathBuf,
    /// Glyph library built from the sheets
    pub output_fonts_folder: PathBuf,
    pub match_threshold: f64,
    pub cluster_width: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            screenshot_folder: PathBuf::from("./example/photo"),
            working_folder: PathBuf::from("./working"),
            fonts_folder: PathBuf::from("./fonts/input"),
            output_fonts_folder: PathBuf::from("./fonts/letters"),
            match_threshold: DEFAULT_THRESHOLD,
            cluster_width: DEFAULT_CLUSTER_WIDTH,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from `lookup`, falling back to the defaults for unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let path = |key: &str, default: PathBuf| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(default)
        };

        let config = Self {
            screenshot_folder: path(SCREENSHOT_FOLDER_VAR, defaults.screenshot_folder),
            working_folder: path(WORKING_FOLDER_VAR, defaults.working_folder),
            fonts_folder: path(FONTS_FOLDER_VAR, defaults.fonts_folder),
            output_fonts_folder: path(OUTPUT_FONTS_FOLDER_VAR, defaults.output_fonts_folder),
            match_threshold: parse(&lookup, MATCH_THRESHOLD_VAR, defaults.match_threshold)?,
            cluster_width: parse(&lookup, CLUSTER_WIDTH_VAR, defaults.cluster_width)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Replace the screenshot folder, e.g. from the command line.
    pub fn with_screenshot_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.screenshot_folder = folder.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.match_threshold.is_finite() && (-1.0..=1.0).contains(&self.match_threshold),
            "{} must be within [-1, 1], got {}",
            MATCH_THRESHOLD_VAR,
            self.match_threshold
        );
        ensure!(
            self.cluster_width > 0,
            "{} must be at least 1",
            CLUSTER_WIDTH_VAR
        );
        Ok(())
    }
}

fn parse<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        _ => Ok(default),
    }
}
