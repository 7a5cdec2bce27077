pub mod config;
pub mod pipeline;

use anyhow::{Context, Result};
use pcd_fonts::GlyphLibrary;
use pcd_vision::{GlyphMatcher, MatchResolver, SlotDecoder};
use std::path::Path;
use tracing::info;

pub use config::Config;
pub use pipeline::BatchDecoder;

/// Decode the configured screenshot folder and print the boxes as JSON.
///
/// `args` are the command-line arguments after the program name; the first
/// one, if any, replaces the screenshot folder.
pub fn run(args: &[String]) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pc_decoder_lib=info,pcd_capture=info,pcd_fonts=info,pcd_vision=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::from_env()?;
    if let Some(folder) = args.first() {
        config = config.with_screenshot_folder(folder);
    }
    info!("Screenshots: {}", config.screenshot_folder.display());

    pcd_fonts::ensure_all(&config.fonts_folder, &config.output_fonts_folder)?;
    reset_dir(&config.working_folder)?;

    let library = GlyphLibrary::load(&config.output_fonts_folder)?;
    info!("Glyph library ready: {} templates", library.template_count());

    let decoder = SlotDecoder::new(&library)
        .with_matcher(GlyphMatcher::new(config.match_threshold))
        .with_resolver(MatchResolver::new(config.cluster_width))
        .with_working_dir(&config.working_folder);
    let boxes = BatchDecoder::new(decoder).decode_folder(&config.screenshot_folder)?;

    println!("{}", boxes.to_json()?);
    Ok(())
}

/// Empty `dir`, creating it if needed.
fn reset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        std::fs::remove_dir_all(dir)
            .with_context(|| format!("Failed to clear {}", dir.display()))?;
    }
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_dir() {
        let root = tempfile::tempdir().unwrap();
        let work = root.path().join("working");
        std::fs::create_dir_all(work.join("nested")).unwrap();
        std::fs::write(work.join("old_res.png"), b"stale").unwrap();

        reset_dir(&work).unwrap();
        assert!(work.is_dir());
        assert_eq!(std::fs::read_dir(&work).unwrap().count(), 0);

        let fresh = root.path().join("fresh");
        reset_dir(&fresh).unwrap();
        assert!(fresh.is_dir());
    }
}
