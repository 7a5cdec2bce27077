//! CLI tool to decode a single summary-panel screenshot and dump what was read.
//! Usage: cargo run --bin analyze_screenshot --features cli -- <screenshot.png> [glyph_dir] [output_dir]

use anyhow::{Context, Result};
use pcd_capture::{crop_field, load_screenshot, regions, Field};
use pcd_fonts::GlyphLibrary;
use pcd_vision::SlotDecoder;
use std::path::PathBuf;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <screenshot.png> [glyph_dir] [output_dir]", args[0]);
        std::process::exit(1);
    }

    let input_path = PathBuf::from(&args[1]);
    let glyph_dir = PathBuf::from(args.get(2).map_or("./fonts/letters", String::as_str));
    let output_dir = PathBuf::from(args.get(3).map_or("./debug_output", String::as_str));
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    println!("Loading image: {}", input_path.display());
    let img = load_screenshot(&input_path)?;
    let (w, h) = img.dimensions();
    println!("Image size: {}x{}", w, h);

    println!("\n=== Field Bands ===");
    for field in Field::ALL {
        let (top, bottom) = regions::field_rows(field, h);
        println!("{:<8} rows {}..{}", field.label(), top, bottom);
        let crop = crop_field(&img, field);
        if crop.width() > 0 && crop.height() > 0 {
            let _ = crop.save(output_dir.join(format!("{}_crop.png", field.label())));
        }
    }

    println!("\n=== Glyph Library ===");
    let library = GlyphLibrary::load(&glyph_dir)?;
    println!("{} templates from {}", library.template_count(), glyph_dir.display());

    println!("\n=== Decoded Slot ===");
    let stem = input_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "screenshot".to_string());
    let decoder = SlotDecoder::new(&library).with_working_dir(&output_dir);
    let slot = decoder.decode(&img, Some(&stem))?;
    println!("Name:    {}", slot.nickname);
    println!("Species: {:?}", slot.species);
    println!("Gender:  {:?}", slot.gender.map(|g| g.as_str()));
    println!("Item:    {:?}", slot.held_item);

    println!("\nDebug images saved to: {}", output_dir.display());
    Ok(())
}
