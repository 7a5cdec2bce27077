use anyhow::{Context, Result};
use pcd_capture::{list_screenshots, load_screenshot};
use pcd_state::DecodedBoxes;
use pcd_vision::SlotDecoder;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Manages the screenshot folder → slot decoder → boxes pipeline
pub struct BatchDecoder<'a> {
    decoder: SlotDecoder<'a>,
}

impl<'a> BatchDecoder<'a> {
    pub fn new(decoder: SlotDecoder<'a>) -> Self {
        Self { decoder }
    }

    /// Decode every `*.png` of `dir`, in natural file-name order.
    pub fn decode_folder(&self, dir: &Path) -> Result<DecodedBoxes> {
        let paths = list_screenshots(dir)?;
        info!("Decoding {} screenshots from {}", paths.len(), dir.display());
        self.decode_paths(&paths)
    }

    /// Decode `paths` in order. The first failure aborts the batch.
    pub fn decode_paths(&self, paths: &[PathBuf]) -> Result<DecodedBoxes> {
        let mut boxes = DecodedBoxes::new();

        for path in paths {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned());
            let slot = load_screenshot(path)
                .and_then(|img| self.decoder.decode(&img, stem.as_deref()))
                .with_context(|| format!("Failed to decode {}", path.display()))?;
            debug!("{} -> {}", path.display(), slot.nickname);
            boxes.push(slot);
        }

        info!(
            "Decoded {} slots into {} boxes",
            boxes.slot_count(),
            boxes.boxes.len()
        );
        Ok(boxes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcd_state::Gender;
    use pcd_vision::fixtures::{render_slot, synthetic_library};

    fn write_slot(dir: &Path, file: &str, name: &str) -> PathBuf {
        let path = dir.join(file);
        render_slot(name, Some("POOCHYENA"), Some(Gender::Male), "")
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_natural_file_order() {
        let dir = tempfile::tempdir().unwrap();
        write_slot(dir.path(), "shot10.png", "TenthShotZ");
        write_slot(dir.path(), "shot2.png", "SecondShot");
        write_slot(dir.path(), "shot1.png", "FirstShotA");
        std::fs::write(dir.path().join("notes.txt"), "not a screenshot").unwrap();

        let library = synthetic_library();
        let batch = BatchDecoder::new(SlotDecoder::new(&library));
        let boxes = batch.decode_folder(dir.path()).unwrap();

        assert_eq!(boxes.boxes.len(), 1);
        let names: Vec<&str> = boxes.boxes[0].iter().map(|s| s.nickname.as_str()).collect();
        assert_eq!(names, ["FirstShotA", "SecondShot", "TenthShotZ"]);
        assert_eq!(boxes.boxes[0][0].species.as_deref(), Some("POOCHYENA"));
        assert_eq!(boxes.boxes[0][0].gender, Some(Gender::Male));
    }

    #[test]
    fn test_box_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_slot(dir.path(), "slot.png", "BoxedSlotX");
        let paths = vec![path; 31];

        let library = synthetic_library();
        let boxes = BatchDecoder::new(SlotDecoder::new(&library))
            .decode_paths(&paths)
            .unwrap();

        assert_eq!(boxes.slot_count(), 31);
        assert_eq!(boxes.boxes.len(), 2);
        assert_eq!(boxes.boxes[0].len(), 30);
        assert_eq!(boxes.boxes[1].len(), 1);
    }

    #[test]
    fn test_empty_folder() {
        let dir = tempfile::tempdir().unwrap();
        let library = synthetic_library();
        let boxes = BatchDecoder::new(SlotDecoder::new(&library))
            .decode_folder(dir.path())
            .unwrap();
        assert_eq!(boxes.to_json().unwrap(), r#"{"boxes":[]}"#);
    }

    #[test]
    fn test_aborts_on_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        write_slot(dir.path(), "shot1.png", "FirstShotA");
        std::fs::write(dir.path().join("shot2.png"), b"definitely not a png").unwrap();
        write_slot(dir.path(), "shot3.png", "ThirdShotB");

        let library = synthetic_library();
        let err = BatchDecoder::new(SlotDecoder::new(&library))
            .decode_folder(dir.path())
            .unwrap_err();
        assert!(err.to_string().contains("shot2.png"), "{:#}", err);
    }

    #[test]
    fn test_undecodable_name_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        write_slot(dir.path(), "shot1.png", "Short");

        let library = synthetic_library();
        let batch = BatchDecoder::new(SlotDecoder::new(&library).with_working_dir(work.path()));
        let err = batch.decode_folder(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("characters in name"));
        // Annotated image is still written for the failing slot
        assert!(work.path().join("shot1_res.png").exists());
    }
}
