use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::pipeline::analysis_result::AnalysisResult;

/// Writes the result as pretty JSON to `output`, or to stdout when `None`.
pub fn write_result(result: &AnalysisResult, output: Option<&Path>) -> io::Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, json)
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{json}")
        }
    }
}

/// Saves every detection mask as `mask_<tile_index>.png` in `dir`.
pub fn write_masks(
    result: &AnalysisResult,
    dir: &Path,
) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(result.detection_masks.len());
    for mask in &result.detection_masks {
        let raster = &mask.image;
        if raster.channels() != 3 {
            return Err(format!(
                "mask of tile {} has {} channels, expected 3",
                mask.tile_index,
                raster.channels()
            )
            .into());
        }
        let img = image::RgbImage::from_raw(raster.width(), raster.height(), raster.data().to_vec())
            .ok_or("Failed to create image from mask data")?;
        let path = dir.join(format!("mask_{}.png", mask.tile_index));
        img.save(&path)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::analysis_result::{DetectionMask, JobStatus};
    use crate::shared::raster::Raster;
    use tempfile::TempDir;

    #[test]
    fn test_writes_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("result.json");
        let result = AnalysisResult::new(JobStatus::Completed, &[], vec![3], 4, 0);

        write_result(&result, Some(&path)).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["failed_tiles"], serde_json::json!([3]));
        assert_eq!(json["tiles_processed"], 4);
    }

    #[test]
    fn test_masks_saved_per_tile() {
        let dir = TempDir::new().unwrap();
        let mut pixels = vec![0u8; 4 * 2 * 3];
        pixels[..3].copy_from_slice(&[255, 0, 0]);
        let result = AnalysisResult::new(JobStatus::Completed, &[], vec![], 2, 0).with_masks(vec![
            DetectionMask {
                tile_index: 7,
                image: Raster::new(pixels, 4, 2, 3),
            },
            DetectionMask {
                tile_index: 9,
                image: Raster::blank(4, 2),
            },
        ]);

        let written = write_masks(&result, &dir.path().join("masks")).unwrap();

        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("mask_7.png"));
        let saved = image::open(&written[0]).unwrap().to_rgb8();
        assert_eq!(saved.dimensions(), (4, 2));
        assert_eq!(saved.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(saved.get_pixel(1, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_no_masks_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let result = AnalysisResult::new(JobStatus::Completed, &[], vec![], 1, 0);
        assert!(write_masks(&result, dir.path()).unwrap().is_empty());
    }
}
