//! JSON job description: the tile grid plus recorded detector output.
//!
//! ```json
//! {
//!   "tiles": [
//!     {
//!       "tile_index": 0,
//!       "bounds": { "minLat": 52.0, "maxLat": 52.001, "minLng": 5.0, "maxLng": 5.001 },
//!       "image": "tiles/0.png",
//!       "detections": [ { "bbox": [10, 10, 50, 50], "confidence": 0.8 } ]
//!     }
//!   ]
//! }
//! ```
//!
//! A tile without `image` needs `width` and `height` and gets a blank raster.
//! A tile without `detections` has no recording and fails when analysed.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::detection::infrastructure::replay_detector::ReplayDetector;
use crate::shared::detection::RawDetection;
use crate::shared::raster::Raster;
use crate::shared::tile::{Tile, TileBounds};

use super::raster_reader::read_raster;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("failed to read job file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse job file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to decode image {path} of tile {tile_index}: {source}")]
    Image {
        tile_index: usize,
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("tile {0} has neither an image nor width and height")]
    MissingDimensions(usize),
    #[error("tile index {0} appears more than once")]
    DuplicateTile(usize),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFile {
    pub tiles: Vec<TileSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSpec {
    pub tile_index: usize,
    pub bounds: TileBounds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detections: Option<Vec<RawDetection>>,
}

impl JobFile {
    pub fn read(path: &Path) -> Result<Self, JobError> {
        let json = fs::read_to_string(path).map_err(|source| JobError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| JobError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Builds the tiles and a detector replaying the recorded detections.
    ///
    /// Relative image paths resolve against `base_dir`.
    pub fn into_tiles(self, base_dir: &Path) -> Result<(Vec<Tile>, ReplayDetector), JobError> {
        let mut tiles = Vec::with_capacity(self.tiles.len());
        let mut detector = ReplayDetector::new();

        for spec in self.tiles {
            if tiles.iter().any(|t: &Tile| t.tile_index == spec.tile_index) {
                return Err(JobError::DuplicateTile(spec.tile_index));
            }
            let image = load_image(&spec, base_dir)?;
            if let Some(detections) = spec.detections {
                detector.record(spec.tile_index, detections);
            }
            tiles.push(Tile::new(image, spec.tile_index, spec.bounds));
        }

        log::debug!(
            "Loaded {} tiles, {} with recorded detections",
            tiles.len(),
            detector.len()
        );
        Ok((tiles, detector))
    }
}

/// Reads a job file and resolves its images relative to the file.
pub fn load_job(path: &Path) -> Result<(Vec<Tile>, ReplayDetector), JobError> {
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    JobFile::read(path)?.into_tiles(base_dir)
}

fn load_image(spec: &TileSpec, base_dir: &Path) -> Result<Raster, JobError> {
    match (&spec.image, spec.width, spec.height) {
        (Some(image), _, _) => {
            let path = if image.is_absolute() {
                image.clone()
            } else {
                base_dir.join(image)
            };
            read_raster(&path).map_err(|source| JobError::Image {
                tile_index: spec.tile_index,
                path,
                source,
            })
        }
        (None, Some(w), Some(h)) => Ok(Raster::blank(w, h)),
        _ => Err(JobError::MissingDimensions(spec.tile_index)),
    }
}
