use std::collections::HashMap;

use crate::detection::domain::parking_space_detector::ParkingSpaceDetector;
use crate::shared::detection::RawDetection;
use crate::shared::tile::Tile;

#[derive(Debug, thiserror::Error)]
#[error("no recorded detections for tile {0}")]
pub struct MissingTileError(pub usize);

/// Detector that replays previously recorded model output, keyed by tile
/// index.
///
/// A tile without a recording is an error, so it shows up as a failed tile
/// rather than as an empty one.
#[derive(Debug, Clone, Default)]
pub struct ReplayDetector {
    recordings: HashMap<usize, Vec<RawDetection>>,
}

impl ReplayDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, tile_index: usize, detections: Vec<RawDetection>) {
        self.recordings.insert(tile_index, detections);
    }

    pub fn len(&self) -> usize {
        self.recordings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recordings.is_empty()
    }
}

impl ParkingSpaceDetector for ReplayDetector {
    fn detect(
        &mut self,
        tile: &Tile,
        confidence: f64,
    ) -> Result<Vec<RawDetection>, Box<dyn std::error::Error>> {
        let recorded = self
            .recordings
            .get(&tile.tile_index)
            .ok_or(MissingTileError(tile.tile_index))?;
        Ok(recorded
            .iter()
            .filter(|d| d.confidence >= confidence)
            .cloned()
            .collect())
    }
}
