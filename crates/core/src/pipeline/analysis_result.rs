use serde::Serialize;

use crate::capacity::occupancy::{occupancy_stats, OccupancyStats};
use crate::shared::coordinate_space::Geographic;
use crate::shared::detection::{Detection, ParkingSpaceRecord};
use crate::shared::raster::Raster;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Completed,
    /// Stopped between tiles; the detections gathered so far are kept.
    Cancelled,
}

/// A tile image with its locally merged detections drawn on it.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionMask {
    pub tile_index: usize,
    pub image: Raster,
}

/// Final output of an analysis job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub status: JobStatus,
    pub detections: Vec<ParkingSpaceRecord>,
    pub total_spaces: usize,
    pub total_vehicles_detected: u32,
    pub total_capacity: u32,
    pub occupancy: OccupancyStats,
    pub failed_tiles: Vec<usize>,
    pub tiles_processed: usize,
    pub merge_fallbacks: usize,
    /// Empty unless the use case was given a mask renderer.
    #[serde(skip)]
    pub detection_masks: Vec<DetectionMask>,
}

impl AnalysisResult {
    pub fn new(
        status: JobStatus,
        detections: &[Detection<Geographic>],
        failed_tiles: Vec<usize>,
        tiles_processed: usize,
        merge_fallbacks: usize,
    ) -> Self {
        let total_vehicles_detected = detections.iter().map(|d| d.vehicle_count).sum();
        let total_capacity = detections.iter().map(|d| d.estimated_capacity).sum();
        Self {
            status,
            detections: detections.iter().map(ParkingSpaceRecord::from).collect(),
            total_spaces: detections.len(),
            total_vehicles_detected,
            total_capacity,
            occupancy: occupancy_stats(total_capacity, total_vehicles_detected),
            failed_tiles,
            tiles_processed,
            merge_fallbacks,
            detection_masks: Vec::new(),
        }
    }

    pub fn with_masks(mut self, masks: Vec<DetectionMask>) -> Self {
        self.detection_masks = masks;
        self
    }
}
