use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::capacity::capacity_estimator::SpotType;
use crate::detection::domain::mask_renderer::MaskRenderer;
use crate::detection::domain::parking_space_detector::ParkingSpaceDetector;
use crate::detection::domain::vehicle_counter::VehicleCounter;
use crate::merging::domain::group_merger::MergeError;
use crate::merging::domain::merge_config::MergeConfig;
use crate::merging::domain::merge_engine::merge_detections;
use crate::shared::constants::{
    DEFAULT_DETECTION_CONFIDENCE, DEFAULT_VEHICLE_CONFIDENCE, TILE_PROGRESS_SHARE,
};
use crate::shared::coordinate_space::Geographic;
use crate::shared::detection::Detection;
use crate::shared::tile::Tile;

use super::analysis_result::{AnalysisResult, DetectionMask, JobStatus};
use super::geo_projector::project_detection;
use super::pipeline_logger::PipelineLogger;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("no tiles to analyse")]
    NoTiles,
    #[error("global merge failed: {0}")]
    GlobalMerge(#[from] MergeError),
}

/// Validated parameters of one analysis run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisParams {
    pub tile_merge: MergeConfig,
    pub global_merge: MergeConfig,
    pub spot_type: SpotType,
    pub detection_confidence: f64,
    pub vehicle_confidence: f64,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            tile_merge: MergeConfig::pixel_default(),
            global_merge: MergeConfig::geographic_default(),
            spot_type: SpotType::default(),
            detection_confidence: DEFAULT_DETECTION_CONFIDENCE,
            vehicle_confidence: DEFAULT_VEHICLE_CONFIDENCE,
        }
    }
}

/// Callback receiving overall progress in percent. Returning `false`
/// cancels the run before the next tile.
pub type ProgressCallback = Box<dyn Fn(u32) -> bool + Send>;

/// Analyses a grid of tiles: per tile detect, merge in pixel space, count
/// vehicles, project and estimate capacity; then merge across tiles in
/// geographic space.
///
/// A failing tile is recorded and skipped. Cancellation is checked between
/// tiles and keeps what was gathered, which still goes through the global
/// merge.
pub struct AnalyzeParkingUseCase {
    detector: Box<dyn ParkingSpaceDetector>,
    vehicle_counter: Option<Box<dyn VehicleCounter>>,
    logger: Box<dyn PipelineLogger>,
    params: AnalysisParams,
    on_progress: Option<ProgressCallback>,
    cancelled: Arc<AtomicBool>,
    mask_renderer: Option<Box<dyn MaskRenderer>>,
}

/// What one tile contributes to the job.
struct TileOutput {
    detections: Vec<Detection<Geographic>>,
    fallbacks: usize,
    mask: Option<DetectionMask>,
}

impl AnalyzeParkingUseCase {
    pub fn new(
        detector: Box<dyn ParkingSpaceDetector>,
        vehicle_counter: Option<Box<dyn VehicleCounter>>,
        logger: Box<dyn PipelineLogger>,
        params: AnalysisParams,
        on_progress: Option<ProgressCallback>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            detector,
            vehicle_counter,
            logger,
            params,
            on_progress,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
            mask_renderer: None,
        }
    }

    /// Draws the locally merged detections of every tile onto a copy of its
    /// image; the copies end up in [`AnalysisResult::detection_masks`].
    pub fn with_mask_renderer(mut self, renderer: Box<dyn MaskRenderer>) -> Self {
        self.mask_renderer = Some(renderer);
        self
    }

    pub fn execute(&mut self, tiles: &[Tile]) -> Result<AnalysisResult, PipelineError> {
        if tiles.is_empty() {
            return Err(PipelineError::NoTiles);
        }

        let total = tiles.len();
        self.logger.info(&format!("Analysing {total} tiles"));
        self.report_progress(0);

        let mut gathered: Vec<Detection<Geographic>> = Vec::new();
        let mut failed_tiles: Vec<usize> = Vec::new();
        let mut masks: Vec<DetectionMask> = Vec::new();
        let mut fallbacks = 0;
        let mut processed = 0;
        let mut status = JobStatus::Completed;

        for (i, tile) in tiles.iter().enumerate() {
            if self.cancelled.load(Ordering::Relaxed) {
                status = JobStatus::Cancelled;
                self.logger
                    .info(&format!("Cancelled after {processed} of {total} tiles"));
                break;
            }

            match self.process_tile(tile) {
                Ok(output) => {
                    self.logger.info(&format!(
                        "Tile {}: {} spaces, {} vehicles",
                        tile.tile_index,
                        output.detections.len(),
                        output.detections.iter().map(|d| d.vehicle_count).sum::<u32>()
                    ));
                    fallbacks += output.fallbacks;
                    gathered.extend(output.detections);
                    masks.extend(output.mask);
                }
                Err(e) => {
                    log::error!("Tile {} failed: {e}", tile.tile_index);
                    failed_tiles.push(tile.tile_index);
                }
            }

            processed = i + 1;
            self.logger.progress(processed, total);
            let percent = (processed as f64 / total as f64 * TILE_PROGRESS_SHARE) as u32;
            self.report_progress(percent);
        }

        let before = gathered.len();
        let start = Instant::now();
        let report = merge_detections(gathered, &self.params.global_merge)?;
        self.logger
            .timing("global_merge", start.elapsed().as_secs_f64() * 1000.0);
        fallbacks += report.fallbacks;
        if report.detections.len() < before {
            self.logger.info(&format!(
                "Global merge: {before} -> {} detections",
                report.detections.len()
            ));
        }

        self.report_progress(100);
        self.logger.summary();

        Ok(AnalysisResult::new(
            status,
            &report.detections,
            failed_tiles,
            processed,
            fallbacks,
        )
        .with_masks(masks))
    }

    fn process_tile(
        &mut self,
        tile: &Tile,
    ) -> Result<TileOutput, Box<dyn std::error::Error>> {
        let start = Instant::now();
        let raw = self
            .detector
            .detect(tile, self.params.detection_confidence)?;
        self.logger
            .timing("detect", start.elapsed().as_secs_f64() * 1000.0);
        self.logger.metric("raw_detections", raw.len() as f64);

        let pixel = raw
            .into_iter()
            .map(|r| r.into_detection(tile.tile_index))
            .collect();
        let start = Instant::now();
        let report = merge_detections(pixel, &self.params.tile_merge)?;
        self.logger
            .timing("tile_merge", start.elapsed().as_secs_f64() * 1000.0);

        let mask = match &self.mask_renderer {
            Some(renderer) => {
                let mut image = tile.image.clone();
                renderer.render(&mut image, &report.detections)?;
                Some(DetectionMask {
                    tile_index: tile.tile_index,
                    image,
                })
            }
            None => None,
        };

        let mut projected = Vec::with_capacity(report.detections.len());
        for mut detection in report.detections {
            if let Some(counter) = self.vehicle_counter.as_mut() {
                let env = detection.envelope();
                let crop = tile.image.crop(env.min_x, env.min_y, env.max_x, env.max_y);
                detection.vehicle_count = counter.count(&crop, self.params.vehicle_confidence)?;
            }
            projected.push(project_detection(
                &detection,
                tile,
                self.params.tile_merge.meters_per_pixel(),
                self.params.spot_type,
            ));
        }
        Ok(TileOutput {
            detections: projected,
            fallbacks: report.fallbacks,
            mask,
        })
    }

    fn report_progress(&self, percent: u32) {
        if let Some(ref cb) = self.on_progress {
            if !cb(percent) {
                self.cancelled.store(true, Ordering::Relaxed);
            }
        }
    }
}
