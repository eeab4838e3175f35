use serde::{Deserialize, Serialize};

use crate::shared::constants::{
    DEFAULT_IOU_THRESHOLD, DEFAULT_MAX_MERGE_DISTANCE_PX, DEFAULT_METERS_PER_PIXEL,
    DEFAULT_MIN_OVERLAP_RATIO,
};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("iou_threshold must be within [0, 1], got {0}")]
    IouThreshold(f64),
    #[error("min_overlap_ratio must be within [0, 1], got {0}")]
    MinOverlapRatio(f64),
    #[error("max_merge_distance must be positive and finite, got {0}")]
    MaxMergeDistance(f64),
    #[error("meters_per_pixel must be positive and finite, got {0}")]
    MetersPerPixel(f64),
}

/// How the area of a merged detection is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaStrategy {
    /// Sum of the members' areas. Overlapping parts are counted twice.
    #[default]
    SumOfParts,
    /// Area of the union polygon, converted to square meters.
    FromGeometry,
}

impl std::fmt::Display for AreaStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AreaStrategy::SumOfParts => write!(f, "sum_of_parts"),
            AreaStrategy::FromGeometry => write!(f, "from_geometry"),
        }
    }
}

impl std::str::FromStr for AreaStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sum_of_parts" | "sum" => Ok(AreaStrategy::SumOfParts),
            "from_geometry" | "geometry" => Ok(AreaStrategy::FromGeometry),
            other => Err(format!(
                "unknown area strategy '{other}' (expected sum_of_parts or from_geometry)"
            )),
        }
    }
}

/// Thresholds controlling one merge call.
///
/// Validated at construction and immutable afterwards. Distances are in the
/// units of the coordinate space the config is used with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeConfig {
    iou_threshold: f64,
    min_overlap_ratio: f64,
    max_merge_distance: Option<f64>,
    enabled: bool,
    area_strategy: AreaStrategy,
    meters_per_pixel: f64,
}

impl MergeConfig {
    pub fn new(
        iou_threshold: f64,
        min_overlap_ratio: f64,
        max_merge_distance: Option<f64>,
        enabled: bool,
    ) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&iou_threshold) {
            return Err(ConfigError::IouThreshold(iou_threshold));
        }
        if !(0.0..=1.0).contains(&min_overlap_ratio) {
            return Err(ConfigError::MinOverlapRatio(min_overlap_ratio));
        }
        if let Some(distance) = max_merge_distance {
            if !(distance.is_finite() && distance > 0.0) {
                return Err(ConfigError::MaxMergeDistance(distance));
            }
        }
        Ok(Self {
            iou_threshold,
            min_overlap_ratio,
            max_merge_distance,
            enabled,
            area_strategy: AreaStrategy::default(),
            meters_per_pixel: DEFAULT_METERS_PER_PIXEL,
        })
    }

    /// Defaults for per-tile merges in pixel space.
    pub fn pixel_default() -> Self {
        Self {
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            min_overlap_ratio: DEFAULT_MIN_OVERLAP_RATIO,
            max_merge_distance: Some(DEFAULT_MAX_MERGE_DISTANCE_PX),
            enabled: true,
            area_strategy: AreaStrategy::default(),
            meters_per_pixel: DEFAULT_METERS_PER_PIXEL,
        }
    }

    /// Defaults for the global merge in degrees. A pixel distance has no
    /// meaning there, so the proximity fallback is off.
    pub fn geographic_default() -> Self {
        Self {
            max_merge_distance: None,
            ..Self::pixel_default()
        }
    }

    pub fn with_area_strategy(mut self, strategy: AreaStrategy) -> Self {
        self.area_strategy = strategy;
        self
    }

    pub fn with_meters_per_pixel(mut self, meters_per_pixel: f64) -> Result<Self, ConfigError> {
        if !(meters_per_pixel.is_finite() && meters_per_pixel > 0.0) {
            return Err(ConfigError::MetersPerPixel(meters_per_pixel));
        }
        self.meters_per_pixel = meters_per_pixel;
        Ok(self)
    }

    pub fn iou_threshold(&self) -> f64 {
        self.iou_threshold
    }

    pub fn min_overlap_ratio(&self) -> f64 {
        self.min_overlap_ratio
    }

    pub fn max_merge_distance(&self) -> Option<f64> {
        self.max_merge_distance
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn area_strategy(&self) -> AreaStrategy {
        self.area_strategy
    }

    pub fn meters_per_pixel(&self) -> f64 {
        self.meters_per_pixel
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self::pixel_default()
    }
}
