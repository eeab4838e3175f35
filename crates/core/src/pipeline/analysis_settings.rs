use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::capacity::capacity_estimator::SpotType;
use crate::merging::domain::merge_config::{AreaStrategy, ConfigError, MergeConfig};
use crate::shared::constants::{
    DEFAULT_DETECTION_CONFIDENCE, DEFAULT_IOU_THRESHOLD, DEFAULT_MAX_MERGE_DISTANCE_PX,
    DEFAULT_METERS_PER_PIXEL, DEFAULT_MIN_OVERLAP_RATIO, DEFAULT_VEHICLE_CONFIDENCE,
    SETTINGS_DIR_NAME, SETTINGS_FILE_NAME,
};

use super::analyze_parking_use_case::AnalysisParams;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse settings {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write settings {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("no configuration directory on this platform")]
    NoConfigDir,
    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Merge thresholds in their wire shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeSettings {
    pub iou_threshold: f64,
    pub min_overlap_area: f64,
    pub max_distance: Option<f64>,
    pub enabled: bool,
}

impl MergeSettings {
    pub fn tile_default() -> Self {
        Self {
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            min_overlap_area: DEFAULT_MIN_OVERLAP_RATIO,
            max_distance: Some(DEFAULT_MAX_MERGE_DISTANCE_PX),
            enabled: true,
        }
    }

    pub fn global_default() -> Self {
        Self {
            max_distance: None,
            ..Self::tile_default()
        }
    }

    pub fn to_config(
        &self,
        area_strategy: AreaStrategy,
        meters_per_pixel: f64,
    ) -> Result<MergeConfig, ConfigError> {
        MergeConfig::new(
            self.iou_threshold,
            self.min_overlap_area,
            self.max_distance,
            self.enabled,
        )?
        .with_area_strategy(area_strategy)
        .with_meters_per_pixel(meters_per_pixel)
    }
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self::tile_default()
    }
}

/// User-facing analysis settings, stored as JSON.
///
/// Missing keys take their defaults, so older files keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub tile_merge: MergeSettings,
    pub global_merge: MergeSettings,
    pub meters_per_pixel: f64,
    pub spot_type: SpotType,
    pub area_strategy: AreaStrategy,
    pub detection_confidence: f64,
    pub vehicle_confidence: f64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            tile_merge: MergeSettings::tile_default(),
            global_merge: MergeSettings::global_default(),
            meters_per_pixel: DEFAULT_METERS_PER_PIXEL,
            spot_type: SpotType::default(),
            area_strategy: AreaStrategy::default(),
            detection_confidence: DEFAULT_DETECTION_CONFIDENCE,
            vehicle_confidence: DEFAULT_VEHICLE_CONFIDENCE,
        }
    }
}

impl AnalysisSettings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME))
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Settings from the user's config directory, or defaults when there is
    /// no readable file there.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load_from(&path).unwrap_or_else(|e| {
            log::warn!("{e}; using default settings");
            Self::default()
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let write_err = |source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| SettingsError::Write {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        fs::write(path, json).map_err(write_err)
    }

    pub fn save(&self) -> Result<PathBuf, SettingsError> {
        let path = Self::default_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Validated parameters for one analysis run.
    pub fn to_params(&self) -> Result<AnalysisParams, SettingsError> {
        check_unit("detection_confidence", self.detection_confidence)?;
        check_unit("vehicle_confidence", self.vehicle_confidence)?;

        Ok(AnalysisParams {
            tile_merge: self
                .tile_merge
                .to_config(self.area_strategy, self.meters_per_pixel)?,
            global_merge: self
                .global_merge
                .to_config(self.area_strategy, self.meters_per_pixel)?,
            spot_type: self.spot_type,
            detection_confidence: self.detection_confidence,
            vehicle_confidence: self.vehicle_confidence,
        })
    }
}

fn check_unit(name: &'static str, value: f64) -> Result<(), SettingsError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::Invalid {
            name,
            reason: format!("must be within [0, 1], got {value}"),
        })
    }
}
