/// Ground resolution of the PDOK aerial imagery (5 cm per pixel).
pub const DEFAULT_METERS_PER_PIXEL: f64 = 0.05;

/// Detector confidence floor for parking spaces.
pub const DEFAULT_DETECTION_CONFIDENCE: f64 = 0.25;

/// Vehicle counter confidence floor.
pub const DEFAULT_VEHICLE_CONFIDENCE: f64 = 0.5;

pub const DEFAULT_IOU_THRESHOLD: f64 = 0.1;
pub const DEFAULT_MIN_OVERLAP_RATIO: f64 = 0.05;

/// Pixel-space proximity fallback for fragments split by a tile seam.
pub const DEFAULT_MAX_MERGE_DISTANCE_PX: f64 = 50.0;

/// Band that globally merged confidences are rescaled into.
pub const MERGED_CONFIDENCE_LOW: f64 = 0.8;
pub const MERGED_CONFIDENCE_HIGH: f64 = 0.9;
/// Value for a group whose confidences are all equal.
pub const MERGED_CONFIDENCE_MID: f64 = 0.85;

/// Mean length of one degree of latitude, used for the local planar
/// approximation of geographic areas.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Share of the 0–100 progress range spent in the per-tile loop.
pub const TILE_PROGRESS_SHARE: f64 = 80.0;

pub const SETTINGS_DIR_NAME: &str = "parkscan";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
