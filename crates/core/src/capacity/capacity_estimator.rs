use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::geometry::polygon_metrics::{bounding_dimensions, polygon_area};

/// Share of a lot's area usable for parking at the low, best and high end.
/// The rest goes to aisles and turning space.
const EFFICIENCY_LOW: f64 = 0.65;
const EFFICIENCY_BEST: f64 = 0.75;
const EFFICIENCY_HIGH: f64 = 0.85;

/// Calibrated parking spot footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpotType {
    #[default]
    Standard,
    Compact,
}

impl SpotType {
    pub const ALL: &[SpotType] = &[SpotType::Standard, SpotType::Compact];

    pub fn length_m(&self) -> f64 {
        match self {
            SpotType::Standard => 5.0,
            SpotType::Compact => 4.5,
        }
    }

    pub fn width_m(&self) -> f64 {
        match self {
            SpotType::Standard => 2.5,
            SpotType::Compact => 2.3,
        }
    }

    pub fn area_m2(&self) -> f64 {
        match self {
            SpotType::Standard => 12.5,
            SpotType::Compact => 10.35,
        }
    }
}

impl std::fmt::Display for SpotType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpotType::Standard => write!(f, "standard"),
            SpotType::Compact => write!(f, "compact"),
        }
    }
}

impl std::str::FromStr for SpotType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(SpotType::Standard),
            "compact" => Ok(SpotType::Compact),
            other => Err(format!(
                "unknown spot type '{other}' (expected standard or compact)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CapacityEstimate {
    pub area_sq_meters: f64,
    pub dimensions_meters: (f64, f64),
    pub estimated_capacity: u32,
    pub capacity_range: (u32, u32),
    /// Spots along the longer side; a sanity check, not the primary figure.
    pub linear_estimate: Option<u32>,
    pub spot_type: SpotType,
}

/// Capacity of a pixel-space polygon or box ring.
pub fn estimate_capacity(
    points: &[Coord<f64>],
    meters_per_pixel: f64,
    spot_type: SpotType,
) -> CapacityEstimate {
    let area_m2 = polygon_area(points) * meters_per_pixel * meters_per_pixel;
    let (width_px, height_px) = bounding_dimensions(points);
    let width_m = width_px * meters_per_pixel;
    let height_m = height_px * meters_per_pixel;

    let linear = (width_m.max(height_m) / spot_type.width_m()).trunc() as u32;
    CapacityEstimate {
        linear_estimate: Some(linear),
        ..from_area(area_m2, width_m, height_m, spot_type)
    }
}

/// Capacity of a full `width_px × height_px` rectangle, e.g. a cropped image.
pub fn estimate_capacity_from_dimensions(
    width_px: u32,
    height_px: u32,
    meters_per_pixel: f64,
    spot_type: SpotType,
) -> CapacityEstimate {
    let width_m = width_px as f64 * meters_per_pixel;
    let height_m = height_px as f64 * meters_per_pixel;
    from_area(width_m * height_m, width_m, height_m, spot_type)
}

fn from_area(area_m2: f64, width_m: f64, height_m: f64, spot_type: SpotType) -> CapacityEstimate {
    let spots = |efficiency: f64| (area_m2 * efficiency / spot_type.area_m2()).floor().max(0.0) as u32;

    CapacityEstimate {
        area_sq_meters: round2(area_m2),
        dimensions_meters: (round2(width_m), round2(height_m)),
        estimated_capacity: spots(EFFICIENCY_BEST).max(1),
        capacity_range: (spots(EFFICIENCY_LOW), spots(EFFICIENCY_HIGH).max(1)),
        linear_estimate: None,
        spot_type,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
