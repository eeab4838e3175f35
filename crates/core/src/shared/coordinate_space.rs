use std::fmt::Debug;

use crate::geometry::shape::Envelope;

use super::constants::{
    MERGED_CONFIDENCE_HIGH, MERGED_CONFIDENCE_LOW, MERGED_CONFIDENCE_MID, METERS_PER_DEGREE,
};

/// Coordinate space a detection lives in.
///
/// The merge engine is written once against this trait; each space supplies
/// how an area in its own units becomes square meters and how the
/// confidences of merged detections are combined.
pub trait CoordinateSpace: Copy + Debug + Default + PartialEq + Send + Sync + 'static {
    const NAME: &'static str;

    /// Converts an area measured in this space's units to square meters.
    fn square_meters(area: f64, envelope: &Envelope, meters_per_pixel: f64) -> f64;

    /// Combines the flattened confidences of a merged group.
    fn combine_confidence(values: &[f64]) -> Vec<f64>;
}

/// Tile pixel coordinates, `x` right and `y` down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pixel;

/// Geographic coordinates stored as `x = lat`, `y = lng`, in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Geographic;

impl CoordinateSpace for Pixel {
    const NAME: &'static str = "pixel";

    fn square_meters(area: f64, _envelope: &Envelope, meters_per_pixel: f64) -> f64 {
        area * meters_per_pixel * meters_per_pixel
    }

    fn combine_confidence(values: &[f64]) -> Vec<f64> {
        mean(values).into_iter().collect()
    }
}

impl CoordinateSpace for Geographic {
    const NAME: &'static str = "geographic";

    /// Equirectangular approximation around the envelope's mid-latitude.
    fn square_meters(area: f64, envelope: &Envelope, _meters_per_pixel: f64) -> f64 {
        let mid_lat = envelope.center().x.to_radians();
        area * METERS_PER_DEGREE * METERS_PER_DEGREE * mid_lat.cos().abs()
    }

    fn combine_confidence(values: &[f64]) -> Vec<f64> {
        rescale_into_band(
            values,
            MERGED_CONFIDENCE_LOW,
            MERGED_CONFIDENCE_HIGH,
            MERGED_CONFIDENCE_MID,
        )
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Min-max rescales `values` into `[low, high]`.
///
/// When every value is equal there is no spread to preserve and the result
/// collapses to the single value `mid`.
pub fn rescale_into_band(values: &[f64], low: f64, high: f64, mid: f64) -> Vec<f64> {
    let Some(&first) = values.first() else {
        return Vec::new();
    };
    let (min, max) = values
        .iter()
        .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    if max == min {
        return vec![mid];
    }
    values
        .iter()
        .map(|&c| low + (c - min) * (high - low) / (max - min))
        .collect()
}
