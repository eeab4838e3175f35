use geo::orient::{Direction, Orient};
use geo::{unary_union, Area, Polygon, Validation};

use crate::geometry::shape::Shape;
use crate::shared::coordinate_space::CoordinateSpace;
use crate::shared::detection::Detection;

use super::geometry_adapter::{envelope, exterior_points, largest_part, repair};
use super::merge_config::{AreaStrategy, MergeConfig};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MergeError {
    #[error("cannot merge an empty group")]
    EmptyGroup,
    #[error("group has {detections} detections but {polygons} polygons")]
    ShapeCountMismatch { detections: usize, polygons: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// The union produced no part with positive area.
    EmptyUnion,
    /// The union boundary had fewer than three points after repair.
    Degenerate,
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackReason::EmptyUnion => write!(f, "empty union"),
            FallbackReason::Degenerate => write!(f, "degenerate union boundary"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome<S: CoordinateSpace> {
    Merged(Detection<S>),
    /// The group's first member, unchanged. The other members are dropped.
    Fallback {
        detection: Detection<S>,
        reason: FallbackReason,
    },
}

impl<S: CoordinateSpace> MergeOutcome<S> {
    pub fn into_detection(self) -> Detection<S> {
        match self {
            MergeOutcome::Merged(detection) => detection,
            MergeOutcome::Fallback { detection, .. } => detection,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, MergeOutcome::Fallback { .. })
    }
}

/// Folds a group into one detection bounded by the union of its polygons.
///
/// `polygons[i]` must be the polygon of `members[i]`. Counts, capacities and
/// merge counts are summed; confidences are flattened and combined by the
/// coordinate space; everything else comes from the first member.
pub fn merge_group<S: CoordinateSpace>(
    members: &[&Detection<S>],
    polygons: &[Polygon<f64>],
    config: &MergeConfig,
) -> Result<MergeOutcome<S>, MergeError> {
    let first = *members.first().ok_or(MergeError::EmptyGroup)?;
    if members.len() != polygons.len() {
        return Err(MergeError::ShapeCountMismatch {
            detections: members.len(),
            polygons: polygons.len(),
        });
    }

    let fallback = |reason| MergeOutcome::Fallback {
        detection: first.clone(),
        reason,
    };

    // The overlay sums winding numbers, so every part must wind the same way.
    let oriented: Vec<Polygon<f64>> = polygons
        .iter()
        .map(|p| p.orient(Direction::Default))
        .collect();
    let Some(mut union) = largest_part(unary_union(&oriented)) else {
        return Ok(fallback(FallbackReason::EmptyUnion));
    };
    if !union.is_valid() {
        match repair(&union) {
            Some(repaired) => union = repaired,
            None => return Ok(fallback(FallbackReason::Degenerate)),
        }
    }
    let Some(shape) = Shape::from_points(exterior_points(&union)) else {
        return Ok(fallback(FallbackReason::Degenerate));
    };

    let mut merged = first.clone();
    merged.set_shape(shape);

    merged.vehicle_count = members.iter().map(|d| d.vehicle_count).sum();
    merged.estimated_capacity = members.iter().map(|d| d.estimated_capacity).sum();
    merged.capacity_range = members.iter().fold((0, 0), |(lo, hi), d| {
        (lo + d.capacity_range.0, hi + d.capacity_range.1)
    });
    merged.merged_count = members.iter().map(|d| d.merged_count.max(1)).sum();
    merged.area_sq_meters = match config.area_strategy() {
        AreaStrategy::SumOfParts => members.iter().map(|d| d.area_sq_meters).sum(),
        AreaStrategy::FromGeometry => {
            let bounds = envelope(&union).unwrap_or_else(|| merged.envelope());
            S::square_meters(union.unsigned_area(), &bounds, config.meters_per_pixel())
        }
    };

    let flattened: Vec<f64> = members
        .iter()
        .flat_map(|d| d.confidence.iter().copied())
        .collect();
    merged.confidence = S::combine_confidence(&flattened);

    Ok(MergeOutcome::Merged(merged))
}
