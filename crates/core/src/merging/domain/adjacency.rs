//! Pairwise "same object" decision.
//!
//! Two fragments are the same space when they overlap enough (by IoU or by
//! overlap relative to the smaller fragment) or when their boundaries lie
//! within the configured distance of each other.

use geo::line_measures::Distance;
use geo::{Area, BooleanOps, Euclidean, Intersects, Polygon};

use super::merge_config::MergeConfig;

/// Absolute slack on threshold comparisons, so a pair sitting exactly on a
/// threshold merges regardless of rounding in the overlay.
pub const THRESHOLD_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjacencyScore {
    pub intersects: bool,
    pub iou: f64,
    pub overlap_ratio: f64,
    /// 0 when the polygons intersect, else the gap between their boundaries.
    pub distance: f64,
}

pub fn score(a: &Polygon<f64>, b: &Polygon<f64>) -> AdjacencyScore {
    if !a.intersects(b) {
        return AdjacencyScore {
            intersects: false,
            iou: 0.0,
            overlap_ratio: 0.0,
            distance: boundary_distance(a, b),
        };
    }

    let area_a = a.unsigned_area();
    let area_b = b.unsigned_area();
    let inter = a.intersection(b).unsigned_area();
    let union = area_a + area_b - inter;
    let smaller = area_a.min(area_b);

    AdjacencyScore {
        intersects: true,
        iou: if union > 0.0 { inter / union } else { 0.0 },
        overlap_ratio: if smaller > 0.0 { inter / smaller } else { 0.0 },
        distance: 0.0,
    }
}

/// Shortest distance between the exterior rings of two polygons.
pub fn boundary_distance(a: &Polygon<f64>, b: &Polygon<f64>) -> f64 {
    a.exterior()
        .lines()
        .flat_map(|la| b.exterior().lines().map(move |lb| Euclidean.distance(&la, &lb)))
        .fold(f64::INFINITY, f64::min)
}

pub fn should_merge(a: &Polygon<f64>, b: &Polygon<f64>, config: &MergeConfig) -> bool {
    score(a, b).passes(config)
}

impl AdjacencyScore {
    pub fn passes(&self, config: &MergeConfig) -> bool {
        let overlaps = self.intersects
            && (self.iou + THRESHOLD_EPSILON >= config.iou_threshold()
                || self.overlap_ratio + THRESHOLD_EPSILON >= config.min_overlap_ratio());
        let near = config
            .max_merge_distance()
            .is_some_and(|max| self.distance <= max + THRESHOLD_EPSILON);
        overlaps || near
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::polygon;

    fn square(x: f64, y: f64, side: f64) -> Polygon<f64> {
        polygon![
            (x: x, y: y),
            (x: x + side, y: y),
            (x: x + side, y: y + side),
            (x: x, y: y + side),
        ]
    }

    fn iou_only(threshold: f64) -> MergeConfig {
        MergeConfig::new(threshold, 1.0, None, true).unwrap()
    }

    fn distance_only(max: f64) -> MergeConfig {
        MergeConfig::new(1.0, 1.0, Some(max), true).unwrap()
    }

    // ── Scores ──

    #[test]
    fn test_score_partial_overlap() {
        let s = score(&square(0.0, 0.0, 10.0), &square(5.0, 5.0, 10.0));
        assert!(s.intersects);
        assert_relative_eq!(s.iou, 25.0 / 175.0, epsilon = 1e-9);
        assert_relative_eq!(s.overlap_ratio, 0.25, epsilon = 1e-9);
        assert_eq!(s.distance, 0.0);
    }

    #[test]
    fn test_score_contained_polygon() {
        let s = score(&square(0.0, 0.0, 10.0), &square(2.0, 2.0, 2.0));
        assert_relative_eq!(s.overlap_ratio, 1.0, epsilon = 1e-9);
        assert_relative_eq!(s.iou, 0.04, epsilon = 1e-9);
    }

    #[test]
    fn test_score_disjoint_reports_gap() {
        let s = score(&square(0.0, 0.0, 10.0), &square(13.0, 14.0, 10.0));
        assert!(!s.intersects);
        assert_eq!(s.iou, 0.0);
        assert_relative_eq!(s.distance, 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_touching_squares_intersect_without_area() {
        let s = score(&square(0.0, 0.0, 1.0), &square(1.0, 0.0, 1.0));
        assert!(s.intersects);
        assert_relative_eq!(s.iou, 0.0, epsilon = 1e-12);
        assert_eq!(s.distance, 0.0);
    }

    // ── IoU boundary ──

    #[test]
    fn test_iou_exactly_at_threshold_merges() {
        // Half-overlapping unit squares: iou = 0.5 / 1.5.
        let a = square(0.0, 0.0, 1.0);
        let b = square(0.5, 0.0, 1.0);
        assert!(should_merge(&a, &b, &iou_only(1.0 / 3.0)));
    }

    #[test]
    fn test_iou_just_below_threshold_does_not_merge() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(0.5, 0.0, 1.0);
        assert!(!should_merge(&a, &b, &iou_only(1.0 / 3.0 + 1e-6)));
    }

    #[test]
    fn test_overlap_ratio_triggers_below_iou() {
        // intersection 10, min area 100: ratio 0.1, iou about 0.053.
        let a = polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)];
        let b = polygon![(x: 9.0, y: 0.0), (x: 19.0, y: 0.0), (x: 19.0, y: 10.0), (x: 9.0, y: 10.0)];
        let config = MergeConfig::new(0.1, 0.05, None, true).unwrap();
        let s = score(&a, &b);
        assert!(s.iou < 0.1);
        assert!(s.passes(&config));
    }

    // ── Distance fallback ──

    #[test]
    fn test_distance_exactly_at_max_merges() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(60.0, 0.0, 10.0);
        assert!(should_merge(&a, &b, &distance_only(50.0)));
    }

    #[test]
    fn test_distance_just_beyond_max_does_not_merge() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(60.0 + 1e-6, 0.0, 10.0);
        assert!(!should_merge(&a, &b, &distance_only(50.0)));
    }

    #[test]
    fn test_disabled_distance_never_merges_disjoint() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(10.5, 0.0, 10.0);
        assert!(!should_merge(&a, &b, &iou_only(0.0)));
    }

    #[test]
    fn test_intersecting_pair_merges_through_distance() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(9.99, 0.0, 10.0);
        assert!(should_merge(&a, &b, &distance_only(0.5)));
    }

    #[test]
    fn test_symmetric() {
        let a = square(0.0, 0.0, 4.0);
        let b = square(3.0, 1.0, 4.0);
        let config = MergeConfig::pixel_default();
        assert_eq!(should_merge(&a, &b, &config), should_merge(&b, &a, &config));
        assert_relative_eq!(score(&a, &b).iou, score(&b, &a).iou, epsilon = 1e-9);
    }
}
