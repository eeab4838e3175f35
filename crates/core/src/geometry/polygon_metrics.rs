//! Closed-form measurements on pixel-space rings.

use geo::Coord;

/// Polygon area via the shoelace formula. The ring may be open or closed;
/// fewer than three points have no area.
pub fn polygon_area(points: &[Coord<f64>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let twice_area: f64 = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice_area.abs() / 2.0
}

/// Width and height of the axis-aligned box around `points`.
pub fn bounding_dimensions(points: &[Coord<f64>]) -> (f64, f64) {
    if points.len() < 3 {
        return (0.0, 0.0);
    }
    let (min_x, max_x) = min_max(points.iter().map(|p| p.x));
    let (min_y, max_y) = min_max(points.iter().map(|p| p.y));
    (max_x - min_x, max_y - min_y)
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}
