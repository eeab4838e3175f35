//! Conversion of detections into validated planar polygons.

use std::iter;

use geo::orient::{Direction, Orient};
use geo::{
    unary_union, Area, BoundingRect, Coord, LineString, MultiPolygon, Polygon, Validation,
};

use crate::geometry::shape::{Envelope, Shape};
use crate::shared::coordinate_space::CoordinateSpace;
use crate::shared::detection::Detection;

/// Planar polygon for a detection, or `None` when it cannot take part in
/// merging.
pub fn to_polygon<S: CoordinateSpace>(detection: &Detection<S>) -> Option<Polygon<f64>> {
    shape_to_polygon(detection.shape())
}

/// Rings are closed and oriented counter-clockwise whatever winding the
/// detector produced. Invalid rings are repaired; anything still without
/// positive area is rejected.
pub fn shape_to_polygon(shape: &Shape) -> Option<Polygon<f64>> {
    let points = shape.points();
    if distinct_vertices(&points) < 3 {
        return None;
    }

    let polygon = Polygon::new(LineString::from(points), vec![]);
    let polygon = if polygon.is_valid() {
        polygon
    } else {
        log::debug!("Repairing invalid ring");
        repair(&polygon)?
    };

    let polygon = polygon.orient(Direction::Default);
    (polygon.unsigned_area() > 0.0).then_some(polygon)
}

/// Splits a self-intersecting ring into simple parts and keeps the largest.
///
/// The overlay only keeps regions of positive winding, so the ring and its
/// reverse are each unioned and the parts of both are compared.
pub fn repair(polygon: &Polygon<f64>) -> Option<Polygon<f64>> {
    let mut reversed = polygon.exterior().clone();
    reversed.0.reverse();
    let reversed = Polygon::new(reversed, vec![]);

    let parts: Vec<Polygon<f64>> = unary_union(iter::once(polygon))
        .into_iter()
        .chain(unary_union(iter::once(&reversed)))
        .collect();
    largest_part(MultiPolygon::new(parts)).map(|p| p.orient(Direction::Default))
}

/// Part with the largest area; the first one wins ties. Parts without
/// positive area are never selected.
pub fn largest_part(parts: MultiPolygon<f64>) -> Option<Polygon<f64>> {
    let mut best: Option<(f64, Polygon<f64>)> = None;
    for part in parts {
        let area = part.unsigned_area();
        if area <= 0.0 {
            continue;
        }
        match best {
            Some((best_area, _)) if area <= best_area => {}
            _ => best = Some((area, part)),
        }
    }
    best.map(|(_, polygon)| polygon)
}

pub fn envelope(polygon: &Polygon<f64>) -> Option<Envelope> {
    polygon.bounding_rect().map(|rect| Envelope {
        min_x: rect.min().x,
        min_y: rect.min().y,
        max_x: rect.max().x,
        max_y: rect.max().y,
    })
}

/// Exterior ring as an open point list.
pub fn exterior_points(polygon: &Polygon<f64>) -> Vec<Coord<f64>> {
    let mut points: Vec<Coord<f64>> = polygon.exterior().coords().copied().collect();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

fn distinct_vertices(points: &[Coord<f64>]) -> usize {
    let mut seen: Vec<Coord<f64>> = Vec::with_capacity(points.len());
    for p in points {
        if !seen.contains(p) {
            seen.push(*p);
        }
    }
    seen.len()
}
