use geo::Coord;

use crate::capacity::capacity_estimator::{estimate_capacity, SpotType};
use crate::geometry::projection::pixel_to_geo;
use crate::geometry::shape::Shape;
use crate::shared::coordinate_space::{Geographic, Pixel};
use crate::shared::detection::Detection;
use crate::shared::tile::Tile;

/// Projects a pixel detection onto the map and fills in its capacity.
///
/// Capacity is computed from the pixel ring (a box counts as its four
/// corners). Vertices are clamped into the tile before projection, so no
/// geographic vertex leaves the tile's bounds.
pub fn project_detection(
    detection: &Detection<Pixel>,
    tile: &Tile,
    meters_per_pixel: f64,
    spot_type: SpotType,
) -> Detection<Geographic> {
    let points = detection.shape().points();
    let width = tile.width().max(1);
    let height = tile.height().max(1);
    let max_x = (width - 1) as f64;
    let max_y = (height - 1) as f64;

    let geo_points: Vec<Coord<f64>> = points
        .iter()
        .map(|p| {
            let (lat, lng) = pixel_to_geo(
                p.x.clamp(0.0, max_x),
                p.y.clamp(0.0, max_y),
                width,
                height,
                &tile.bounds,
            );
            Coord { x: lat, y: lng }
        })
        .collect();

    let capacity = estimate_capacity(&points, meters_per_pixel, spot_type);
    let mut projected: Detection<Geographic> = detection.reproject(Shape::Polygon(geo_points));
    projected.area_sq_meters = capacity.area_sq_meters;
    projected.dimensions_meters = capacity.dimensions_meters;
    projected.estimated_capacity = capacity.estimated_capacity;
    projected.capacity_range = capacity.capacity_range;
    projected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::raster::Raster;
    use crate::shared::tile::TileBounds;
    use approx::assert_relative_eq;

    fn tile() -> Tile {
        Tile::new(
            Raster::blank(1000, 400),
            4,
            TileBounds {
                min_lat: 52.0,
                max_lat: 52.001,
                min_lng: 5.0,
                max_lng: 5.002,
            },
        )
    }

    #[test]
    fn test_box_projected_with_capacity() {
        let det = Detection::<Pixel>::new(Shape::from_bbox([0.0, 0.0, 1000.0, 400.0]), vec![0.8])
            .with_tile_index(4);
        let geo = project_detection(&det, &tile(), 0.05, SpotType::Standard);

        assert_eq!(geo.tile_index, Some(4));
        assert_eq!(geo.confidence, vec![0.8]);
        assert_relative_eq!(geo.area_sq_meters, 1000.0);
        assert_eq!(geo.estimated_capacity, 60);
        assert_eq!(geo.capacity_range, (52, 68));
        assert_eq!(geo.dimensions_meters, (50.0, 20.0));
    }

    #[test]
    fn test_vertices_clamped_into_tile() {
        let det = Detection::<Pixel>::new(Shape::from_bbox([-50.0, -50.0, 2000.0, 900.0]), vec![0.8]);
        let geo = project_detection(&det, &tile(), 0.05, SpotType::Standard);
        let env = geo.envelope();
        let b = tile().bounds;

        assert_relative_eq!(env.max_x, b.max_lat, epsilon = 1e-12);
        assert_relative_eq!(env.min_y, b.min_lng, epsilon = 1e-12);
        assert!(env.min_x > b.min_lat);
        assert!(env.max_y < b.max_lng);
    }

    #[test]
    fn test_top_row_is_northern_edge() {
        let det = Detection::<Pixel>::new(Shape::from_bbox([10.0, 0.0, 20.0, 10.0]), vec![0.5]);
        let geo = project_detection(&det, &tile(), 0.05, SpotType::Standard);
        let ring = geo.shape().points();
        // Box corners start at the minimum pixel corner, i.e. top-left.
        assert_relative_eq!(ring[0].x, 52.001, epsilon = 1e-12);
        assert!(ring[2].x < ring[0].x);
        assert!(ring[1].y > ring[0].y);
    }

    #[test]
    fn test_merged_count_carries_over() {
        let mut det = Detection::<Pixel>::new(Shape::from_bbox([0.0, 0.0, 10.0, 10.0]), vec![0.5]);
        det.merged_count = 3;
        det.vehicle_count = 2;
        let geo = project_detection(&det, &tile(), 0.05, SpotType::Standard);
        assert_eq!(geo.merged_count, 3);
        assert_eq!(geo.vehicle_count, 2);
        assert!(geo.is_occupied());
    }
}
