use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::geometry::shape::{Envelope, Shape};

use super::coordinate_space::{CoordinateSpace, Geographic, Pixel};

/// A candidate parking space, in pixel or geographic coordinates.
///
/// The coordinate space is a type parameter, so pixel and geographic
/// detections cannot be mixed within one merge call. The envelope is cached
/// and kept in step with the shape through [`Detection::set_shape`].
#[derive(Debug, Clone, PartialEq)]
pub struct Detection<S: CoordinateSpace> {
    shape: Shape,
    envelope: Envelope,
    pub confidence: Vec<f64>,
    pub class_id: Option<i64>,
    pub vehicle_count: u32,
    pub estimated_capacity: u32,
    pub capacity_range: (u32, u32),
    pub area_sq_meters: f64,
    pub dimensions_meters: (f64, f64),
    pub merged_count: u32,
    pub tile_index: Option<usize>,
    space: PhantomData<S>,
}

impl<S: CoordinateSpace> Detection<S> {
    pub fn new(shape: Shape, confidence: Vec<f64>) -> Self {
        let envelope = shape.envelope();
        Self {
            shape,
            envelope,
            confidence,
            class_id: None,
            vehicle_count: 0,
            estimated_capacity: 0,
            capacity_range: (0, 0),
            area_sq_meters: 0.0,
            dimensions_meters: (0.0, 0.0),
            merged_count: 1,
            tile_index: None,
            space: PhantomData,
        }
    }

    pub fn with_tile_index(mut self, tile_index: usize) -> Self {
        self.tile_index = Some(tile_index);
        self
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn envelope(&self) -> Envelope {
        self.envelope
    }

    pub fn set_shape(&mut self, shape: Shape) {
        self.envelope = shape.envelope();
        self.shape = shape;
    }

    pub fn is_occupied(&self) -> bool {
        self.vehicle_count > 0
    }

    /// Copies every attribute except the geometry into a detection of
    /// another coordinate space.
    pub fn reproject<T: CoordinateSpace>(&self, shape: Shape) -> Detection<T> {
        let envelope = shape.envelope();
        Detection {
            shape,
            envelope,
            confidence: self.confidence.clone(),
            class_id: self.class_id,
            vehicle_count: self.vehicle_count,
            estimated_capacity: self.estimated_capacity,
            capacity_range: self.capacity_range,
            area_sq_meters: self.area_sq_meters,
            dimensions_meters: self.dimensions_meters,
            merged_count: self.merged_count,
            tile_index: self.tile_index,
            space: PhantomData,
        }
    }
}

/// Detector output for one parking space, in tile pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub bbox: [f64; 4],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Vec<f64>>,
    pub confidence: f64,
    #[serde(default)]
    pub class_id: i64,
}

impl RawDetection {
    /// Resolves the shape once: the polygon when it has at least three
    /// points, the axis-aligned box otherwise.
    pub fn into_detection(self, tile_index: usize) -> Detection<Pixel> {
        let shape = self
            .polygon
            .as_deref()
            .and_then(Shape::from_flat)
            .unwrap_or_else(|| Shape::from_bbox(self.bbox));
        let mut detection = Detection::new(shape, vec![self.confidence]).with_tile_index(tile_index);
        detection.class_id = Some(self.class_id);
        detection
    }
}

/// Serialized form of a geographic detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingSpaceRecord {
    pub tile_index: Option<usize>,
    pub confidence: Vec<f64>,
    pub vehicle_count: u32,
    pub is_occupied: bool,
    /// `[minLat, minLng, maxLat, maxLng]`.
    #[serde(rename = "geoBoundingBox")]
    pub geo_bounding_box: [f64; 4],
    /// Closed ring of `[lat, lng]` pairs.
    #[serde(rename = "geoPolygon")]
    pub geo_polygon: Vec<[f64; 2]>,
    pub area_sq_meters: f64,
    pub estimated_capacity: u32,
    pub capacity_range: [u32; 2],
    pub dimensions_meters: [f64; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_count: Option<u32>,
}

impl From<&Detection<Geographic>> for ParkingSpaceRecord {
    fn from(detection: &Detection<Geographic>) -> Self {
        Self {
            tile_index: detection.tile_index,
            confidence: detection.confidence.clone(),
            vehicle_count: detection.vehicle_count,
            is_occupied: detection.is_occupied(),
            geo_bounding_box: detection.envelope().to_array(),
            geo_polygon: detection
                .shape()
                .closed_points()
                .iter()
                .map(|p| [p.x, p.y])
                .collect(),
            area_sq_meters: detection.area_sq_meters,
            estimated_capacity: detection.estimated_capacity,
            capacity_range: [detection.capacity_range.0, detection.capacity_range.1],
            dimensions_meters: [detection.dimensions_meters.0, detection.dimensions_meters.1],
            merged_count: (detection.merged_count > 1).then_some(detection.merged_count),
        }
    }
}
