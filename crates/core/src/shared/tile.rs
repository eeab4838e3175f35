use serde::{Deserialize, Serialize};

use super::raster::Raster;

/// Geographic extent of one tile, in degrees.
///
/// Serialised with the camelCase keys used by the tile provider
/// (`minLat`, `maxLat`, `minLng`, `maxLng`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

/// Input unit of an analysis job. Owned by the caller, read-only to the
/// pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub image: Raster,
    pub tile_index: usize,
    pub bounds: TileBounds,
}

impl Tile {
    pub fn new(image: Raster, tile_index: usize, bounds: TileBounds) -> Self {
        Self {
            image,
            tile_index,
            bounds,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
