//! Web-Mercator conversions between tile pixels, slippy-map tile numbers and
//! latitude/longitude.
//!
//! Longitude is linear across a tile; latitude is not, so pixel rows are
//! mapped through the Mercator ordinate `ln(tan(lat/2 + π/4))`.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use crate::shared::tile::TileBounds;

/// Mercator ordinate of a latitude in degrees.
pub fn lat_to_mercator(lat_deg: f64) -> f64 {
    (lat_deg.to_radians() / 2.0 + FRAC_PI_4).tan().ln()
}

/// Latitude in degrees of a Mercator ordinate.
pub fn mercator_to_lat(merc: f64) -> f64 {
    (2.0 * merc.exp().atan() - FRAC_PI_2).to_degrees()
}

/// Projects pixel `(x, y)` of a `width × height` tile to `(lat, lng)`.
///
/// Row 0 is the northern edge (`max_lat`), row `height` the southern edge.
pub fn pixel_to_geo(x: f64, y: f64, width: u32, height: u32, bounds: &TileBounds) -> (f64, f64) {
    let lng = bounds.min_lng + (x / width as f64) * (bounds.max_lng - bounds.min_lng);

    let merc_max = lat_to_mercator(bounds.max_lat);
    let merc_min = lat_to_mercator(bounds.min_lat);
    let merc_y = merc_max - (y / height as f64) * (merc_max - merc_min);

    (mercator_to_lat(merc_y), lng)
}

/// Inverse of [`pixel_to_geo`]: `(lat, lng)` to fractional pixel `(x, y)`.
pub fn geo_to_pixel(lat: f64, lng: f64, width: u32, height: u32, bounds: &TileBounds) -> (f64, f64) {
    let x = (lng - bounds.min_lng) / (bounds.max_lng - bounds.min_lng) * width as f64;

    let merc_max = lat_to_mercator(bounds.max_lat);
    let merc_min = lat_to_mercator(bounds.min_lat);
    let y = (merc_max - lat_to_mercator(lat)) / (merc_max - merc_min) * height as f64;

    (x, y)
}

/// Slippy-map tile containing `(lat, lng)` at `zoom`.
pub fn deg2num(lat_deg: f64, lng_deg: f64, zoom: u8) -> (u32, u32) {
    let n = 2f64.powi(zoom as i32);
    let lat_rad = lat_deg.to_radians();
    let x = (lng_deg + 180.0) / 360.0 * n;
    let y = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n;
    (x.max(0.0) as u32, y.max(0.0) as u32)
}

/// North-west corner `(lat, lng)` of a (possibly fractional) tile position.
pub fn num2deg(x: f64, y: f64, zoom: u8) -> (f64, f64) {
    let n = 2f64.powi(zoom as i32);
    let lng = x / n * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y / n)).sinh().atan().to_degrees();
    (lat, lng)
}

/// Geographic bounds of slippy-map tile `(x, y)` at `zoom`.
pub fn tile_bounds(x: u32, y: u32, zoom: u8) -> TileBounds {
    let (north, west) = num2deg(x as f64, y as f64, zoom);
    let (south, east) = num2deg(x as f64 + 1.0, y as f64 + 1.0, zoom);
    TileBounds {
        min_lat: south,
        max_lat: north,
        min_lng: west,
        max_lng: east,
    }
}
