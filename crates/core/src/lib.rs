//! Parking-space detection over map tiles: per-tile detection, pixel-space
//! merging, projection to latitude/longitude, capacity estimation and a
//! cross-tile geographic merge.

pub mod capacity;
pub mod detection;
pub mod geometry;
pub mod job;
pub mod merging;
pub mod pipeline;
pub mod shared;
