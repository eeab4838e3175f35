pub mod constants;
pub mod coordinate_space;
pub mod detection;
pub mod raster;
pub mod tile;
