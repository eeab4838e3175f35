use crate::shared::raster::Raster;

/// Domain interface for counting vehicles inside a cropped parking space.
pub trait VehicleCounter: Send {
    fn count(&mut self, crop: &Raster, confidence: f64) -> Result<u32, Box<dyn std::error::Error>>;
}
