use crate::shared::detection::RawDetection;
use crate::shared::tile::Tile;

/// Domain interface for parking-space detection on one tile.
///
/// Implementations may hold model state, hence `&mut self`. Detections below
/// `confidence` are not returned.
pub trait ParkingSpaceDetector: Send {
    fn detect(
        &mut self,
        tile: &Tile,
        confidence: f64,
    ) -> Result<Vec<RawDetection>, Box<dyn std::error::Error>>;
}
