use crate::shared::coordinate_space::Pixel;
use crate::shared::detection::Detection;
use crate::shared::raster::Raster;

/// Domain interface for drawing merged detections over their tile image.
///
/// Implementations draw in place onto a copy owned by the caller.
pub trait MaskRenderer: Send {
    fn render(
        &self,
        image: &mut Raster,
        detections: &[Detection<Pixel>],
    ) -> Result<(), Box<dyn std::error::Error>>;
}
