use std::path::Path;

use crate::shared::raster::Raster;

/// Decodes an image file into an RGB [`Raster`].
pub fn read_raster(path: &Path) -> Result<Raster, image::ImageError> {
    let img = image::open(path)?.to_rgb8();
    let (width, height) = img.dimensions();
    Ok(Raster::new(img.into_raw(), width, height, 3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reads_png_as_rgb() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tile.png");
        let mut img = image::RgbImage::new(8, 4);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb([50, 100, 200]);
        }
        img.save(&path).unwrap();

        let raster = read_raster(&path).unwrap();
        assert_eq!(raster.width(), 8);
        assert_eq!(raster.height(), 4);
        assert_eq!(raster.channels(), 3);
        assert_eq!(&raster.data()[..3], &[50, 100, 200]);
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(read_raster(&dir.path().join("absent.png")).is_err());
    }
}
