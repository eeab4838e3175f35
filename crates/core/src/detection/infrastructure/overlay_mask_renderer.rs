use geo::line_measures::Distance;
use geo::{Contains, Euclidean, LineString, Point, Polygon};

use crate::detection::domain::mask_renderer::MaskRenderer;
use crate::shared::coordinate_space::Pixel;
use crate::shared::detection::Detection;
use crate::shared::raster::Raster;

pub const DEFAULT_MASK_COLOR: [u8; 3] = [255, 0, 0];
pub const DEFAULT_MASK_ALPHA: f64 = 0.4;

/// Pixels whose centre lies within this distance of a ring are outline.
const OUTLINE_HALF_WIDTH: f64 = 0.5;

#[derive(Clone, Copy, PartialEq)]
enum Cover {
    None,
    Fill,
    Outline,
}

/// Draws each detection as a translucent filled polygon with an opaque
/// outline.
///
/// Coverage of all detections is collected first and composited once, so
/// overlapping detections are not blended twice.
pub struct OverlayMaskRenderer {
    color: [u8; 3],
    alpha: f64,
}

impl OverlayMaskRenderer {
    pub fn new(color: [u8; 3], alpha: f64) -> Self {
        Self {
            color,
            alpha: alpha.clamp(0.0, 1.0),
        }
    }
}

impl Default for OverlayMaskRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_MASK_COLOR, DEFAULT_MASK_ALPHA)
    }
}

impl MaskRenderer for OverlayMaskRenderer {
    fn render(
        &self,
        image: &mut Raster,
        detections: &[Detection<Pixel>],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let width = image.width() as usize;
        let height = image.height() as usize;
        let channels = image.channels() as usize;
        if width == 0 || height == 0 {
            return Ok(());
        }
        if channels < 3 {
            return Err(format!("mask needs an RGB image, got {channels} channels").into());
        }

        let mut cover = vec![Cover::None; width * height];
        for detection in detections {
            mark_coverage(&mut cover, width, height, detection);
        }

        let data = image.data_mut();
        for (i, c) in cover.iter().enumerate() {
            let px = &mut data[i * channels..i * channels + 3];
            match c {
                Cover::None => {}
                Cover::Outline => px.copy_from_slice(&self.color),
                Cover::Fill => {
                    for (v, &tint) in px.iter_mut().zip(&self.color) {
                        let blended = *v as f64 * (1.0 - self.alpha) + tint as f64 * self.alpha;
                        *v = blended.round() as u8;
                    }
                }
            }
        }
        Ok(())
    }
}

fn mark_coverage(cover: &mut [Cover], width: usize, height: usize, detection: &Detection<Pixel>) {
    let polygon = Polygon::new(LineString::from(detection.shape().points()), vec![]);
    let env = detection.envelope();

    let col0 = (env.min_x - OUTLINE_HALF_WIDTH).floor().clamp(0.0, width as f64) as usize;
    let col1 = (env.max_x + OUTLINE_HALF_WIDTH).ceil().clamp(0.0, width as f64) as usize;
    let row0 = (env.min_y - OUTLINE_HALF_WIDTH).floor().clamp(0.0, height as f64) as usize;
    let row1 = (env.max_y + OUTLINE_HALF_WIDTH).ceil().clamp(0.0, height as f64) as usize;

    for row in row0..row1 {
        for col in col0..col1 {
            let centre = Point::new(col as f64 + 0.5, row as f64 + 0.5);
            let slot = &mut cover[row * width + col];
            if Euclidean.distance(&centre, polygon.exterior()) <= OUTLINE_HALF_WIDTH {
                *slot = Cover::Outline;
            } else if *slot == Cover::None && polygon.contains(&centre) {
                *slot = Cover::Fill;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::shape::Shape;

    fn grey(w: u32, h: u32) -> Raster {
        Raster::new(vec![100; (w * h * 3) as usize], w, h, 3)
    }

    fn pixel_at(raster: &Raster, x: u32, y: u32) -> [u8; 3] {
        let i = ((y * raster.width() + x) * 3) as usize;
        [raster.data()[i], raster.data()[i + 1], raster.data()[i + 2]]
    }

    fn boxed(bbox: [f64; 4]) -> Detection<Pixel> {
        Detection::new(Shape::from_bbox(bbox), vec![0.9])
    }

    #[test]
    fn test_inside_tinted_outline_opaque_outside_untouched() {
        let mut image = grey(20, 20);
        OverlayMaskRenderer::default()
            .render(&mut image, &[boxed([4.0, 4.0, 16.0, 16.0])])
            .unwrap();

        // 100 * 0.6 + 255 * 0.4 = 162; 100 * 0.6 = 60.
        assert_eq!(pixel_at(&image, 10, 10), [162, 60, 60]);
        assert_eq!(pixel_at(&image, 4, 10), [255, 0, 0]);
        assert_eq!(pixel_at(&image, 1, 1), [100, 100, 100]);
    }

    #[test]
    fn test_overlapping_detections_blend_once() {
        let mut image = grey(20, 20);
        OverlayMaskRenderer::default()
            .render(
                &mut image,
                &[boxed([2.0, 2.0, 14.0, 14.0]), boxed([6.0, 6.0, 18.0, 18.0])],
            )
            .unwrap();
        assert_eq!(pixel_at(&image, 10, 10), [162, 60, 60]);
    }

    #[test]
    fn test_rotated_polygon_corners_untouched() {
        let diamond = Detection::new(
            Shape::from_flat(&[10.0, 0.0, 20.0, 10.0, 10.0, 20.0, 0.0, 10.0]).unwrap(),
            vec![0.9],
        );
        let mut image = grey(20, 20);
        OverlayMaskRenderer::default().render(&mut image, &[diamond]).unwrap();
        assert_eq!(pixel_at(&image, 1, 1), [100, 100, 100]);
        assert_eq!(pixel_at(&image, 10, 10), [162, 60, 60]);
    }

    #[test]
    fn test_detection_beyond_image_is_clamped() {
        let mut image = grey(8, 8);
        OverlayMaskRenderer::default()
            .render(&mut image, &[boxed([-10.0, -10.0, 30.0, 30.0])])
            .unwrap();
        assert_eq!(pixel_at(&image, 7, 7), [162, 60, 60]);
    }

    #[test]
    fn test_grayscale_image_rejected() {
        let mut image = Raster::new(vec![0; 16], 4, 4, 1);
        let result = OverlayMaskRenderer::default().render(&mut image, &[boxed([0.0, 0.0, 2.0, 2.0])]);
        assert!(result.is_err());
    }
}
