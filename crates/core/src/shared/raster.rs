use ndarray::{s, ArrayView3};

/// A decoded tile image: contiguous RGB bytes in row-major order.
///
/// Decoding happens at I/O boundaries only; the analysis pipeline treats
/// pixel data as opaque apart from cropping it for the vehicle counter and
/// drawing detection masks onto copies of it.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
}

impl Raster {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
        }
    }

    /// Black RGB raster, used when a job only declares tile dimensions.
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(
            vec![0; (width as usize) * (height as usize) * 3],
            width,
            height,
            3,
        )
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Raster data length must match dimensions")
    }

    /// Axis-aligned crop in pixel coordinates `(x1, y1)`–`(x2, y2)`.
    ///
    /// Coordinates are truncated toward zero and clamped to the raster, so a
    /// box partially outside the image yields the visible part and a box
    /// entirely outside yields an empty raster.
    pub fn crop(&self, x1: f64, y1: f64, x2: f64, y2: f64) -> Raster {
        let (col0, col1) = clamp_span(x1, x2, self.width);
        let (row0, row1) = clamp_span(y1, y2, self.height);

        let view = self.as_ndarray();
        let cropped = view.slice(s![row0..row1, col0..col1, ..]);
        let data: Vec<u8> = cropped.iter().copied().collect();

        Raster::new(
            data,
            (col1 - col0) as u32,
            (row1 - row0) as u32,
            self.channels,
        )
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

fn clamp_span(start: f64, end: f64, limit: u32) -> (usize, usize) {
    let limit = limit as f64;
    let lo = start.min(end).clamp(0.0, limit) as usize;
    let hi = start.max(end).clamp(0.0, limit) as usize;
    (lo, hi)
}
