//! Image collaborators.
//!
//! The runtime only sees these traits; pixel storage is up to the
//! implementation. [`RasterImage`] is the in-memory one.

use std::fmt;

/// Read access to a raster: integer pixel bounds and per-band samples.
pub trait Image: Send + Sync {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn min_x(&self) -> i64;
    fn min_y(&self) -> i64;
    fn bands(&self) -> u32;

    /// Sample at `(x, y, band)`. Only called for positions inside the
    /// bounds and bands below [`bands`](Image::bands).
    fn get(&self, x: i64, y: i64, band: u32) -> f64;

    fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.min_x()
            && y >= self.min_y()
            && x < self.min_x() + i64::from(self.width())
            && y < self.min_y() + i64::from(self.height())
    }
}

/// A raster the runtime can write results into.
pub trait WritableImage: Image {
    /// Store a sample. Only called for positions inside the bounds.
    fn set(&mut self, x: i64, y: i64, band: u32, value: f64);
}

/// Band-sequential in-memory raster of `f64` samples.
#[derive(Clone, PartialEq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    min_x: i64,
    min_y: i64,
    bands: u32,
    data: Vec<f64>,
}

impl RasterImage {
    /// Single-band image at the origin, filled with zero.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_bands(width, height, 1)
    }

    pub fn with_bands(width: u32, height: u32, bands: u32) -> Self {
        let len = width as usize * height as usize * bands as usize;
        RasterImage {
            width,
            height,
            min_x: 0,
            min_y: 0,
            bands,
            data: vec![0.0; len],
        }
    }

    /// Move the image so its first pixel is at `(min_x, min_y)`.
    #[must_use]
    pub fn with_origin(mut self, min_x: i64, min_y: i64) -> Self {
        self.min_x = min_x;
        self.min_y = min_y;
        self
    }

    /// Single-band image at the origin with `f(x, y)` at each pixel.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(i64, i64) -> f64) -> Self {
        let mut image = Self::new(width, height);
        for y in 0..i64::from(height) {
            for x in 0..i64::from(width) {
                let i = image.offset(x, y, 0);
                image.data[i] = f(x, y);
            }
        }
        image
    }

    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Samples of one band in row-major order.
    pub fn band_values(&self, band: u32) -> &[f64] {
        let plane = self.width as usize * self.height as usize;
        let start = band as usize * plane;
        &self.data[start..start + plane]
    }

    fn offset(&self, x: i64, y: i64, band: u32) -> usize {
        let plane = self.width as usize * self.height as usize;
        let col = (x - self.min_x) as usize;
        let row = (y - self.min_y) as usize;
        band as usize * plane + row * self.width as usize + col
    }
}

impl Image for RasterImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn min_x(&self) -> i64 {
        self.min_x
    }

    fn min_y(&self) -> i64 {
        self.min_y
    }

    fn bands(&self) -> u32 {
        self.bands
    }

    fn get(&self, x: i64, y: i64, band: u32) -> f64 {
        self.data[self.offset(x, y, band)]
    }
}

impl WritableImage for RasterImage {
    fn set(&mut self, x: i64, y: i64, band: u32, value: f64) {
        let i = self.offset(x, y, band);
        self.data[i] = value;
    }
}

impl fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("min_x", &self.min_x)
            .field("min_y", &self.min_y)
            .field("bands", &self.bands)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_follow_origin() {
        let image = RasterImage::new(4, 3).with_origin(-2, 10);
        assert!(image.contains(-2, 10));
        assert!(image.contains(1, 12));
        assert!(!image.contains(2, 12));
        assert!(!image.contains(-2, 13));
        assert!(!image.contains(-3, 10));
    }

    #[test]
    fn test_bands_are_separate_planes() {
        let mut image = RasterImage::with_bands(2, 2, 3);
        image.set(1, 0, 2, 7.0);
        image.set(1, 0, 0, 1.0);
        assert_eq!(image.get(1, 0, 2), 7.0);
        assert_eq!(image.get(1, 0, 1), 0.0);
        assert_eq!(image.band_values(2), &[0.0, 7.0, 0.0, 0.0]);
        assert_eq!(image.band_values(0), &[0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_from_fn() {
        let image = RasterImage::from_fn(3, 2, |x, y| (x * 10 + y) as f64);
        assert_eq!(image.band_values(0), &[0.0, 10.0, 20.0, 1.0, 11.0, 21.0]);
    }
}
