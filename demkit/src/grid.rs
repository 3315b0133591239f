//! In-memory elevation raster.
//!
//! This module provides [`RasterGrid`], the dense row-major sample array that
//! every lookup and resampling operation reads from.

use crate::error::{DemError, Result};
use crate::transform::{BoundingBox, GeoTransform};

/// Sentinel used when a source carries no explicit no-data value.
///
/// Matches the SRTM void value.
pub const DEFAULT_NODATA: f64 = -32768.0;

/// A georeferenced grid of elevation samples.
///
/// Samples are stored row-major, row 0 first. The grid exclusively owns its
/// [`GeoTransform`] and is read-only once constructed.
///
/// # Example
///
/// ```
/// use demkit::{GeoTransform, RasterGrid};
///
/// let transform = GeoTransform::north_up(7.0, 47.0, 0.5, -0.5);
/// let grid = RasterGrid::new(2, 2, vec![1.0, 2.0, 3.0, 4.0], transform, -9999.0).unwrap();
/// assert_eq!(grid.sample(1, 0).unwrap(), 3.0);
/// ```
#[derive(Debug, Clone)]
pub struct RasterGrid {
    data: Vec<f64>,
    width: usize,
    height: usize,
    transform: GeoTransform,
    nodata: f64,
}

/// Summary statistics over the valid samples of a grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub valid_count: usize,
    pub nodata_count: usize,
}

impl RasterGrid {
    /// Create a grid from a decoded sample buffer.
    ///
    /// # Errors
    ///
    /// Returns [`DemError::InvalidDimensions`] if either dimension is zero or
    /// `data.len() != width * height`.
    pub fn new(
        width: usize,
        height: usize,
        data: Vec<f64>,
        transform: GeoTransform,
        nodata: f64,
    ) -> Result<Self> {
        if width == 0 || height == 0 || width.checked_mul(height) != Some(data.len()) {
            return Err(DemError::InvalidDimensions {
                width,
                height,
                len: data.len(),
            });
        }

        Ok(Self {
            data,
            width,
            height,
            transform,
            nodata,
        })
    }

    /// Build a grid by evaluating `f(row, col)` for every sample.
    pub fn from_fn(
        width: usize,
        height: usize,
        transform: GeoTransform,
        nodata: f64,
        f: impl Fn(usize, usize) -> f64,
    ) -> Result<Self> {
        let mut data = Vec::with_capacity(width.saturating_mul(height));
        for row in 0..height {
            for col in 0..width {
                data.push(f(row, col));
            }
        }
        Self::new(width, height, data, transform, nodata)
    }

    /// Sample at an integer pixel.
    ///
    /// The no-data sentinel is returned verbatim; check it with [`Self::is_nodata`].
    ///
    /// # Errors
    ///
    /// Returns [`DemError::OutOfBounds`] if `row >= height` or `col >= width`.
    pub fn sample(&self, row: usize, col: usize) -> Result<f64> {
        if row >= self.height || col >= self.width {
            return Err(DemError::OutOfBounds {
                row,
                col,
                width: self.width,
                height: self.height,
            });
        }
        Ok(self.data[row * self.width + col])
    }

    /// Sample with indices clamped to the grid (edge replication).
    pub(crate) fn sample_clamped(&self, row: isize, col: isize) -> f64 {
        let row = row.clamp(0, self.height as isize - 1) as usize;
        let col = col.clamp(0, self.width as isize - 1) as usize;
        self.data[row * self.width + col]
    }

    /// Returns `(width, height)`.
    pub fn bounds(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn geo_transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn nodata(&self) -> f64 {
        self.nodata
    }

    /// Whether `value` is this grid's no-data sentinel.
    ///
    /// A NaN sentinel matches NaN samples.
    pub fn is_nodata(&self, value: f64) -> bool {
        value == self.nodata || (self.nodata.is_nan() && value.is_nan())
    }

    /// Row-major sample buffer.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Geographic extent covered by the grid's outer pixel edges.
    pub fn footprint(&self) -> BoundingBox {
        self.transform.footprint(self.width, self.height)
    }

    /// Min, max and mean over valid samples, plus the no-data count.
    ///
    /// Returns `None` when every sample is no-data.
    pub fn statistics(&self) -> Option<GridStatistics> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut valid_count = 0usize;

        for &v in &self.data {
            if self.is_nodata(v) {
                continue;
            }
            min = min.min(v);
            max = max.max(v);
            sum += v;
            valid_count += 1;
        }

        if valid_count == 0 {
            return None;
        }

        Some(GridStatistics {
            min,
            max,
            mean: sum / valid_count as f64,
            valid_count,
            nodata_count: self.data.len() - valid_count,
        })
    }
}
