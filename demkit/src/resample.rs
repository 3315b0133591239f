//! Integer-factor downsampling of elevation grids.
//!
//! [`resample`] builds a coarse grid whose pixel `(r, c)` covers the
//! `factor`×`factor` block of fine pixels starting at `(r * factor, c * factor)`.
//! Each coarse value is the fine grid interpolated at the block center with one
//! of the [`ResamplingMethod`] kernels.
//!
//! Edge policy: every kernel replicates the outermost sample when its
//! neighborhood runs past the grid. No-data is never interpolated across; a
//! kernel that gives a no-data sample non-zero weight yields no-data. Taps
//! with zero weight are ignored, so a kernel centered exactly on a valid
//! sample always returns it.

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DemError, Result};
use crate::grid::RasterGrid;
use crate::transform::GeoTransform;

/// Catmull-Rom parameter of the cubic convolution kernel.
const CUBIC_A: f64 = -0.5;

/// Interpolation method used when resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResamplingMethod {
    /// Copy the sample nearest the target position
    Nearest,
    /// Weighted average of the 2×2 surrounding samples
    Bilinear,
    /// Cubic convolution over the 4×4 surrounding samples
    Cubic,
}

impl ResamplingMethod {
    /// All methods, in declaration order.
    pub const ALL: [ResamplingMethod; 3] = [
        ResamplingMethod::Nearest,
        ResamplingMethod::Bilinear,
        ResamplingMethod::Cubic,
    ];

    /// Lowercase method name.
    pub fn name(&self) -> &'static str {
        match self {
            ResamplingMethod::Nearest => "nearest",
            ResamplingMethod::Bilinear => "bilinear",
            ResamplingMethod::Cubic => "cubic",
        }
    }

    /// Interpolate `grid` at a fractional `(row, col)`.
    ///
    /// Returns `None` if a no-data sample carries non-zero weight.
    pub fn interpolate(&self, grid: &RasterGrid, row: f64, col: f64) -> Option<f64> {
        match self {
            ResamplingMethod::Nearest => nearest(grid, row, col),
            ResamplingMethod::Bilinear => bilinear(grid, row, col),
            ResamplingMethod::Cubic => cubic(grid, row, col),
        }
    }
}

impl fmt::Display for ResamplingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResamplingMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" | "near" => Ok(ResamplingMethod::Nearest),
            "bilinear" | "linear" => Ok(ResamplingMethod::Bilinear),
            "cubic" | "bicubic" => Ok(ResamplingMethod::Cubic),
            other => Err(format!(
                "unknown resampling method '{}' (expected nearest, bilinear or cubic)",
                other
            )),
        }
    }
}

/// Fine-grid offset of a block center from the block's first pixel.
pub(crate) fn center_offset(factor: usize) -> f64 {
    (factor as f64 - 1.0) / 2.0
}

/// Downsample `fine` by an integer `factor` using `method`.
///
/// The coarse grid is `floor(width / factor)` × `floor(height / factor)`;
/// leftover rows and columns at the far edges are dropped. Its pixel size is
/// `factor` times the fine pixel size and its footprint starts at the fine
/// grid's footprint corner.
///
/// # Errors
///
/// Returns [`DemError::InvalidFactor`] if `factor` is zero or larger than
/// either grid dimension.
///
/// # Example
///
/// ```
/// use demkit::{resample, GeoTransform, RasterGrid, ResamplingMethod};
///
/// let fine = RasterGrid::from_fn(8, 8, GeoTransform::north_up(0.0, 8.0, 1.0, -1.0), -9999.0,
///     |row, col| (row + col) as f64)?;
/// let coarse = resample(&fine, 4, ResamplingMethod::Bilinear)?;
///
/// assert_eq!(coarse.bounds(), (2, 2));
/// assert_eq!(coarse.sample(0, 0)?, 3.0);
/// # Ok::<(), demkit::DemError>(())
/// ```
pub fn resample(fine: &RasterGrid, factor: usize, method: ResamplingMethod) -> Result<RasterGrid> {
    let (fine_width, fine_height) = fine.bounds();
    if factor == 0 || factor > fine_width || factor > fine_height {
        return Err(DemError::InvalidFactor {
            factor,
            width: fine_width,
            height: fine_height,
        });
    }

    let width = fine_width / factor;
    let height = fine_height / factor;
    let offset = center_offset(factor);
    let nodata = fine.nodata();

    debug!(
        fine_width,
        fine_height, width, height, factor, %method, "resampling grid"
    );

    let mut data = vec![nodata; width * height];
    data.par_chunks_mut(width)
        .enumerate()
        .for_each(|(row, out)| {
            let fine_row = (row * factor) as f64 + offset;
            for (col, cell) in out.iter_mut().enumerate() {
                let fine_col = (col * factor) as f64 + offset;
                if let Some(v) = method.interpolate(fine, fine_row, fine_col) {
                    *cell = v;
                }
            }
        });

    let transform = coarse_transform(fine, factor);
    RasterGrid::new(width, height, data, transform, nodata)
}

/// Transform of the grid produced by [`resample`] with `factor`.
///
/// The stored origin is the center of coarse pixel `(0, 0)`, which is the
/// center of fine block `(0..factor, 0..factor)`.
pub fn coarse_transform(fine: &RasterGrid, factor: usize) -> GeoTransform {
    let offset = center_offset(factor);
    let (x, y) = fine.geo_transform().forward(offset, offset);
    fine.geo_transform().scaled(factor as f64).with_origin(x, y)
}

fn nearest(grid: &RasterGrid, row: f64, col: f64) -> Option<f64> {
    let v = grid.sample_clamped(row.round() as isize, col.round() as isize);
    (!grid.is_nodata(v)).then_some(v)
}

fn bilinear(grid: &RasterGrid, row: f64, col: f64) -> Option<f64> {
    let r0 = row.floor();
    let c0 = col.floor();
    let tr = row - r0;
    let tc = col - c0;
    let (r0, c0) = (r0 as isize, c0 as isize);

    let mut acc = 0.0;
    for (dr, wr) in [(0, 1.0 - tr), (1, tr)] {
        for (dc, wc) in [(0, 1.0 - tc), (1, tc)] {
            let w = wr * wc;
            if w == 0.0 {
                continue;
            }
            let v = grid.sample_clamped(r0 + dr, c0 + dc);
            if grid.is_nodata(v) {
                return None;
            }
            acc += w * v;
        }
    }
    Some(acc)
}

fn cubic(grid: &RasterGrid, row: f64, col: f64) -> Option<f64> {
    let r0 = row.floor();
    let c0 = col.floor();
    let wr = cubic_weights(row - r0);
    let wc = cubic_weights(col - c0);
    let (r0, c0) = (r0 as isize, c0 as isize);

    let mut acc = 0.0;
    for (i, &wr) in wr.iter().enumerate() {
        if wr == 0.0 {
            continue;
        }
        let mut line = 0.0;
        for (j, &wc) in wc.iter().enumerate() {
            if wc == 0.0 {
                continue;
            }
            let v = grid.sample_clamped(r0 + i as isize - 1, c0 + j as isize - 1);
            if grid.is_nodata(v) {
                return None;
            }
            line += wc * v;
        }
        acc += wr * line;
    }
    Some(acc)
}

/// Kernel weights for the samples at offsets -1, 0, 1, 2 from `floor(x)`.
fn cubic_weights(t: f64) -> [f64; 4] {
    [
        cubic_kernel(t + 1.0),
        cubic_kernel(t),
        cubic_kernel(1.0 - t),
        cubic_kernel(2.0 - t),
    ]
}

fn cubic_kernel(x: f64) -> f64 {
    let x = x.abs();
    if x <= 1.0 {
        ((CUBIC_A + 2.0) * x - (CUBIC_A + 3.0)) * x * x + 1.0
    } else if x < 2.0 {
        ((CUBIC_A * x - 5.0 * CUBIC_A) * x + 8.0 * CUBIC_A) * x - 4.0 * CUBIC_A
    } else {
        0.0
    }
}
