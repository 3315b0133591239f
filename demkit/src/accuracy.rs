//! Resampling accuracy: how far a coarse grid strays from the fine grid it
//! was derived from.
//!
//! Two scoring modes are available:
//!
//! - [`Scoring::CellCenter`] compares every defined coarse cell against the
//!   fine sample nearest the cell's center. This is what [`evaluate`] does.
//! - [`Scoring::Footprint`] re-estimates every fine pixel under a defined
//!   coarse cell from the coarse grid, using the same interpolation method, and
//!   compares it with the fine sample.
//!
//! Under cell-center scoring nearest-neighbour resampling copies exactly the
//! sample it is scored against, so its error is always zero. Ranking methods
//! therefore uses footprint scoring (see [`compare_methods`]).

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{DemError, Result};
use crate::grid::RasterGrid;
use crate::resample::{center_offset, coarse_transform, resample, ResamplingMethod};

/// Relative tolerance when checking that a coarse grid matches a fine grid.
const GEOMETRY_TOLERANCE: f64 = 1e-6;

/// RMSE and MAE of one resampling method.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    pub method: ResamplingMethod,
    /// Root-mean-square error in elevation units.
    pub rmse: f64,
    /// Mean absolute error in elevation units.
    pub mae: f64,
    /// Number of scored samples.
    pub sample_count: usize,
}

/// How coarse estimates are matched with ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scoring {
    /// Every fine pixel, re-estimated from the coarse grid
    #[default]
    Footprint,
    /// Every coarse cell, against the fine sample nearest its center
    #[serde(rename = "center")]
    CellCenter,
}

impl std::str::FromStr for Scoring {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "footprint" => Ok(Scoring::Footprint),
            "center" | "cell-center" => Ok(Scoring::CellCenter),
            other => Err(format!(
                "unknown scoring '{}' (expected footprint or center)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ErrorSums {
    squared: f64,
    absolute: f64,
    count: usize,
}

impl ErrorSums {
    fn add(mut self, error: f64) -> Self {
        self.squared += error * error;
        self.absolute += error.abs();
        self.count += 1;
        self
    }

    fn merge(self, other: Self) -> Self {
        Self {
            squared: self.squared + other.squared,
            absolute: self.absolute + other.absolute,
            count: self.count + other.count,
        }
    }

    fn into_report(self, method: ResamplingMethod) -> Result<AccuracyReport> {
        if self.count == 0 {
            return Err(DemError::NoSamples { method });
        }
        let n = self.count as f64;
        let mae = self.absolute / n;
        // rmse >= mae holds exactly; rounding can break it by an ulp
        let rmse = (self.squared / n).sqrt().max(mae);
        Ok(AccuracyReport {
            method,
            rmse,
            mae,
            sample_count: self.count,
        })
    }
}

/// Score `coarse` against `fine` at coarse cell centers.
///
/// For every coarse cell with data, the ground truth is the fine sample
/// nearest the cell center (rounded half away from zero, the same pixel
/// nearest-neighbour resampling copies). Cells where either side is no-data
/// are skipped.
///
/// # Errors
///
/// - [`DemError::IncompatibleGrids`] if `coarse` is not an integer
///   downsampling of `fine` as produced by [`resample`]
/// - [`DemError::NoSamples`] if no cell has data on both sides
pub fn evaluate(
    fine: &RasterGrid,
    coarse: &RasterGrid,
    method: ResamplingMethod,
) -> Result<AccuracyReport> {
    evaluate_with(fine, coarse, method, Scoring::CellCenter)
}

/// Score `coarse` against `fine` with the given [`Scoring`].
///
/// # Errors
///
/// Same as [`evaluate`].
pub fn evaluate_with(
    fine: &RasterGrid,
    coarse: &RasterGrid,
    method: ResamplingMethod,
    scoring: Scoring,
) -> Result<AccuracyReport> {
    let factor = infer_factor(fine, coarse)?;

    let sums = match scoring {
        Scoring::CellCenter => cell_center_errors(fine, coarse, factor),
        Scoring::Footprint => footprint_errors(fine, coarse, factor, method),
    };

    let report = sums.into_report(method)?;
    debug!(
        %method,
        ?scoring,
        rmse = report.rmse,
        mae = report.mae,
        samples = report.sample_count,
        "evaluated resampling"
    );
    Ok(report)
}

/// Resample `fine` with every method and score each result.
///
/// Reports are sorted by ascending RMSE, so the first entry is the most
/// accurate method. Ties keep declaration order.
///
/// # Errors
///
/// Fails if resampling fails (bad factor) or any method has no valid samples.
pub fn compare_methods(
    fine: &RasterGrid,
    factor: usize,
    scoring: Scoring,
) -> Result<Vec<AccuracyReport>> {
    let mut reports = ResamplingMethod::ALL
        .iter()
        .map(|&method| {
            let coarse = resample(fine, factor, method)?;
            evaluate_with(fine, &coarse, method, scoring)
        })
        .collect::<Result<Vec<_>>>()?;

    reports.sort_by(|a, b| a.rmse.total_cmp(&b.rmse));

    if let Some(best) = reports.first() {
        info!(
            factor,
            best = %best.method,
            rmse = best.rmse,
            "ranked resampling methods"
        );
    }
    Ok(reports)
}

fn cell_center_errors(fine: &RasterGrid, coarse: &RasterGrid, factor: usize) -> ErrorSums {
    let offset = center_offset(factor);

    coarse
        .data()
        .par_chunks(coarse.width())
        .enumerate()
        .fold(ErrorSums::default, |mut sums, (row, values)| {
            let truth_row = ((row * factor) as f64 + offset).round() as usize;
            for (col, &estimate) in values.iter().enumerate() {
                if coarse.is_nodata(estimate) {
                    continue;
                }
                let truth_col = ((col * factor) as f64 + offset).round() as usize;
                let truth = fine.data()[truth_row * fine.width() + truth_col];
                if fine.is_nodata(truth) {
                    continue;
                }
                sums = sums.add(estimate - truth);
            }
            sums
        })
        .reduce(ErrorSums::default, ErrorSums::merge)
}

fn footprint_errors(
    fine: &RasterGrid,
    coarse: &RasterGrid,
    factor: usize,
    method: ResamplingMethod,
) -> ErrorSums {
    let offset = center_offset(factor);
    let scale = factor as f64;

    (0..coarse.height())
        .into_par_iter()
        .fold(ErrorSums::default, |mut sums, row| {
            for col in 0..coarse.width() {
                let cell = coarse.data()[row * coarse.width() + col];
                if coarse.is_nodata(cell) {
                    continue;
                }
                for fine_row in row * factor..(row + 1) * factor {
                    let u = (fine_row as f64 - offset) / scale;
                    for fine_col in col * factor..(col + 1) * factor {
                        let truth = fine.data()[fine_row * fine.width() + fine_col];
                        if fine.is_nodata(truth) {
                            continue;
                        }
                        let v = (fine_col as f64 - offset) / scale;
                        if let Some(estimate) = method.interpolate(coarse, u, v) {
                            sums = sums.add(estimate - truth);
                        }
                    }
                }
            }
            sums
        })
        .reduce(ErrorSums::default, ErrorSums::merge)
}

/// Recover the downscale factor relating `coarse` to `fine`.
fn infer_factor(fine: &RasterGrid, coarse: &RasterGrid) -> Result<usize> {
    let fine_gt = fine.geo_transform();
    let coarse_gt = coarse.geo_transform();

    let ratio = coarse_gt.resolution() / fine_gt.resolution();
    let factor = ratio.round();
    if !ratio.is_finite() || factor < 1.0 || (ratio - factor).abs() > GEOMETRY_TOLERANCE * factor
    {
        return Err(DemError::IncompatibleGrids {
            reason: format!("pixel size ratio {} is not a positive integer", ratio),
        });
    }
    let factor = factor as usize;

    let expected = (fine.width() / factor, fine.height() / factor);
    if coarse.bounds() != expected {
        return Err(DemError::IncompatibleGrids {
            reason: format!(
                "coarse grid is {}x{}, expected {}x{} for factor {}",
                coarse.width(),
                coarse.height(),
                expected.0,
                expected.1,
                factor
            ),
        });
    }

    let reference = coarse_transform(fine, factor).to_gdal();
    let tolerance = GEOMETRY_TOLERANCE * coarse_gt.resolution();
    let aligned = coarse_gt
        .to_gdal()
        .iter()
        .zip(reference.iter())
        .all(|(a, b)| (a - b).abs() <= tolerance);
    if !aligned {
        let (x, y) = coarse_gt.origin();
        let (ex, ey) = fine_gt.forward(center_offset(factor), center_offset(factor));
        return Err(DemError::IncompatibleGrids {
            reason: format!(
                "coarse origin ({}, {}) is not aligned with the fine grid; transforms are \
                 center-registered, so for factor {} the origin must be the center of the \
                 first fine block, fine.forward({}, {}) = ({}, {})",
                x,
                y,
                factor,
                center_offset(factor),
                center_offset(factor),
                ex,
                ey
            ),
        });
    }

    Ok(factor)
}
