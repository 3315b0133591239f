//! Nearest-pixel elevation lookup.
//!
//! A query reports the DEM's own recorded value at the pixel covering a
//! coordinate. It never interpolates, so results match an integral-grid
//! elevation service sample for sample.

use crate::error::Result;
use crate::grid::RasterGrid;

/// Pixel covering `(lat, lon)`, or `None` if the coordinate is outside the grid.
///
/// The fractional pixel position is rounded half away from zero to the nearest
/// sample center.
///
/// # Errors
///
/// Returns [`crate::DemError::SingularTransform`] if the grid's transform
/// cannot be inverted.
pub fn pixel_at(grid: &RasterGrid, lat: f64, lon: f64) -> Result<Option<(usize, usize)>> {
    let (row, col) = grid.geo_transform().inverse(lon, lat)?;
    Ok(nearest_pixel(grid, row, col))
}

/// Elevation at `(lat, lon)` in meters.
///
/// # Returns
///
/// - `Ok(Some(elevation))` - the stored sample of the covering pixel
/// - `Ok(None)` - the coordinate is outside the grid, or the pixel is no-data
/// - `Err(...)` - the grid's transform is singular
///
/// # Example
///
/// ```
/// use demkit::{query::elevation_at, GeoTransform, RasterGrid};
///
/// let transform = GeoTransform::north_up(8.0, 47.0, 0.5, -0.5);
/// let grid = RasterGrid::new(2, 2, vec![400.0, 410.0, 420.0, 430.0], transform, -9999.0)?;
///
/// assert_eq!(elevation_at(&grid, 46.5, 8.5)?, Some(430.0));
/// assert_eq!(elevation_at(&grid, 40.0, 8.5)?, None);
/// # Ok::<(), demkit::DemError>(())
/// ```
pub fn elevation_at(grid: &RasterGrid, lat: f64, lon: f64) -> Result<Option<f64>> {
    Ok(pixel_at(grid, lat, lon)?.and_then(|(row, col)| stored_value(grid, row, col)))
}

/// Elevations for a batch of `(lat, lon)` pairs, one result per input.
///
/// # Errors
///
/// Fails before any lookup if the grid's transform is singular.
pub fn elevations_at(grid: &RasterGrid, coords: &[(f64, f64)]) -> Result<Vec<Option<f64>>> {
    coords
        .iter()
        .map(|&(lat, lon)| elevation_at(grid, lat, lon))
        .collect()
}

fn nearest_pixel(grid: &RasterGrid, row: f64, col: f64) -> Option<(usize, usize)> {
    // f64::round rounds half away from zero
    let row = row.round();
    let col = col.round();

    // NaN fails both comparisons
    if !(row >= 0.0 && col >= 0.0) {
        return None;
    }
    if row >= grid.height() as f64 || col >= grid.width() as f64 {
        return None;
    }
    Some((row as usize, col as usize))
}

fn stored_value(grid: &RasterGrid, row: usize, col: usize) -> Option<f64> {
    grid.sample(row, col).ok().filter(|&v| !grid.is_nodata(v))
}
