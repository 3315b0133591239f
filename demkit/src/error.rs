//! Error types for the demkit library.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::resample::ResamplingMethod;

/// Errors that can occur when sampling, resampling or loading DEM rasters.
#[derive(Error, Debug)]
pub enum DemError {
    /// The geotransform matrix has no inverse (e.g. zero pixel size).
    #[error("Singular geotransform: determinant is {determinant}")]
    SingularTransform { determinant: f64 },

    /// A pixel index lies outside the grid extent.
    #[error("Pixel ({row}, {col}) out of bounds for {width}x{height} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        width: usize,
        height: usize,
    },

    /// Accuracy evaluation found no cell with data on both sides.
    #[error("No valid samples to score for {method} resampling (insufficient overlap)")]
    NoSamples { method: ResamplingMethod },

    /// Grid dimensions are zero or don't match the sample buffer.
    #[error("Invalid grid dimensions: {width}x{height} with {len} samples")]
    InvalidDimensions {
        width: usize,
        height: usize,
        len: usize,
    },

    /// The downscale factor yields an empty coarse grid.
    #[error("Invalid downscale factor {factor} for {width}x{height} grid")]
    InvalidFactor {
        factor: usize,
        width: usize,
        height: usize,
    },

    /// A coarse grid was not derived from the given fine grid.
    #[error("Incompatible grids: {reason}")]
    IncompatibleGrids { reason: String },

    /// IO error when reading files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// GeoTIFF decoding failed.
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// File size doesn't match SRTM1 or SRTM3 format.
    #[error("Invalid file size: {size} bytes (expected 25934402 for SRTM1 or 2884802 for SRTM3)")]
    InvalidFileSize { size: usize },

    /// The raster carries no usable georeferencing.
    #[error("No georeferencing found in {path}")]
    MissingGeoreference { path: PathBuf },

    /// The file extension is not a known raster format.
    #[error("Unsupported raster format: {path}")]
    UnsupportedFormat { path: PathBuf },

    /// A coordinate could not be interpreted.
    #[error("Invalid coordinate: {message}")]
    InvalidCoordinate { message: String },

    /// A catalog tile could not be decoded.
    #[error("Failed to load tile {path}: {source}")]
    TileLoad {
        path: PathBuf,
        #[source]
        source: Arc<DemError>,
    },

        /// No tile has elevation data at the coordinate.
    #[error("No elevation data at lat={lat}, lon={lon}")]
    NoCoverage { lat: f64, lon: f64 },
}

/// Result type alias using [`DemError`].
pub type Result<T> = std::result::Result<T, DemError>;
