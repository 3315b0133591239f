//! # demkit - DEM elevation lookup and resampling accuracy
//!
//! Library for reading elevations out of gridded Digital Elevation Models and
//! for measuring how much accuracy a DEM loses when it is downsampled.
//!
//! ## Features
//!
//! - **Point lookup**: nearest-pixel elevation at a geographic coordinate,
//!   matching the stored sample exactly
//! - **Resampling**: integer-factor downsampling with nearest, bilinear or
//!   cubic convolution, computed in parallel
//! - **Accuracy**: RMSE and MAE per method, ranked best first
//! - **Decoders**: SRTM `.hgt` (memory-mapped) and single-band GeoTIFF
//! - **Catalog**: directory of tiles with LRU caching and finest-first fallback
//!
//! ## Quick Start
//!
//! ```
//! use demkit::{compare_methods, query, GeoTransform, RasterGrid, Scoring};
//!
//! // 0.001° pixels, center of the first sample at (7.0, 47.0)
//! let transform = GeoTransform::north_up(7.0, 47.0, 0.001, -0.001);
//! let fine = RasterGrid::from_fn(64, 64, transform, -32768.0, |row, col| {
//!     500.0 + 0.01 * ((row * row + col * col) as f64)
//! })?;
//!
//! assert_eq!(query::elevation_at(&fine, 47.0, 7.0)?, Some(500.0));
//!
//! let reports = compare_methods(&fine, 4, Scoring::Footprint)?;
//! println!("best method: {}", reports[0].method);
//! # Ok::<(), demkit::DemError>(())
//! ```
//!
//! ## Conventions
//!
//! Grids are center-registered: the geotransform maps integer `(row, col)` to
//! the center of that sample. A grid's [`footprint`](RasterGrid::footprint)
//! therefore extends half a pixel beyond its outermost sample centers.
//!
//! Missing data is always reported as `None` (or an error), never as zero.

pub mod accuracy;
pub mod catalog;
pub mod error;
pub mod filename;
pub mod geotiff;
pub mod grid;
pub mod hgt;
pub mod query;
pub mod resample;
pub mod transform;

#[cfg(feature = "geojson")]
pub mod geojson;

// Re-export main types at crate root for convenience
pub use accuracy::{compare_methods, evaluate, evaluate_with, AccuracyReport, Scoring};
pub use catalog::{CacheStats, DemCatalog, DemCatalogBuilder, PreloadStats, TileEntry};
pub use error::{DemError, Result};
pub use filename::{read_raster, RasterFormat};
pub use grid::{GridStatistics, RasterGrid, DEFAULT_NODATA};
pub use resample::{coarse_transform, resample, ResamplingMethod};
pub use transform::{BoundingBox, GeoTransform};
