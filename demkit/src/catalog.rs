//! Multi-tile elevation lookup with LRU caching.
//!
//! [`DemCatalog`] scans a directory of DEM tiles once, records each tile's
//! footprint and resolution, and decodes tiles on demand into a bounded cache.
//! A point query is answered by the finest tile that covers the point and has
//! data there; coarser tiles fill gaps left by finer ones.
//!
//! ```ignore
//! use demkit::DemCatalog;
//!
//! let catalog = DemCatalog::builder("/data/dem").cache_size(50).build()?;
//! if let Some(elevation) = catalog.elevation(46.5475, 7.9819)? {
//!     println!("Elevation: {:.1}m", elevation);
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use moka::sync::Cache;
use tracing::{debug, info, warn};

use crate::error::{DemError, Result};
use crate::filename::{
    aster_filename_to_lat_lon, filename_to_lat_lon, read_raster, RasterFormat,
};
use crate::grid::RasterGrid;
use crate::transform::{BoundingBox, GeoTransform};
use crate::{geotiff, hgt, query};

/// Default number of decoded tiles kept in memory.
pub const DEFAULT_CACHE_SIZE: u64 = 100;

/// Statistics about cache usage.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of tiles currently in the cache.
    pub entry_count: u64,
    /// Number of cache hits (requests served from cache).
    pub hit_count: u64,
    /// Number of cache misses (tiles decoded from disk).
    pub miss_count: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0).
    ///
    /// Returns 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

/// Statistics from a preload operation.
#[derive(Debug, Clone, Default)]
pub struct PreloadStats {
    /// Number of tiles successfully loaded into cache.
    pub tiles_loaded: u64,
    /// Number of tiles that were already in cache.
    pub tiles_already_cached: u64,
    /// Number of tiles that failed to load.
    pub tiles_failed: u64,
    /// Number of tiles that matched the bounding box filter.
    pub tiles_matched: u64,
    /// Total elapsed time in milliseconds.
    pub elapsed_ms: u64,
}

/// A tile found while scanning the data directory.
#[derive(Debug, Clone)]
pub struct TileEntry {
    pub path: PathBuf,
    pub format: RasterFormat,
    pub width: usize,
    pub height: usize,
    /// Center-registered transform, known without decoding the tile.
    pub transform: GeoTransform,
    /// Extent of the outer pixel edges.
    pub footprint: BoundingBox,
}

impl TileEntry {
    /// File name without directory.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Ground distance per pixel; smaller is finer.
    pub fn resolution(&self) -> f64 {
        self.transform.resolution()
    }

    /// South-west corner of the 1°×1° cell named by an SRTM or ASTER file name.
    pub fn cell(&self) -> Option<(i32, i32)> {
        let name = self.name();
        match self.format {
            RasterFormat::Hgt => filename_to_lat_lon(&name),
            RasterFormat::GeoTiff => aster_filename_to_lat_lon(&name),
        }
    }

    fn probe(path: &Path) -> Result<Option<Self>> {
        let Some(format) = RasterFormat::from_path(path) else {
            return Ok(None);
        };

        let (transform, width, height) = match format {
            RasterFormat::Hgt => {
                let (lat, lon) = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(filename_to_lat_lon)
                    .ok_or_else(|| DemError::MissingGeoreference {
                        path: path.to_path_buf(),
                    })?;
                let (transform, samples) = hgt::probe_hgt(path, lat, lon)?;
                (transform, samples, samples)
            }
            RasterFormat::GeoTiff => {
                let header = geotiff::read_header(path)?;
                (header.transform, header.width, header.height)
            }
        };

        Ok(Some(Self {
            path: path.to_path_buf(),
            format,
            width,
            height,
            transform,
            footprint: transform.footprint(width, height),
        }))
    }
}

/// Elevation lookup over a directory of DEM tiles.
///
/// `DemCatalog` is `Send + Sync` and can be shared between threads.
pub struct DemCatalog {
    /// Directory the tiles were scanned from.
    data_dir: PathBuf,
    /// Tiles sorted finest first, then by file name.
    tiles: Vec<TileEntry>,
    /// LRU cache of decoded tiles, keyed by index into `tiles`.
    tile_cache: Cache<usize, Arc<RasterGrid>>,
    /// Number of cache hits.
    hit_count: AtomicU64,
    /// Number of cache misses.
    miss_count: AtomicU64,
}

impl DemCatalog {
    /// Scan `data_dir` and create a catalog caching up to `cache_size` tiles.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read. Individual files that
    /// cannot be read are skipped with a warning.
    pub fn new<P: AsRef<Path>>(data_dir: P, cache_size: u64) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        let tiles = scan_tiles(&data_dir)?;

        info!(
            data_dir = %data_dir.display(),
            tiles = tiles.len(),
            cache_size,
            "scanned DEM catalog"
        );

        Ok(Self {
            data_dir,
            tiles,
            tile_cache: Cache::builder().max_capacity(cache_size).build(),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        })
    }

    /// Create a builder for more configuration options.
    pub fn builder<P: AsRef<Path>>(data_dir: P) -> DemCatalogBuilder {
        DemCatalogBuilder::new(data_dir)
    }

    /// Elevation at `(lat, lon)` from the finest tile with data there.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(elevation))` - elevation in meters
    /// - `Ok(None)` - no tile covers the point, or every covering tile is
    ///   no-data there
    /// - `Err(...)` - non-finite coordinates, or a covering tile failed to
    ///   decode and no coarser tile had data
    ///
    /// A tile that fails to decode is logged and skipped, so coarser tiles
    /// still answer for it.
    pub fn elevation(&self, lat: f64, lon: f64) -> Result<Option<f64>> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(DemError::InvalidCoordinate {
                message: format!("lat={}, lon={}", lat, lon),
            });
        }

        let mut load_error = None;
        for (index, tile) in self.tiles.iter().enumerate() {
            if !tile.footprint.contains(lat, lon) {
                continue;
            }
            let grid = match self.load_tile(index) {
                Ok(grid) => grid,
                Err(e) => {
                    warn!(tile = %tile.name(), error = %e, "failed to load tile, trying coarser");
                    load_error.get_or_insert(e);
                    continue;
                }
            };
            if let Some(elevation) = query::elevation_at(&grid, lat, lon)? {
                return Ok(Some(elevation));
            }
            debug!(tile = %tile.name(), lat, lon, "no data in tile, trying coarser");
        }

        match load_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }

    /// Elevations for a batch of `(lat, lon)` pairs, one result per input.
    ///
    /// Errors are logged and reported as `None`.
    pub fn elevations_batch(&self, coords: &[(f64, f64)]) -> Vec<Option<f64>> {
        coords
            .iter()
            .map(|&(lat, lon)| {
                self.elevation(lat, lon).unwrap_or_else(|e| {
                    warn!(lat, lon, error = %e, "elevation lookup failed");
                    None
                })
            })
            .collect()
    }

    /// Tiles known to the catalog, finest first.
    pub fn tiles(&self) -> &[TileEntry] {
        &self.tiles
    }

    /// Get cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.tile_cache.entry_count(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get the maximum cache size.
    pub fn cache_capacity(&self) -> u64 {
        self.tile_cache.policy().max_capacity().unwrap_or(0)
    }

    /// Clear all tiles from the cache.
    pub fn clear_cache(&self) {
        self.tile_cache.invalidate_all();
    }

    /// Decode tiles into the cache ahead of queries.
    ///
    /// With `bounds`, only tiles whose footprint intersects at least one box
    /// are loaded.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use demkit::{BoundingBox, DemCatalog};
    ///
    /// let catalog = DemCatalog::new("/data/dem", 100)?;
    /// let switzerland = BoundingBox::new(45.8, 5.9, 47.9, 10.5);
    /// let stats = catalog.preload(Some(&[switzerland]));
    /// println!("Loaded {} tiles in {}ms", stats.tiles_loaded, stats.elapsed_ms);
    /// ```
    pub fn preload(&self, bounds: Option<&[BoundingBox]>) -> PreloadStats {
        let start = Instant::now();
        let mut stats = PreloadStats::default();

        for (index, tile) in self.tiles.iter().enumerate() {
            if let Some(boxes) = bounds {
                if !boxes.iter().any(|b| b.intersects(&tile.footprint)) {
                    continue;
                }
            }

            stats.tiles_matched += 1;

            if self.tile_cache.contains_key(&index) {
                stats.tiles_already_cached += 1;
                continue;
            }

            match self.load_tile(index) {
                Ok(_) => stats.tiles_loaded += 1,
                Err(e) => {
                    warn!(tile = %tile.name(), error = %e, "failed to preload tile");
                    stats.tiles_failed += 1;
                }
            }
        }

        stats.elapsed_ms = start.elapsed().as_millis() as u64;
        stats
    }

    /// Load a tile from cache or disk.
    ///
    /// Concurrent misses on the same tile decode it once; the other callers
    /// wait for that result.
    fn load_tile(&self, index: usize) -> Result<Arc<RasterGrid>> {
        let tile = &self.tiles[index];
        let mut decoded = false;

        let result = self.tile_cache.try_get_with(index, || {
            decoded = true;
            debug!(tile = %tile.name(), "loading tile");
            read_raster(&tile.path).map(Arc::new)
        });

        let counter = if decoded {
            &self.miss_count
        } else {
            &self.hit_count
        };
        counter.fetch_add(1, Ordering::Relaxed);

        result.map_err(|source| DemError::TileLoad {
            path: tile.path.clone(),
            source,
        })
    }
}

fn scan_tiles(data_dir: &Path) -> Result<Vec<TileEntry>> {
    let mut tiles = Vec::new();

    for entry in std::fs::read_dir(data_dir)?.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match TileEntry::probe(&path) {
            Ok(Some(tile)) => tiles.push(tile),
            Ok(None) => {}
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable tile"),
        }
    }

    tiles.sort_by(|a, b| {
        a.resolution()
            .total_cmp(&b.resolution())
            .then_with(|| a.path.cmp(&b.path))
    });
    Ok(tiles)
}

/// Builder for creating [`DemCatalog`] with custom configuration.
///
/// # Example
///
/// ```ignore
/// use demkit::DemCatalogBuilder;
///
/// let catalog = DemCatalogBuilder::new("/data/dem")
///     .cache_size(20)
///     .build()?;
/// ```
pub struct DemCatalogBuilder {
    data_dir: PathBuf,
    cache_size: u64,
}

impl DemCatalogBuilder {
    /// Create a new builder with the specified data directory.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }

    /// Create a builder configured from environment variables.
    ///
    /// # Environment Variables
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `DEMKIT_DATA_DIR` | Directory containing DEM tiles | Required |
    /// | `DEMKIT_CACHE_SIZE` | Maximum tiles in cache | 100 |
    ///
    /// # Errors
    ///
    /// Returns an error if `DEMKIT_DATA_DIR` is not set.
    pub fn from_env() -> Result<Self> {
        let data_dir = std::env::var("DEMKIT_DATA_DIR").map_err(|_| {
            DemError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "DEMKIT_DATA_DIR environment variable not set",
            ))
        })?;

        let cache_size = std::env::var("DEMKIT_CACHE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CACHE_SIZE);

        Ok(Self {
            data_dir: PathBuf::from(data_dir),
            cache_size,
        })
    }

    /// Set the data directory.
    ///
    /// Overrides the directory set in the constructor or from environment.
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = path.as_ref().to_path_buf();
        self
    }

    /// Set the maximum number of tiles to keep in cache.
    ///
    /// Default is 100 tiles.
    pub fn cache_size(mut self, size: u64) -> Self {
        self.cache_size = size;
        self
    }

    /// Scan the directory and build the [`DemCatalog`].
    pub fn build(self) -> Result<DemCatalog> {
        DemCatalog::new(self.data_dir, self.cache_size)
    }
}
