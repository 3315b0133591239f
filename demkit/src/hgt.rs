//! SRTM `.hgt` tile decoding.
//!
//! An `.hgt` file is a square array of 16-bit big-endian signed integers, row 0
//! on the north edge. Sample centers sit on whole-degree lines at the tile
//! edges, so the first sample is centered on the tile's northwest corner.
//!
//! - **SRTM1**: 3601×3601 samples, 1 arc-second (~30m) resolution
//! - **SRTM3**: 1201×1201 samples, 3 arc-second (~90m) resolution
//!
//! Voids are stored as -32768.

use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use tracing::debug;

use crate::error::{DemError, Result};
use crate::filename::filename_to_lat_lon;
use crate::grid::{RasterGrid, DEFAULT_NODATA};
use crate::transform::GeoTransform;

/// File size for SRTM1 (1 arc-second, ~30m resolution): 3601 × 3601 × 2 bytes
const SRTM1_SIZE: usize = 3601 * 3601 * 2; // 25,934,402 bytes

/// File size for SRTM3 (3 arc-second, ~90m resolution): 1201 × 1201 × 2 bytes
const SRTM3_SIZE: usize = 1201 * 1201 * 2; // 2,884,802 bytes

/// Number of samples per row/column for SRTM1
const SRTM1_SAMPLES: usize = 3601;

/// Number of samples per row/column for SRTM3
const SRTM3_SAMPLES: usize = 1201;

/// Value indicating no data (void) in SRTM files
pub const VOID_VALUE: i16 = -32768;

/// Resolution type of an SRTM tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SrtmResolution {
    /// SRTM1: 1 arc-second (~30m) resolution
    Srtm1,
    /// SRTM3: 3 arc-second (~90m) resolution
    Srtm3,
}

impl SrtmResolution {
    /// Detect the resolution from a file size in bytes.
    pub fn from_file_size(size: usize) -> Result<Self> {
        match size {
            SRTM1_SIZE => Ok(SrtmResolution::Srtm1),
            SRTM3_SIZE => Ok(SrtmResolution::Srtm3),
            size => Err(DemError::InvalidFileSize { size }),
        }
    }

    /// Returns the number of samples per row/column for this resolution.
    pub fn samples(&self) -> usize {
        match self {
            SrtmResolution::Srtm1 => SRTM1_SAMPLES,
            SrtmResolution::Srtm3 => SRTM3_SAMPLES,
        }
    }

    /// Returns the approximate resolution in meters.
    pub fn meters(&self) -> f64 {
        match self {
            SrtmResolution::Srtm1 => 30.0,
            SrtmResolution::Srtm3 => 90.0,
        }
    }
}

/// Center-registered transform of the tile whose southwest corner is `(lat, lon)`.
///
/// The origin is the center of sample `(0, 0)`, i.e. the tile's northwest
/// corner `(lon, lat + 1)`.
pub fn hgt_transform(lat: i32, lon: i32, samples: usize) -> GeoTransform {
    let step = 1.0 / (samples - 1) as f64;
    GeoTransform::north_up(lon as f64, (lat + 1) as f64, step, -step)
}

/// Decode an `.hgt` file, taking the tile position from its name.
///
/// # Errors
///
/// Returns an error if:
/// - The file name is not an SRTM name like `N35E138.hgt`
///   ([`DemError::MissingGeoreference`])
/// - The file cannot be opened or memory-mapped
/// - The file size doesn't match SRTM1 or SRTM3 format
pub fn read_hgt<P: AsRef<Path>>(path: P) -> Result<RasterGrid> {
    let path = path.as_ref();
    let (lat, lon) = path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(filename_to_lat_lon)
        .ok_or_else(|| DemError::MissingGeoreference {
            path: path.to_path_buf(),
        })?;
    read_hgt_with_coords(path, lat, lon)
}

/// Decode an `.hgt` file with explicit southwest corner coordinates.
///
/// This is useful when the filename doesn't follow the standard naming convention.
pub fn read_hgt_with_coords<P: AsRef<Path>>(path: P, lat: i32, lon: i32) -> Result<RasterGrid> {
    let file = File::open(&path)?;

    // SAFETY: Memory mapping is safe as long as the file is not modified
    // while mapped. We open the file read-only and drop the mapping after decoding.
    let mmap = unsafe { Mmap::map(&file)? };

    let resolution = SrtmResolution::from_file_size(mmap.len())?;
    let samples = resolution.samples();

    let data = mmap
        .chunks_exact(2)
        .map(|b| f64::from(i16::from_be_bytes([b[0], b[1]])))
        .collect();

    debug!(
        path = %path.as_ref().display(),
        lat,
        lon,
        ?resolution,
        "decoded hgt tile"
    );

    RasterGrid::new(
        samples,
        samples,
        data,
        hgt_transform(lat, lon, samples),
        DEFAULT_NODATA,
    )
}

/// Footprint and resolution of an `.hgt` file without decoding it.
pub(crate) fn probe_hgt(path: &Path, lat: i32, lon: i32) -> Result<(GeoTransform, usize)> {
    let size = std::fs::metadata(path)?.len() as usize;
    let samples = SrtmResolution::from_file_size(size)?.samples();
    Ok((hgt_transform(lat, lon, samples), samples))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::elevation_at;
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    /// Create SRTM3 tile data with known elevation values
    fn create_test_srtm3_data() -> Vec<u8> {
        let mut data = vec![0u8; SRTM3_SIZE];

        // Row 0, Col 0 (northwest corner) = 1000m
        data[0..2].copy_from_slice(&1000i16.to_be_bytes());

        // Row 600, Col 600 (center) = 500m
        let center_offset = (600 * SRTM3_SAMPLES + 600) * 2;
        data[center_offset..center_offset + 2].copy_from_slice(&500i16.to_be_bytes());

        // Row 1200, Col 1200 (southeast corner) = 100m
        let se_offset = (1200 * SRTM3_SAMPLES + 1200) * 2;
        data[se_offset..se_offset + 2].copy_from_slice(&100i16.to_be_bytes());

        // Row 10, Col 20 = void
        let void_offset = (10 * SRTM3_SAMPLES + 20) * 2;
        data[void_offset..void_offset + 2].copy_from_slice(&VOID_VALUE.to_be_bytes());

        // Row 1, Col 0 = below sea level
        let low_offset = SRTM3_SAMPLES * 2;
        data[low_offset..low_offset + 2].copy_from_slice(&(-42i16).to_be_bytes());

        data
    }

    fn create_test_srtm3_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&create_test_srtm3_data()).unwrap();
        file
    }

    #[test]
    fn test_load_srtm3_file() {
        let file = create_test_srtm3_file();
        let grid = read_hgt_with_coords(file.path(), 35, 138).unwrap();

        assert_eq!(grid.bounds(), (SRTM3_SAMPLES, SRTM3_SAMPLES));
        assert_eq!(grid.nodata(), -32768.0);
        assert_eq!(grid.sample(0, 0).unwrap(), 1000.0);
        assert_eq!(grid.sample(1, 0).unwrap(), -42.0);
        assert_eq!(grid.sample(600, 600).unwrap(), 500.0);
        assert_eq!(grid.sample(1200, 1200).unwrap(), 100.0);
        assert!(grid.is_nodata(grid.sample(10, 20).unwrap()));
    }

    #[test]
    fn test_invalid_file_size() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&vec![0u8; 1000]).unwrap();

        let result = read_hgt_with_coords(file.path(), 0, 0);
        if let Err(DemError::InvalidFileSize { size }) = result {
            assert_eq!(size, 1000);
        } else {
            panic!("Expected InvalidFileSize error");
        }
    }

    #[test]
    fn test_transform_on_whole_degrees() {
        let gt = hgt_transform(35, 138, SRTM3_SAMPLES);
        assert_eq!(gt.forward(0.0, 0.0), (138.0, 36.0));
        let (lon, lat) = gt.forward(1200.0, 1200.0);
        assert_relative_eq!(lon, 139.0, epsilon = 1e-9);
        assert_relative_eq!(lat, 35.0, epsilon = 1e-9);

        let gt = hgt_transform(-13, -78, SRTM1_SAMPLES);
        assert_eq!(gt.origin(), (-78.0, -12.0));
        assert_relative_eq!(gt.pixel_width(), 1.0 / 3600.0);
    }

    #[test]
    fn test_query_decoded_tile() {
        let file = create_test_srtm3_file();
        let grid = read_hgt_with_coords(file.path(), 35, 138).unwrap();

        // Northwest corner
        assert_eq!(elevation_at(&grid, 35.9999, 138.0001).unwrap(), Some(1000.0));
        // Center of tile -> row 600, col 600
        assert_eq!(elevation_at(&grid, 35.5, 138.5).unwrap(), Some(500.0));
        // Southeast corner
        assert_eq!(elevation_at(&grid, 35.0001, 138.9999).unwrap(), Some(100.0));
        // Void sample
        let (lon, lat) = grid.geo_transform().forward(10.0, 20.0);
        assert_eq!(elevation_at(&grid, lat, lon).unwrap(), None);
        // Neighbouring tile
        assert_eq!(elevation_at(&grid, 37.5, 138.5).unwrap(), None);
    }

    #[test]
    fn test_read_hgt_uses_filename() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("S13W078.hgt");
        std::fs::write(&path, create_test_srtm3_data()).unwrap();

        let grid = read_hgt(&path).unwrap();
        assert_eq!(grid.geo_transform().origin(), (-78.0, -12.0));

        let bad = dir.path().join("tile.hgt");
        std::fs::write(&bad, create_test_srtm3_data()).unwrap();
        assert!(matches!(
            read_hgt(&bad),
            Err(DemError::MissingGeoreference { .. })
        ));
    }

    #[test]
    fn test_header_matches_decode() {
        let file = create_test_srtm3_file();
        let (gt, samples) = probe_hgt(file.path(), 46, 7).unwrap();
        let grid = read_hgt_with_coords(file.path(), 46, 7).unwrap();
        assert_eq!(samples, grid.width());
        assert_eq!(&gt, grid.geo_transform());
    }

    #[test]
    fn test_resolution_info() {
        assert_eq!(SrtmResolution::Srtm1.samples(), 3601);
        assert_eq!(SrtmResolution::Srtm3.samples(), 1201);
        assert_eq!(SrtmResolution::Srtm1.meters(), 30.0);
        assert_eq!(SrtmResolution::Srtm3.meters(), 90.0);
        assert_eq!(
            SrtmResolution::from_file_size(SRTM1_SIZE).unwrap(),
            SrtmResolution::Srtm1
        );
    }
}
