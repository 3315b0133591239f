//! DEM tile filename utilities.
//!
//! This module provides functions for converting between coordinates and
//! tile filenames, and for picking a decoder from a path.
//!
//! # Filename Formats
//!
//! SRTM files follow the naming convention: `{N|S}{lat}{E|W}{lon}.hgt`
//!
//! - Latitude: 2 digits with N/S prefix (e.g., N35, S12)
//! - Longitude: 3 digits with E/W prefix (e.g., E138, W077)
//!
//! ASTER GDEM files embed the same token: `ASTGTMV003_N46E007_dem.tif`.
//!
//! Both name the **southwest corner** of the 1° × 1° tile.

use std::path::Path;

use crate::error::{DemError, Result};
use crate::grid::RasterGrid;
use crate::{geotiff, hgt};

/// On-disk raster formats the crate can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    /// SRTM `.hgt` tile
    Hgt,
    /// Single-band GeoTIFF (`.tif` / `.tiff`)
    GeoTiff,
}

impl RasterFormat {
    /// Detect the format from the file extension (case-insensitive).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "hgt" => Some(RasterFormat::Hgt),
            "tif" | "tiff" => Some(RasterFormat::GeoTiff),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RasterFormat::Hgt => "hgt",
            RasterFormat::GeoTiff => "geotiff",
        }
    }
}

/// Decode any supported raster file into a [`RasterGrid`].
///
/// # Errors
///
/// Returns [`DemError::UnsupportedFormat`] for unknown extensions, otherwise
/// whatever the format's decoder reports.
pub fn read_raster<P: AsRef<Path>>(path: P) -> Result<RasterGrid> {
    let path = path.as_ref();
    match RasterFormat::from_path(path) {
        Some(RasterFormat::Hgt) => hgt::read_hgt(path),
        Some(RasterFormat::GeoTiff) => geotiff::read_geotiff(path),
        None => Err(DemError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Convert latitude and longitude to an SRTM `.hgt` filename.
///
/// # Arguments
///
/// * `lat` - Latitude in decimal degrees (-60 to 60)
/// * `lon` - Longitude in decimal degrees (-180 to 180)
///
/// # Examples
///
/// ```
/// use demkit::filename::lat_lon_to_filename;
///
/// assert_eq!(lat_lon_to_filename(35.5, 138.7), "N35E138.hgt");
/// assert_eq!(lat_lon_to_filename(-12.3, -77.1), "S13W078.hgt");
/// assert_eq!(lat_lon_to_filename(0.5, -0.5), "N00W001.hgt");
/// ```
pub fn lat_lon_to_filename(lat: f64, lon: f64) -> String {
    format!("{}.hgt", tile_token(lat, lon))
}

/// Convert latitude and longitude to an ASTER GDEM v3 filename.
///
/// ```
/// use demkit::filename::lat_lon_to_aster_filename;
///
/// assert_eq!(lat_lon_to_aster_filename(46.5, 7.9), "ASTGTMV003_N46E007_dem.tif");
/// ```
pub fn lat_lon_to_aster_filename(lat: f64, lon: f64) -> String {
    format!("ASTGTMV003_{}_dem.tif", tile_token(lat, lon))
}

fn tile_token(lat: f64, lon: f64) -> String {
    let lat_int = lat.floor() as i32;
    let lon_int = lon.floor() as i32;

    let lat_prefix = if lat_int >= 0 { 'N' } else { 'S' };
    let lon_prefix = if lon_int >= 0 { 'E' } else { 'W' };

    format!(
        "{}{:02}{}{:03}",
        lat_prefix,
        lat_int.abs(),
        lon_prefix,
        lon_int.abs()
    )
}

/// Parse an SRTM filename to extract the base coordinates.
///
/// # Arguments
///
/// * `filename` - The filename (with or without path, with or without extension)
///
/// # Returns
///
/// The (latitude, longitude) of the southwest corner, or `None` if parsing fails.
///
/// # Examples
///
/// ```
/// use demkit::filename::filename_to_lat_lon;
///
/// assert_eq!(filename_to_lat_lon("N35E138.hgt"), Some((35, 138)));
/// assert_eq!(filename_to_lat_lon("S12W077.hgt"), Some((-12, -77)));
/// assert_eq!(filename_to_lat_lon("/path/to/N00E000.hgt"), Some((0, 0)));
/// assert_eq!(filename_to_lat_lon("invalid"), None);
/// ```
pub fn filename_to_lat_lon(filename: &str) -> Option<(i32, i32)> {
    let name = base_name(filename);

    // Remove .hgt extension if present
    let name = name
        .strip_suffix(".hgt")
        .or_else(|| name.strip_suffix(".HGT"))
        .unwrap_or(name);

    parse_token(name)
}

/// Parse an ASTER GDEM filename like `ASTGTMV003_N46E007_dem.tif`.
///
/// ```
/// use demkit::filename::aster_filename_to_lat_lon;
///
/// assert_eq!(aster_filename_to_lat_lon("ASTGTMV003_N46E007_dem.tif"), Some((46, 7)));
/// assert_eq!(aster_filename_to_lat_lon("ASTGTMV003_S13W078_dem.tif"), Some((-13, -78)));
/// assert_eq!(aster_filename_to_lat_lon("ASTGTMV003_N46E007_num.tif"), None);
/// ```
pub fn aster_filename_to_lat_lon(filename: &str) -> Option<(i32, i32)> {
    let name = base_name(filename);
    let rest = name.strip_prefix("ASTGTMV")?;

    let mut parts = rest.split('_');
    let version = parts.next()?;
    if version.is_empty() || !version.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let token = parts.next()?;
    let suffix = parts.next()?;
    if parts.next().is_some() || !suffix.eq_ignore_ascii_case("dem.tif") {
        return None;
    }

    parse_token(token)
}

fn base_name(filename: &str) -> &str {
    filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(filename)
}

/// Parse a `N00E000` token.
fn parse_token(name: &str) -> Option<(i32, i32)> {
    // Must be exactly 7 ASCII characters
    if name.len() != 7 || !name.is_ascii() {
        return None;
    }

    let bytes = name.as_bytes();

    let lat_sign = match bytes[0] {
        b'N' | b'n' => 1,
        b'S' | b's' => -1,
        _ => return None,
    };
    let lat: i32 = name[1..3].parse().ok()?;

    let lon_sign = match bytes[3] {
        b'E' | b'e' => 1,
        b'W' | b'w' => -1,
        _ => return None,
    };
    let lon: i32 = name[4..7].parse().ok()?;

    Some((lat * lat_sign, lon * lon_sign))
}
