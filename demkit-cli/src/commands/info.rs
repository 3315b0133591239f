use anyhow::{bail, Context, Result};
use demkit::filename::{lat_lon_to_aster_filename, lat_lon_to_filename};
use demkit::{read_raster, RasterFormat};
use std::path::{Path, PathBuf};

pub fn run(
    data_dir: Option<PathBuf>,
    raster: Option<PathBuf>,
    lat: Option<f64>,
    lon: Option<f64>,
) -> Result<()> {
    let raster = match (raster, lat, lon) {
        (Some(path), _, _) => path,
        (None, Some(lat), Some(lon)) => {
            let dir = data_dir.context(
                "DEMKIT_DATA_DIR environment variable not set. Use --data-dir or set DEMKIT_DATA_DIR",
            )?;
            find_tile(&dir, lat, lon)?
        }
        _ => bail!("Provide a raster path or both --lat and --lon"),
    };

    if !raster.exists() {
        bail!("Raster not found: {}", raster.display());
    }

    let format = RasterFormat::from_path(&raster)
        .with_context(|| format!("Unsupported raster format: {}", raster.display()))?;
    let grid = read_raster(&raster).context("Failed to load raster")?;
    let file_size = std::fs::metadata(&raster)?.len();

    let (width, height) = grid.bounds();
    let transform = grid.geo_transform();
    let (origin_x, origin_y) = transform.origin();
    let footprint = grid.footprint();

    println!("Raster: {}", raster.display());
    println!("Format: {}", format.name());
    println!("File size: {}", super::format_size(file_size));
    println!();
    println!("Size: {}x{} samples", width, height);
    println!("First sample center: ({:.6}, {:.6})", origin_x, origin_y);
    println!(
        "Pixel size: {:.9} x {:.9}",
        transform.pixel_width(),
        transform.pixel_height()
    );
    if transform.row_rotation() != 0.0 || transform.col_rotation() != 0.0 {
        println!(
            "Rotation: {:.9}, {:.9}",
            transform.row_rotation(),
            transform.col_rotation()
        );
    }
    println!(
        "Coverage: lat {:.6} to {:.6}, lon {:.6} to {:.6}",
        footprint.min_lat, footprint.max_lat, footprint.min_lon, footprint.max_lon
    );
    println!();

    let stats = grid.statistics();
    match &stats {
        Some(stats) => {
            println!("Min elevation: {}m", stats.min);
            println!("Max elevation: {}m", stats.max);
            println!("Mean elevation: {:.1}m", stats.mean);
        }
        None => println!("No valid samples"),
    }

    let total = (width * height) as u64;
    let nodata = total - stats.map_or(0, |s| s.valid_count as u64);
    if nodata > 0 {
        let pct = (nodata as f64 / total as f64) * 100.0;
        println!(
            "No-data samples: {} ({:.1}%, value {})",
            nodata,
            pct,
            grid.nodata()
        );
    }

    Ok(())
}

/// SRTM or ASTER tile covering `(lat, lon)` in `dir`, by file name.
fn find_tile(dir: &Path, lat: f64, lon: f64) -> Result<PathBuf> {
    let candidates = [lat_lon_to_filename(lat, lon), lat_lon_to_aster_filename(lat, lon)];
    candidates
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
        .with_context(|| {
            format!(
                "No tile for ({}, {}) in {}: looked for {}",
                lat,
                lon,
                dir.display(),
                candidates.join(", ")
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_tile_prefers_srtm_then_aster() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("ASTGTMV003_N46E007_dem.tif"), b"").unwrap();

        let found = find_tile(dir.path(), 46.5, 7.9).unwrap();
        assert_eq!(found, dir.path().join("ASTGTMV003_N46E007_dem.tif"));

        std::fs::write(dir.path().join("N46E007.hgt"), b"").unwrap();
        let found = find_tile(dir.path(), 46.5, 7.9).unwrap();
        assert_eq!(found, dir.path().join("N46E007.hgt"));

        assert!(find_tile(dir.path(), 10.0, 10.0).is_err());
    }
}
