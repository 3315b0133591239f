use anyhow::Result;
use std::fs;
use std::path::PathBuf;

pub fn run(data_dir: Option<PathBuf>, cache_size: u64) -> Result<()> {
    let catalog = super::open_catalog(data_dir, cache_size)?;
    let tiles = catalog.tiles();

    if tiles.is_empty() {
        println!("No DEM tiles found in: {}", catalog.data_dir().display());
        return Ok(());
    }

    let mut total_size: u64 = 0;
    let mut hgt_count = 0;
    let mut geotiff_count = 0;

    println!(
        "{:<28} {:>8} {:>8} {:>11} {:>14} {:>42}",
        "TILE", "CELL", "FORMAT", "SIZE", "PIXEL (deg)", "COVERAGE"
    );
    println!("{}", "-".repeat(116));

    // Tiles come back finest first, which is also lookup priority
    for tile in tiles {
        total_size += fs::metadata(&tile.path).map(|m| m.len()).unwrap_or(0);
        match tile.format {
            demkit::RasterFormat::Hgt => hgt_count += 1,
            demkit::RasterFormat::GeoTiff => geotiff_count += 1,
        }

        let coverage = format!(
            "{:.4} to {:.4}, {:.4} to {:.4}",
            tile.footprint.min_lat,
            tile.footprint.max_lat,
            tile.footprint.min_lon,
            tile.footprint.max_lon
        );

        let cell = tile
            .cell()
            .map(|(lat, lon)| format_cell(lat, lon))
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<28} {:>8} {:>8} {:>11} {:>14.8} {:>42}",
            tile.name(),
            cell,
            tile.format.name(),
            format!("{}x{}", tile.width, tile.height),
            tile.resolution(),
            coverage
        );
    }

    println!();
    println!("Summary:");
    println!("  Total tiles: {}", tiles.len());
    if hgt_count > 0 {
        println!("  HGT: {}", hgt_count);
    }
    if geotiff_count > 0 {
        println!("  GeoTIFF: {}", geotiff_count);
    }
    println!("  Total size: {}", super::format_size(total_size));
    println!("  Data directory: {}", catalog.data_dir().display());

    Ok(())
}

fn format_cell(lat: i32, lon: i32) -> String {
    format!(
        "{}{:02}{}{:03}",
        if lat >= 0 { "N" } else { "S" },
        lat.abs(),
        if lon >= 0 { "E" } else { "W" },
        lon.abs()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(46, 7), "N46E007");
        assert_eq!(format_cell(-13, -78), "S13W078");
    }
}
