use anyhow::{Context, Result};
use demkit::{compare_methods, read_raster, AccuracyReport, GeoTransform, RasterGrid, Scoring};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct CompareResponse {
    source: String,
    width: usize,
    height: usize,
    factor: usize,
    scoring: Scoring,
    reports: Vec<AccuracyReport>,
}

pub fn run(
    raster: Option<PathBuf>,
    synthetic: Option<usize>,
    factor: usize,
    scoring: Scoring,
    json: bool,
) -> Result<()> {
    let (source, fine) = match (raster, synthetic) {
        (_, Some(size)) => (format!("synthetic {}x{}", size, size), synthetic_surface(size)?),
        (Some(path), None) => {
            let grid = read_raster(&path)
                .with_context(|| format!("Failed to read raster {}", path.display()))?;
            (path.display().to_string(), grid)
        }
        (None, None) => anyhow::bail!("Provide a raster path or --synthetic SIZE"),
    };

    let reports = compare_methods(&fine, factor, scoring)
        .with_context(|| format!("Failed to compare methods at factor {}", factor))?;
    let (width, height) = fine.bounds();

    if json {
        let response = CompareResponse {
            source,
            width,
            height,
            factor,
            scoring,
            reports,
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!("Source: {} ({}x{})", source, width, height);
    println!("Factor: {} (scoring: {:?})", factor, scoring);
    println!();
    println!(
        "{:<4} {:<10} {:>12} {:>12} {:>12}",
        "RANK", "METHOD", "RMSE", "MAE", "SAMPLES"
    );
    println!("{}", "-".repeat(54));

    for (rank, report) in reports.iter().enumerate() {
        println!(
            "{:<4} {:<10} {:>12.4} {:>12.4} {:>12}",
            rank + 1,
            report.method.name(),
            report.rmse,
            report.mae,
            report.sample_count
        );
    }

    if let Some(best) = reports.first() {
        println!();
        println!("Recommended: {}", best.method);
    }

    Ok(())
}

/// Smooth terrain with a quadratic trend and gentle undulation.
fn synthetic_surface(size: usize) -> Result<RasterGrid> {
    let transform = GeoTransform::north_up(7.0, 47.0, 1.0 / 3600.0, -1.0 / 3600.0);
    let grid = RasterGrid::from_fn(size, size, transform, demkit::DEFAULT_NODATA, |row, col| {
        let (x, y) = (col as f64, row as f64);
        800.0 + 0.002 * (x * x + y * y) + 25.0 * (x / 40.0).sin() * (y / 55.0).cos()
    })?;
    Ok(grid)
}
