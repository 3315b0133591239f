//! Example comparing resampling methods on a DEM file.
//!
//! Run with: cargo run --example resampling -- /path/to/tile.tif [factor]

use demkit::{compare_methods, read_raster, resample, DemError, ResamplingMethod, Scoring};
use std::env;

fn main() -> Result<(), DemError> {
    let mut args = env::args().skip(1);
    let path = args.next().unwrap_or_else(|| {
        eprintln!("Usage: cargo run --example resampling -- /path/to/tile.tif [factor]");
        std::process::exit(1);
    });
    let factor: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(4);

    let fine = read_raster(&path)?;
    let (width, height) = fine.bounds();

    let coarse = resample(&fine, factor, ResamplingMethod::Bilinear)?;
    let (coarse_width, coarse_height) = coarse.bounds();
    println!(
        "{}x{} -> {}x{} (pixel size x{})",
        width, height, coarse_width, coarse_height, factor
    );

    println!("{:-<50}", "");
    println!("{:<10} {:>10} {:>10} {:>12}", "method", "RMSE", "MAE", "samples");

    for report in compare_methods(&fine, factor, Scoring::Footprint)? {
        println!(
            "{:<10} {:>10.3} {:>10.3} {:>12}",
            report.method.name(),
            report.rmse,
            report.mae,
            report.sample_count
        );
    }

    Ok(())
}
