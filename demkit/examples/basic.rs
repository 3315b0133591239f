//! Basic example demonstrating point elevation lookups over a tile directory.
//!
//! Run with: cargo run --example basic -- /path/to/dem/tiles

use demkit::{DemCatalog, DemError};
use std::env;

fn main() -> Result<(), DemError> {
    // Get data directory from command line
    let data_dir = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --example basic -- /path/to/dem/tiles");
        std::process::exit(1);
    });

    // Scan the directory, keep up to 10 decoded tiles
    let catalog = DemCatalog::new(&data_dir, 10)?;
    println!("{} tiles found", catalog.tiles().len());

    let locations = [
        ("Jungfraujoch", 46.5475, 7.9819),
        ("Matterhorn", 45.9763, 7.6586),
        ("Lake Geneva", 46.4531, 6.5897),
    ];

    println!("Elevation queries (nearest pixel):");
    println!("{:-<50}", "");

    for (name, lat, lon) in &locations {
        match catalog.elevation(*lat, *lon) {
            Ok(Some(elevation)) => println!("{}: {:.1}m", name, elevation),
            Ok(None) => println!("{}: no data", name),
            Err(e) => println!("{}: error - {}", name, e),
        }
    }

    // Show cache statistics
    let stats = catalog.cache_stats();
    println!("\nCache statistics:");
    println!("  Cached tiles: {}", stats.entry_count);
    println!("  Hits: {}", stats.hit_count);
    println!("  Misses: {}", stats.miss_count);
    println!("  Hit rate: {:.1}%", stats.hit_rate() * 100.0);

    Ok(())
}
