use anyhow::{Context, Result};
use demkit::{query, read_raster};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct ElevationResponse {
    lat: f64,
    lon: f64,
    elevation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raster: Option<String>,
}

pub fn run(
    data_dir: Option<PathBuf>,
    cache_size: u64,
    raster: Option<PathBuf>,
    lat: f64,
    lon: f64,
    json: bool,
) -> Result<()> {
    let elevation = match &raster {
        Some(path) => {
            let grid = read_raster(path)
                .with_context(|| format!("Failed to read raster {}", path.display()))?;
            query::elevation_at(&grid, lat, lon).context("Failed to get elevation")?
        }
        None => super::open_catalog(data_dir, cache_size)?
            .elevation(lat, lon)
            .context("Failed to get elevation")?,
    };

    if json {
        let response = ElevationResponse {
            lat,
            lon,
            elevation,
            raster: raster.map(|p| p.display().to_string()),
        };
        println!("{}", serde_json::to_string(&response)?);
    } else {
        match elevation {
            Some(elev) => println!("{}", elev),
            None => println!("void"),
        }
    }

    Ok(())
}
