use anyhow::{bail, Context, Result};
use demkit::geojson::add_available_elevations;
use demkit::DemCatalog;
use geojson::{GeoJson, Geometry};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

pub fn run(
    data_dir: Option<PathBuf>,
    cache_size: u64,
    input: PathBuf,
    output: Option<PathBuf>,
    lat_col: String,
    lon_col: String,
) -> Result<()> {
    let catalog = super::open_catalog(data_dir, cache_size)?;

    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => process_csv(&catalog, &input, output, &lat_col, &lon_col),
        "geojson" | "json" => process_geojson(&catalog, &input, output),
        _ => bail!(
            "Unsupported file format: {}. Use .csv or .geojson",
            extension
        ),
    }
}

fn default_output(input: &Path, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_elevation.{}", stem, extension))
}

fn process_csv(
    catalog: &DemCatalog,
    input: &Path,
    output: Option<PathBuf>,
    lat_col: &str,
    lon_col: &str,
) -> Result<()> {
    let file = File::open(input).context("Failed to open input file")?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    let headers = reader.headers()?.clone();
    let lat_idx = headers
        .iter()
        .position(|h| h == lat_col)
        .with_context(|| format!("Column '{}' not found in CSV", lat_col))?;
    let lon_idx = headers
        .iter()
        .position(|h| h == lon_col)
        .with_context(|| format!("Column '{}' not found in CSV", lon_col))?;

    let records: Vec<_> = reader.records().collect::<Result<_, _>>()?;
    let pb = super::progress_bar(records.len() as u64)?;

    let output_path = output.unwrap_or_else(|| default_output(input, "csv"));
    let output_file = File::create(&output_path).context("Failed to create output file")?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(output_file));

    let mut new_headers: Vec<&str> = headers.iter().collect();
    new_headers.push("elevation");
    writer.write_record(&new_headers)?;

    let mut void_count = 0usize;
    for record in &records {
        let lat: f64 = record
            .get(lat_idx)
            .context("Missing latitude")?
            .trim()
            .parse()
            .context("Invalid latitude")?;
        let lon: f64 = record
            .get(lon_idx)
            .context("Missing longitude")?
            .trim()
            .parse()
            .context("Invalid longitude")?;

        let elevation = match catalog.elevation(lat, lon) {
            Ok(Some(elev)) => elev.to_string(),
            Ok(None) => {
                void_count += 1;
                "void".to_string()
            }
            Err(e) => {
                warn!(lat, lon, error = %e, "elevation lookup failed");
                void_count += 1;
                "void".to_string()
            }
        };

        let mut new_record: Vec<&str> = record.iter().collect();
        new_record.push(&elevation);
        writer.write_record(&new_record)?;

        pb.inc(1);
    }

    pb.finish_with_message("done");
    writer.flush()?;

    if void_count > 0 {
        warn!(void_count, "some rows have no elevation data");
    }
    println!("Output written to: {}", output_path.display());
    Ok(())
}

fn process_geojson(catalog: &DemCatalog, input: &Path, output: Option<PathBuf>) -> Result<()> {
    let file = File::open(input).context("Failed to open input file")?;
    let geojson: GeoJson =
        serde_json::from_reader(BufReader::new(file)).context("Failed to parse GeoJSON")?;

    let mut missing = 0usize;
    let mut enrich = |geometry: Geometry| -> Result<Geometry> {
        let (enriched, unresolved) = add_available_elevations(catalog, geometry)?;
        missing += unresolved;
        Ok(enriched)
    };

    let result = match geojson {
        GeoJson::Geometry(geometry) => GeoJson::Geometry(enrich(geometry)?),
        GeoJson::Feature(mut feature) => {
            if let Some(geometry) = feature.geometry.take() {
                feature.geometry = Some(enrich(geometry)?);
            }
            GeoJson::Feature(feature)
        }
        GeoJson::FeatureCollection(mut fc) => {
            let pb = super::progress_bar(fc.features.len() as u64)?;
            for feature in &mut fc.features {
                if let Some(geometry) = feature.geometry.take() {
                    feature.geometry = Some(enrich(geometry)?);
                }
                pb.inc(1);
            }
            pb.finish_with_message("done");
            GeoJson::FeatureCollection(fc)
        }
    };

    if missing > 0 {
        warn!(missing, "positions without elevation data were left unchanged");
    }

    let output_path = output.unwrap_or_else(|| default_output(input, "geojson"));
    let output_file = File::create(&output_path).context("Failed to create output file")?;
    let mut writer = BufWriter::new(output_file);
    serde_json::to_writer_pretty(&mut writer, &result)?;
    writer.flush()?;

    println!("Output written to: {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output() {
        assert_eq!(
            default_output(Path::new("/tmp/points.csv"), "csv"),
            PathBuf::from("/tmp/points_elevation.csv")
        );
        assert_eq!(
            default_output(Path::new("route.json"), "geojson"),
            PathBuf::from("route_elevation.geojson")
        );
    }
}
