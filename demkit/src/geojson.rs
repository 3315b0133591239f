//! GeoJSON elevation enrichment.
//!
//! This module adds ground elevation from a [`DemCatalog`] as the Z coordinate
//! of GeoJSON positions. Enable the `geojson` feature to use this module.
//!
//! # Example
//!
//! ```ignore
//! use demkit::DemCatalog;
//! use demkit::geojson::add_elevations_to_geometry;
//! use geojson::Geometry;
//!
//! let catalog = DemCatalog::new("/data/dem", 100)?;
//!
//! let geometry: Geometry = r#"{"type": "Point", "coordinates": [7.9819, 46.5475]}"#
//!     .parse()
//!     .unwrap();
//!
//! let enriched = add_elevations_to_geometry(&catalog, geometry)?;
//! // Result: {"type": "Point", "coordinates": [7.9819, 46.5475, 3466.0]}
//! ```

use geojson::{Geometry, Value as GeoJsonValue};

use crate::catalog::DemCatalog;
use crate::error::{DemError, Result};

/// Add elevations to all positions in a GeoJSON geometry.
///
/// Input positions are in GeoJSON order: `[longitude, latitude]` or
/// `[longitude, latitude, altitude]`. Every position comes back as
/// `[longitude, latitude, elevation]`. All geometry types are supported,
/// including nested GeometryCollections.
///
/// # Errors
///
/// Returns an error if:
/// - A position has fewer than 2 elements ([`DemError::InvalidCoordinate`])
/// - No tile has data at a position ([`DemError::NoCoverage`])
/// - A covering tile fails to decode
pub fn add_elevations_to_geometry(catalog: &DemCatalog, geometry: Geometry) -> Result<Geometry> {
    let value = map_positions(geometry.value, &mut |coord: &[f64]| {
        add_elevation_to_coord(catalog, coord)
    })?;
    Ok(Geometry::new(value))
}

/// Like [`add_elevations_to_geometry`], but positions without data are kept
/// unchanged instead of failing.
///
/// Returns the enriched geometry and the number of positions left unchanged.
///
/// # Errors
///
/// Fails on malformed positions and on tiles that cannot be decoded; only
/// positions without coverage are tolerated.
pub fn add_available_elevations(
    catalog: &DemCatalog,
    geometry: Geometry,
) -> Result<(Geometry, usize)> {
    let mut missing = 0;
    let value = map_positions(geometry.value, &mut |coord: &[f64]| {
        match add_elevation_to_coord(catalog, coord) {
            Err(DemError::NoCoverage { .. }) => {
                missing += 1;
                Ok(coord.to_vec())
            }
            other => other,
        }
    })?;
    Ok((Geometry::new(value), missing))
}

/// Add elevation to a single GeoJSON position.
///
/// Takes `[lon, lat]` or `[lon, lat, alt]` and returns `[lon, lat, elevation]`.
///
/// # Example
///
/// ```ignore
/// let elevated = add_elevation_to_coord(&catalog, &[7.9819, 46.5475])?;
/// assert_eq!(elevated.len(), 3);
/// ```
pub fn add_elevation_to_coord(catalog: &DemCatalog, coord: &[f64]) -> Result<Vec<f64>> {
    if coord.len() < 2 {
        return Err(DemError::InvalidCoordinate {
            message: "Coordinate must have at least 2 elements (lon, lat)".to_string(),
        });
    }

    let lon = coord[0];
    let lat = coord[1];

    let elevation = catalog
        .elevation(lat, lon)?
        .ok_or(DemError::NoCoverage { lat, lon })?;

    Ok(vec![lon, lat, elevation])
}

/// Add elevations to a list of GeoJSON positions.
pub fn add_elevation_to_coords(catalog: &DemCatalog, coords: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    coords
        .iter()
        .map(|coord| add_elevation_to_coord(catalog, coord))
        .collect()
}

type PositionFn<'a> = dyn FnMut(&[f64]) -> Result<Vec<f64>> + 'a;

fn map_coords(coords: Vec<Vec<f64>>, f: &mut PositionFn<'_>) -> Result<Vec<Vec<f64>>> {
    coords.iter().map(|coord| f(&coord[..])).collect()
}

fn map_rings(rings: Vec<Vec<Vec<f64>>>, f: &mut PositionFn<'_>) -> Result<Vec<Vec<Vec<f64>>>> {
    rings.into_iter().map(|ring| map_coords(ring, f)).collect()
}

fn map_positions(value: GeoJsonValue, f: &mut PositionFn<'_>) -> Result<GeoJsonValue> {
    Ok(match value {
        GeoJsonValue::Point(coord) => GeoJsonValue::Point(f(&coord[..])?),
        GeoJsonValue::MultiPoint(coords) => GeoJsonValue::MultiPoint(map_coords(coords, f)?),
        GeoJsonValue::LineString(coords) => GeoJsonValue::LineString(map_coords(coords, f)?),
        GeoJsonValue::MultiLineString(lines) => GeoJsonValue::MultiLineString(map_rings(lines, f)?),
        GeoJsonValue::Polygon(rings) => GeoJsonValue::Polygon(map_rings(rings, f)?),
        GeoJsonValue::MultiPolygon(polygons) => GeoJsonValue::MultiPolygon(
            polygons
                .into_iter()
                .map(|polygon| map_rings(polygon, f))
                .collect::<Result<Vec<_>>>()?,
        ),
        GeoJsonValue::GeometryCollection(geometries) => GeoJsonValue::GeometryCollection(
            geometries
                .into_iter()
                .map(|g| map_positions(g.value, f).map(Geometry::new))
                .collect::<Result<Vec<_>>>()?,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const SRTM3_SIZE: usize = 1201 * 1201 * 2;
    const SRTM3_SAMPLES: usize = 1201;

    fn create_test_tile(dir: &Path, filename: &str, center_elevation: i16) {
        let mut data = vec![0u8; SRTM3_SIZE];

        // Set center elevation (row 600, col 600)
        let center_offset = (600 * SRTM3_SAMPLES + 600) * 2;
        data[center_offset..center_offset + 2].copy_from_slice(&center_elevation.to_be_bytes());

        fs::write(dir.join(filename), data).unwrap();
    }

    fn test_catalog(temp_dir: &TempDir) -> DemCatalog {
        create_test_tile(temp_dir.path(), "N46E007.hgt", 500);
        DemCatalog::new(temp_dir.path(), 10).unwrap()
    }

    #[test]
    fn test_add_elevation_to_coord() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = test_catalog(&temp_dir);

        // GeoJSON order: [lon, lat, alt]
        let result = add_elevation_to_coord(&catalog, &[7.5, 46.5, 1234.0]).unwrap();
        assert_eq!(result, vec![7.5, 46.5, 500.0]);
    }

    #[test]
    fn test_add_elevation_to_coord_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = test_catalog(&temp_dir);

        assert!(matches!(
            add_elevation_to_coord(&catalog, &[7.5]),
            Err(DemError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_no_coverage_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = test_catalog(&temp_dir);

        match add_elevation_to_coord(&catalog, &[100.0, 10.0]) {
            Err(DemError::NoCoverage { lat, lon }) => {
                assert_eq!(lat, 10.0);
                assert_eq!(lon, 100.0);
            }
            other => panic!("Expected NoCoverage, got {:?}", other),
        }
    }

    #[test]
    fn test_add_elevation_to_coords() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = test_catalog(&temp_dir);

        let coords = vec![vec![7.5, 46.5], vec![7.6, 46.6]];
        let result = add_elevation_to_coords(&catalog, &coords).unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0][2], 500.0);
        assert_eq!(result[1].len(), 3);
    }

    #[test]
    fn test_add_elevations_to_polygon() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = test_catalog(&temp_dir);

        let geometry = Geometry::new(GeoJsonValue::Polygon(vec![vec![
            vec![7.5, 46.5],
            vec![7.6, 46.5],
            vec![7.55, 46.6],
            vec![7.5, 46.5],
        ]]));
        let result = add_elevations_to_geometry(&catalog, geometry).unwrap();

        if let GeoJsonValue::Polygon(rings) = result.value {
            assert_eq!(rings.len(), 1);
            assert_eq!(rings[0].len(), 4);
            assert_eq!(rings[0][0], vec![7.5, 46.5, 500.0]);
            for coord in &rings[0] {
                assert_eq!(coord.len(), 3);
            }
        } else {
            panic!("Expected Polygon geometry");
        }
    }

    #[test]
    fn test_add_elevations_to_geometry_collection() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = test_catalog(&temp_dir);

        let geometry = Geometry::new(GeoJsonValue::GeometryCollection(vec![
            Geometry::new(GeoJsonValue::Point(vec![7.5, 46.5])),
            Geometry::new(GeoJsonValue::MultiLineString(vec![vec![
                vec![7.5, 46.5],
                vec![7.6, 46.6],
            ]])),
        ]));
        let result = add_elevations_to_geometry(&catalog, geometry).unwrap();

        if let GeoJsonValue::GeometryCollection(geometries) = result.value {
            assert_eq!(geometries.len(), 2);
            assert_eq!(
                geometries[0].value,
                GeoJsonValue::Point(vec![7.5, 46.5, 500.0])
            );
        } else {
            panic!("Expected GeometryCollection");
        }
    }

    #[test]
    fn test_add_available_elevations_keeps_missing() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = test_catalog(&temp_dir);

        let geometry = Geometry::new(GeoJsonValue::LineString(vec![
            vec![7.5, 46.5],
            vec![100.0, 10.0, 12.0],
        ]));
        let (result, missing) = add_available_elevations(&catalog, geometry).unwrap();

        assert_eq!(missing, 1);
        assert_eq!(
            result.value,
            GeoJsonValue::LineString(vec![vec![7.5, 46.5, 500.0], vec![100.0, 10.0, 12.0]])
        );

        let bad = Geometry::new(GeoJsonValue::Point(vec![7.5]));
        assert!(add_available_elevations(&catalog, bad).is_err());
    }

    #[test]
    fn test_add_available_elevations_reports_decode_failures() {
        let temp_dir = TempDir::new().unwrap();
        let catalog = test_catalog(&temp_dir);

        // Truncated after the catalog scanned it
        fs::write(temp_dir.path().join("N46E007.hgt"), vec![0u8; 100]).unwrap();

        let geometry = Geometry::new(GeoJsonValue::Point(vec![7.5, 46.5]));
        assert!(matches!(
            add_available_elevations(&catalog, geometry),
            Err(DemError::TileLoad { .. })
        ));
    }
}
