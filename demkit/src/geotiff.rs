//! Single-band GeoTIFF decoding.
//!
//! Georeferencing is read from the GeoTIFF model tags:
//!
//! - `ModelTransformation` (34264), a full affine matrix, or
//! - `ModelTiepoint` (33922) together with `ModelPixelScale` (33550).
//!
//! Both describe raster space, where the default `PixelIsArea` raster type puts
//! `(0, 0)` on the outer corner of the first pixel. Grids are center-registered,
//! so those transforms are shifted by half a pixel. `PixelIsPoint` rasters
//! (`GTRasterTypeGeoKey` = 2) are used as stored.
//!
//! The no-data value comes from the `GDAL_NODATA` ASCII tag (42113).

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tracing::debug;

use crate::error::{DemError, Result};
use crate::grid::{RasterGrid, DEFAULT_NODATA};
use crate::transform::GeoTransform;

// The decoder maps these IDs (33550, 33922, 34264, 34735, 42113) to named
// variants, so `Tag::Unknown` lookups never match them.
const MODEL_PIXEL_SCALE: Tag = Tag::ModelPixelScaleTag;
const MODEL_TIEPOINT: Tag = Tag::ModelTiepointTag;
const MODEL_TRANSFORMATION: Tag = Tag::ModelTransformationTag;
const GEO_KEY_DIRECTORY: Tag = Tag::GeoKeyDirectoryTag;
const GDAL_NODATA: Tag = Tag::GdalNodata;

/// `GTRasterTypeGeoKey` in the GeoKeyDirectory.
const RASTER_TYPE_KEY: u16 = 1025;
const RASTER_PIXEL_IS_POINT: u16 = 2;

/// Georeferencing and size of a GeoTIFF, read without decoding pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTiffHeader {
    pub width: usize,
    pub height: usize,
    /// Center-registered transform
    pub transform: GeoTransform,
    pub nodata: f64,
}

/// Read the header of a GeoTIFF.
///
/// # Errors
///
/// Fails if the file is not a TIFF or has no model transform tags
/// ([`DemError::MissingGeoreference`]).
pub fn read_header<P: AsRef<Path>>(path: P) -> Result<GeoTiffHeader> {
    let path = path.as_ref();
    let mut decoder = open_decoder(path)?;
    header_from_decoder(&mut decoder, path)
}

/// Decode a GeoTIFF into a [`RasterGrid`].
///
/// Only the first band of the first image is read. Integer and float sample
/// types are widened to `f64`.
pub fn read_geotiff<P: AsRef<Path>>(path: P) -> Result<RasterGrid> {
    let path = path.as_ref();
    let mut decoder = open_decoder(path)?;
    let header = header_from_decoder(&mut decoder, path)?;

    let data = decode_samples(decoder.read_image()?);

    debug!(
        path = %path.display(),
        width = header.width,
        height = header.height,
        "decoded geotiff"
    );

    RasterGrid::new(
        header.width,
        header.height,
        data,
        header.transform,
        header.nodata,
    )
}

fn open_decoder(path: &Path) -> Result<Decoder<BufReader<File>>> {
    let file = File::open(path)?;
    let decoder = Decoder::new(BufReader::new(file))?;

    // 1 arc-second tiles are 3601 x 3601, finer national models far larger
    let mut limits = Limits::default();
    limits.decoding_buffer_size = 1024 * 1024 * 1024; // 1 GB
    limits.intermediate_buffer_size = 1024 * 1024 * 1024; // 1 GB
    limits.ifd_value_size = 1024 * 1024 * 1024;

    Ok(decoder.with_limits(limits))
}

fn header_from_decoder<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    path: &Path,
) -> Result<GeoTiffHeader> {
    let (width, height) = decoder.dimensions()?;

    let corner = model_transform(decoder).ok_or_else(|| DemError::MissingGeoreference {
        path: path.to_path_buf(),
    })?;

    let transform = if is_pixel_is_point(decoder) {
        corner
    } else {
        let (x, y) = corner.forward(0.5, 0.5);
        corner.with_origin(x, y)
    };

    let nodata = decoder
        .get_tag_ascii_string(GDAL_NODATA)
        .ok()
        .and_then(|s| s.trim_matches(|c: char| c == '\0' || c.is_whitespace()).parse().ok())
        .unwrap_or(DEFAULT_NODATA);

    Ok(GeoTiffHeader {
        width: width as usize,
        height: height as usize,
        transform,
        nodata,
    })
}

/// Raster-space transform from the model tags, if present.
fn model_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    if let Ok(m) = decoder.get_tag_f64_vec(MODEL_TRANSFORMATION) {
        if m.len() >= 8 {
            // Row-major 4x4; raster I is the column, J the row
            return Some(GeoTransform::new(m[3], m[0], m[1], m[7], m[4], m[5]));
        }
    }

    let tiepoint = decoder.get_tag_f64_vec(MODEL_TIEPOINT).ok()?;
    let scale = decoder
        .get_tag_f64_vec(MODEL_PIXEL_SCALE)
        .ok()?;
    if tiepoint.len() < 6 || scale.len() < 2 {
        return None;
    }

    // Tiepoint format: [i, j, k, x, y, z] where (i, j) is raster space
    let (i, j) = (tiepoint[0], tiepoint[1]);
    let (x, y) = (tiepoint[3], tiepoint[4]);
    let (sx, sy) = (scale[0], scale[1]);

    Some(GeoTransform::north_up(x - i * sx, y + j * sy, sx, -sy))
}

fn is_pixel_is_point<R: Read + Seek>(decoder: &mut Decoder<R>) -> bool {
    let Ok(dir) = decoder.get_tag_u16_vec(GEO_KEY_DIRECTORY) else {
        return false;
    };

    // Header is [version, revision, minor, key count], then 4 shorts per key
    dir.get(4..)
        .unwrap_or_default()
        .chunks_exact(4)
        .find(|key| key[0] == RASTER_TYPE_KEY && key[1] == 0)
        .is_some_and(|key| key[3] == RASTER_PIXEL_IS_POINT)
}

fn decode_samples(result: DecodingResult) -> Vec<f64> {
    match result {
        DecodingResult::F64(data) => data,
        DecodingResult::F32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U64(data) => data.into_iter().map(|v| v as f64).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|v| v as f64).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::elevation_at;
    use approx::assert_relative_eq;
    use tempfile::TempDir;
    use tiff::encoder::{colortype, TiffEncoder};

    enum Georef<'a> {
        Tiepoint { raster_type: Option<u16> },
        Matrix(&'a [f64]),
        None,
    }

    /// Write a Float32 GeoTIFF with 0.5° pixels whose outer corner is at (7, 47)
    fn write_tiff(
        path: &Path,
        width: u32,
        height: u32,
        data: &[f32],
        georef: Georef<'_>,
        nodata: Option<&str>,
    ) {
        let file = File::create(path).unwrap();
        let mut encoder = TiffEncoder::new(file).unwrap();
        let mut image = encoder
            .new_image::<colortype::Gray32Float>(width, height)
            .unwrap();

        match georef {
            Georef::Tiepoint { raster_type } => {
                image
                    .encoder()
                    .write_tag(MODEL_PIXEL_SCALE, &[0.5f64, 0.5, 0.0][..])
                    .unwrap();
                image
                    .encoder()
                    .write_tag(
                        MODEL_TIEPOINT,
                        &[0.0f64, 0.0, 0.0, 7.0, 47.0, 0.0][..],
                    )
                    .unwrap();
                if let Some(raster_type) = raster_type {
                    let keys = [1u16, 1, 0, 1, RASTER_TYPE_KEY, 0, 1, raster_type];
                    image
                        .encoder()
                        .write_tag(GEO_KEY_DIRECTORY, &keys[..])
                        .unwrap();
                }
            }
            Georef::Matrix(m) => {
                image
                    .encoder()
                    .write_tag(MODEL_TRANSFORMATION, m)
                    .unwrap();
            }
            Georef::None => {}
        }

        if let Some(nodata) = nodata {
            image
                .encoder()
                .write_tag(GDAL_NODATA, nodata)
                .unwrap();
        }

        image.write_data(data).unwrap();
    }

    fn sample_data() -> Vec<f32> {
        // 4 x 2, row 1 col 3 is no-data
        vec![400.0, 410.0, 420.0, 430.0, 500.0, 510.0, 520.0, -9999.0]
    }

    #[test]
    fn test_read_tiepoint_pixel_is_area() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("area.tif");
        write_tiff(
            &path,
            4,
            2,
            &sample_data(),
            Georef::Tiepoint { raster_type: None },
            Some("-9999"),
        );

        let grid = read_geotiff(&path).unwrap();
        assert_eq!(grid.bounds(), (4, 2));
        assert_eq!(grid.nodata(), -9999.0);
        assert_eq!(grid.sample(1, 2).unwrap(), 520.0);

        // Center of the first pixel is half a pixel inside the corner
        let gt = grid.geo_transform();
        assert_eq!(gt.origin(), (7.25, 46.75));
        assert_eq!(gt.pixel_width(), 0.5);
        assert_eq!(gt.pixel_height(), -0.5);

        let fp = grid.footprint();
        assert_relative_eq!(fp.min_lon, 7.0);
        assert_relative_eq!(fp.max_lon, 9.0);
        assert_relative_eq!(fp.min_lat, 46.0);
        assert_relative_eq!(fp.max_lat, 47.0);

        assert_eq!(elevation_at(&grid, 46.9, 7.1).unwrap(), Some(400.0));
        assert_eq!(elevation_at(&grid, 46.1, 8.4).unwrap(), Some(520.0));
        assert_eq!(elevation_at(&grid, 46.1, 8.9).unwrap(), None);
    }

    #[test]
    fn test_reads_tags_written_by_numeric_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("numeric.tif");

        let file = File::create(&path).unwrap();
        let mut encoder = TiffEncoder::new(file).unwrap();
        let mut image = encoder.new_image::<colortype::Gray32Float>(4, 2).unwrap();
        image
            .encoder()
            .write_tag(Tag::Unknown(33550), &[0.5f64, 0.5, 0.0][..])
            .unwrap();
        image
            .encoder()
            .write_tag(Tag::Unknown(33922), &[0.0f64, 0.0, 0.0, 7.0, 47.0, 0.0][..])
            .unwrap();
        image.encoder().write_tag(Tag::Unknown(42113), "-9999").unwrap();
        image.write_data(&sample_data()).unwrap();

        let header = read_header(&path).unwrap();
        assert_eq!(header.transform.origin(), (7.25, 46.75));
        assert_eq!(header.nodata, -9999.0);
    }

    #[test]
    fn test_read_pixel_is_point() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("point.tif");
        write_tiff(
            &path,
            4,
            2,
            &sample_data(),
            Georef::Tiepoint {
                raster_type: Some(RASTER_PIXEL_IS_POINT),
            },
            None,
        );

        let header = read_header(&path).unwrap();
        assert_eq!(header.transform.origin(), (7.0, 47.0));
        assert_eq!(header.nodata, DEFAULT_NODATA);
    }

    #[test]
    fn test_read_model_transformation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("matrix.tif");
        #[rustfmt::skip]
        let matrix = [
            0.5, 0.0, 0.0, 7.0,
            0.0, -0.5, 0.0, 47.0,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        write_tiff(&path, 4, 2, &sample_data(), Georef::Matrix(&matrix[..]), None);

        let header = read_header(&path).unwrap();
        assert_eq!((header.width, header.height), (4, 2));
        assert_eq!(
            header.transform,
            GeoTransform::north_up(7.25, 46.75, 0.5, -0.5)
        );
    }

    #[test]
    fn test_missing_georeference() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.tif");
        write_tiff(&path, 4, 2, &sample_data(), Georef::None, None);

        assert!(matches!(
            read_geotiff(&path),
            Err(DemError::MissingGeoreference { .. })
        ));
    }

    #[test]
    fn test_not_a_tiff() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.tif");
        std::fs::write(&path, b"definitely not a tiff").unwrap();

        assert!(matches!(read_header(&path), Err(DemError::Tiff(_))));
    }
}
