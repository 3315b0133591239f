//! End-to-end checks across decoding, lookup, resampling and evaluation.

use approx::assert_relative_eq;
use demkit::{
    compare_methods, evaluate, query, read_raster, resample, GeoTransform, RasterGrid,
    ResamplingMethod, Scoring,
};
use tempfile::TempDir;

fn quadratic_surface(size: usize) -> RasterGrid {
    let transform = GeoTransform::north_up(7.0, 47.0, 1.0 / 3600.0, -1.0 / 3600.0);
    RasterGrid::from_fn(size, size, transform, -32768.0, |row, col| {
        let (x, y) = (col as f64, row as f64);
        0.001 * (x * x + y * y)
    })
    .unwrap()
}

#[test]
fn downscale_geometry_2000_by_4() {
    let fine = quadratic_surface(2000);
    let coarse = resample(&fine, 4, ResamplingMethod::Cubic).unwrap();

    assert_eq!(coarse.bounds(), (500, 500));

    let fine_gt = fine.geo_transform();
    let coarse_gt = coarse.geo_transform();
    assert_eq!(coarse_gt.pixel_width(), fine_gt.pixel_width() * 4.0);
    assert_eq!(coarse_gt.pixel_height(), fine_gt.pixel_height() * 4.0);

    // Same outer corner, same extent
    let fine_fp = fine.footprint();
    let coarse_fp = coarse.footprint();
    assert_relative_eq!(coarse_fp.min_lon, fine_fp.min_lon, epsilon = 1e-9);
    assert_relative_eq!(coarse_fp.max_lat, fine_fp.max_lat, epsilon = 1e-9);
    assert_relative_eq!(coarse_fp.max_lon, fine_fp.max_lon, epsilon = 1e-9);
    assert_relative_eq!(coarse_fp.min_lat, fine_fp.min_lat, epsilon = 1e-9);
}

#[test]
fn method_ranking_2000_by_4() {
    let fine = quadratic_surface(2000);
    let reports = compare_methods(&fine, 4, Scoring::Footprint).unwrap();

    let order: Vec<ResamplingMethod> = reports.iter().map(|r| r.method).collect();
    assert_eq!(
        order,
        vec![
            ResamplingMethod::Cubic,
            ResamplingMethod::Bilinear,
            ResamplingMethod::Nearest
        ]
    );

    let nearest = reports[2].rmse;
    let bilinear = reports[1].rmse;
    let cubic = reports[0].rmse;
    assert!(nearest > bilinear);
    assert!(bilinear >= cubic);

    for report in &reports {
        assert!(report.rmse >= report.mae);
        assert_eq!(report.sample_count, 2000 * 2000);
    }
}

#[test]
fn cell_center_scoring_per_coarse_cell() {
    let fine = quadratic_surface(200);

    for method in ResamplingMethod::ALL {
        let coarse = resample(&fine, 4, method).unwrap();
        let report = evaluate(&fine, &coarse, method).unwrap();
        assert_eq!(report.sample_count, 50 * 50);
        if method == ResamplingMethod::Nearest {
            assert_eq!(report.rmse, 0.0);
        } else {
            assert!(report.rmse > 0.0);
        }
    }
}

#[test]
fn decoded_tile_lookup_and_resample() {
    const SAMPLES: usize = 1201;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("N46E007.hgt");

    let mut bytes = Vec::with_capacity(SAMPLES * SAMPLES * 2);
    for row in 0..SAMPLES {
        for col in 0..SAMPLES {
            let elevation = (1000 + row / 10 + col / 20) as i16;
            bytes.extend_from_slice(&elevation.to_be_bytes());
        }
    }
    std::fs::write(&path, bytes).unwrap();

    let grid = read_raster(&path).unwrap();
    assert_eq!(grid.bounds(), (SAMPLES, SAMPLES));

    // Row 600, col 300
    assert_eq!(query::elevation_at(&grid, 46.5, 7.25).unwrap(), Some(1075.0));
    assert_eq!(query::elevation_at(&grid, 48.0, 7.25).unwrap(), None);

    let coarse = resample(&grid, 3, ResamplingMethod::Bilinear).unwrap();
    assert_eq!(coarse.bounds(), (400, 400));

    let stats = coarse.statistics().unwrap();
    assert!(stats.min >= 1000.0);
    assert!(stats.max <= 1000.0 + 120.0 + 60.0);
    assert_eq!(stats.nodata_count, 0);
}
