use std::io::Write;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use demkit::{
    compare_methods, query, resample, DemCatalog, GeoTransform, RasterGrid, ResamplingMethod,
    Scoring,
};
use tempfile::TempDir;

const SRTM3_SAMPLES: usize = 1201;
const SRTM3_SIZE: usize = SRTM3_SAMPLES * SRTM3_SAMPLES * 2;

/// Create a synthetic SRTM3 tile with a simple elevation gradient.
fn create_tile(dir: &std::path::Path, filename: &str) {
    let mut data = vec![0u8; SRTM3_SIZE];
    for row in 0..SRTM3_SAMPLES {
        for col in 0..SRTM3_SAMPLES {
            let elev = ((row + col) % 4000) as i16;
            let offset = (row * SRTM3_SAMPLES + col) * 2;
            data[offset..offset + 2].copy_from_slice(&elev.to_be_bytes());
        }
    }
    let path = dir.join(filename);
    let mut file = std::fs::File::create(path).unwrap();
    file.write_all(&data).unwrap();
}

fn synthetic_grid(size: usize) -> RasterGrid {
    let transform = GeoTransform::north_up(7.0, 47.0, 1.0 / 3600.0, -1.0 / 3600.0);
    RasterGrid::from_fn(size, size, transform, -32768.0, |row, col| {
        let (x, y) = (col as f64, row as f64);
        800.0 + 0.002 * (x * x + y * y) + 25.0 * (x / 40.0).sin() * (y / 55.0).cos()
    })
    .unwrap()
}

fn bench_point_query(c: &mut Criterion) {
    let grid = synthetic_grid(1201);

    c.bench_function("elevation_at", |b| {
        b.iter(|| {
            black_box(query::elevation_at(&grid, black_box(46.87), black_box(7.13)).unwrap());
        });
    });
}

fn bench_catalog_cached(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    create_tile(tmp.path(), "N35E138.hgt");
    let catalog = DemCatalog::new(tmp.path(), 10).unwrap();

    // Warm the cache
    let _ = catalog.elevation(35.5, 138.5);

    c.bench_function("catalog_elevation_cached", |b| {
        b.iter(|| {
            black_box(
                catalog
                    .elevation(black_box(35.3606), black_box(138.7274))
                    .unwrap(),
            );
        });
    });
}

fn bench_resample(c: &mut Criterion) {
    let grid = synthetic_grid(1000);
    let mut group = c.benchmark_group("resample_1000_by_4");

    for method in ResamplingMethod::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(method), &method, |b, &m| {
            b.iter(|| black_box(resample(&grid, 4, m).unwrap()));
        });
    }

    group.finish();
}

fn bench_compare(c: &mut Criterion) {
    let grid = synthetic_grid(500);
    let mut group = c.benchmark_group("compare_methods_500_by_4");
    group.sample_size(20);

    for scoring in [Scoring::CellCenter, Scoring::Footprint] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{:?}", scoring)),
            &scoring,
            |b, &s| {
                b.iter(|| black_box(compare_methods(&grid, 4, s).unwrap()));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_point_query,
    bench_catalog_cached,
    bench_resample,
    bench_compare
);
criterion_main!(benches);
