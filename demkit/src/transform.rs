//! Affine geotransform between pixel and geographic coordinates.
//!
//! The mapping follows the GDAL coefficient layout:
//!
//! ```text
//! geo_x = origin_x + col * pixel_width + row * row_rotation
//! geo_y = origin_y + col * col_rotation + row * pixel_height
//! ```
//!
//! Grids in this crate are center-registered: integer `(row, col)` maps to the
//! center of that sample, so the outer edge of the raster lies half a pixel
//! beyond the first and last sample centers.

use serde::{Deserialize, Serialize};

use crate::error::{DemError, Result};

/// Six-coefficient affine transform. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    origin_x: f64,
    pixel_width: f64,
    row_rotation: f64,
    origin_y: f64,
    col_rotation: f64,
    pixel_height: f64,
}

impl GeoTransform {
    /// Create a transform from all six coefficients.
    pub fn new(
        origin_x: f64,
        pixel_width: f64,
        row_rotation: f64,
        origin_y: f64,
        col_rotation: f64,
        pixel_height: f64,
    ) -> Self {
        Self {
            origin_x,
            pixel_width,
            row_rotation,
            origin_y,
            col_rotation,
            pixel_height,
        }
    }

    /// Create a transform with no rotation.
    ///
    /// For north-up rasters `pixel_height` is negative.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self::new(origin_x, pixel_width, 0.0, origin_y, 0.0, pixel_height)
    }

    /// Create from GDAL order `[origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]`.
    pub fn from_gdal(coeffs: [f64; 6]) -> Self {
        Self::new(
            coeffs[0], coeffs[1], coeffs[2], coeffs[3], coeffs[4], coeffs[5],
        )
    }

    /// Coefficients in GDAL order.
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    pub fn origin(&self) -> (f64, f64) {
        (self.origin_x, self.origin_y)
    }

    pub fn pixel_width(&self) -> f64 {
        self.pixel_width
    }

    pub fn pixel_height(&self) -> f64 {
        self.pixel_height
    }

    pub fn row_rotation(&self) -> f64 {
        self.row_rotation
    }

    pub fn col_rotation(&self) -> f64 {
        self.col_rotation
    }

    /// Determinant of the 2×2 linear part.
    pub fn determinant(&self) -> f64 {
        self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation
    }

    /// Map a (possibly fractional) pixel coordinate to geographic coordinates.
    pub fn forward(&self, row: f64, col: f64) -> (f64, f64) {
        let x = self.origin_x + col * self.pixel_width + row * self.row_rotation;
        let y = self.origin_y + col * self.col_rotation + row * self.pixel_height;
        (x, y)
    }

    /// Map geographic coordinates to a fractional `(row, col)`.
    ///
    /// The result is not rounded; choosing a pixel is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`DemError::SingularTransform`] if the determinant is zero.
    pub fn inverse(&self, geo_x: f64, geo_y: f64) -> Result<(f64, f64)> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return Err(DemError::SingularTransform { determinant: det });
        }

        let dx = geo_x - self.origin_x;
        let dy = geo_y - self.origin_y;

        let col = (self.pixel_height * dx - self.row_rotation * dy) / det;
        let row = (self.pixel_width * dy - self.col_rotation * dx) / det;

        Ok((row, col))
    }

    /// Scale pixel size and rotation by `factor`, keeping the origin.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            pixel_width: self.pixel_width * factor,
            row_rotation: self.row_rotation * factor,
            col_rotation: self.col_rotation * factor,
            pixel_height: self.pixel_height * factor,
            ..*self
        }
    }

    /// Same coefficients with the origin moved to `(origin_x, origin_y)`.
    pub fn with_origin(&self, origin_x: f64, origin_y: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            ..*self
        }
    }

    /// Ground distance covered by one pixel along its coarsest axis.
    ///
    /// Smaller is finer. Used to rank overlapping tiles.
    pub fn resolution(&self) -> f64 {
        let x = self.pixel_width.hypot(self.col_rotation);
        let y = self.row_rotation.hypot(self.pixel_height);
        x.max(y)
    }

    /// Geographic box spanned by the outer pixel edges of a `width`×`height` grid.
    pub fn footprint(&self, width: usize, height: usize) -> BoundingBox {
        let last_row = height as f64 - 0.5;
        let last_col = width as f64 - 0.5;
        let corners = [
            self.forward(-0.5, -0.5),
            self.forward(-0.5, last_col),
            self.forward(last_row, -0.5),
            self.forward(last_row, last_col),
        ];

        let mut bbox = BoundingBox::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for (x, y) in corners {
            bbox.min_lon = bbox.min_lon.min(x);
            bbox.max_lon = bbox.max_lon.max(x);
            bbox.min_lat = bbox.min_lat.min(y);
            bbox.max_lat = bbox.max_lat.max(y);
        }
        bbox
    }
}

/// A geographic bounding box in the raster's native coordinates.
///
/// For geographic rasters the axes are latitude and longitude in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum latitude (southern boundary).
    pub min_lat: f64,
    /// Minimum longitude (western boundary).
    pub min_lon: f64,
    /// Maximum latitude (northern boundary).
    pub max_lat: f64,
    /// Maximum longitude (eastern boundary).
    pub max_lon: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    ///
    /// # Arguments
    ///
    /// * `min_lat` - Southern boundary latitude
    /// * `min_lon` - Western boundary longitude
    /// * `max_lat` - Northern boundary latitude
    /// * `max_lon` - Eastern boundary longitude
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Check whether a coordinate lies inside the box (edges included).
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }

    /// Check whether two boxes overlap.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lat <= other.max_lat
            && self.max_lat >= other.min_lat
            && self.min_lon <= other.max_lon
            && self.max_lon >= other.min_lon
    }
}
