//! Raster depth-map to point-cloud projection
//!
//! Converts 2D depth rasters into 3D point clouds, either through a pinhole
//! camera model or as an orthographic height field. Invalid samples
//! (non-positive or NaN depths) are dropped.

use curvseg_core::{Error, Point3f, PointCloud, Result};
use std::path::Path;

/// A single-band floating point depth raster
#[derive(Debug, Clone)]
pub struct DepthMap {
    width: u32,
    height: u32,
    data: Vec<f32>,
}

impl DepthMap {
    /// Wrap raw row-major depth samples
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        if data.len() != (width as usize) * (height as usize) {
            return Err(Error::InvalidData(format!(
                "depth buffer has {} samples, expected {}x{}",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self { width, height, data })
    }

    /// Load a depth map from an image file (first band, 32-bit luma)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let image = image::open(path.as_ref())
            .map_err(|e| Error::InvalidData(format!("failed to read depth raster: {}", e)))?;
        let luma = image.to_luma32f();
        let (width, height) = luma.dimensions();
        Self::new(width, height, luma.into_raw())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Depth sample at pixel (u, v)
    pub fn depth(&self, u: u32, v: u32) -> f32 {
        self.data[v as usize * self.width as usize + u as usize]
    }
}

/// Pinhole camera intrinsics for depth projection
#[derive(Debug, Clone, Copy)]
pub struct PinholeIntrinsics {
    /// Focal length in x, pixels
    pub fx: f32,
    /// Focal length in y, pixels
    pub fy: f32,
    /// Principal point x; image center when `None`
    pub cx: Option<f32>,
    /// Principal point y; image center when `None`
    pub cy: Option<f32>,
    /// Multiplier applied to raw depth samples
    pub depth_scale: f32,
}

impl Default for PinholeIntrinsics {
    fn default() -> Self {
        Self {
            fx: 1000.0,
            fy: 1000.0,
            cx: None,
            cy: None,
            depth_scale: 1.0,
        }
    }
}

/// Project a depth map through a pinhole camera model
///
/// Each pixel (u, v) with positive depth becomes the point
/// `((u - cx) * Z / fx, (v - cy) * Z / fy, Z)` with `Z = depth * scale`.
/// Pixels with non-positive or NaN depth are dropped.
pub fn depth_to_point_cloud(
    depth_map: &DepthMap,
    intrinsics: &PinholeIntrinsics,
) -> PointCloud<Point3f> {
    let cx = intrinsics.cx.unwrap_or(depth_map.width() as f32 / 2.0);
    let cy = intrinsics.cy.unwrap_or(depth_map.height() as f32 / 2.0);

    let mut points = Vec::new();
    for v in 0..depth_map.height() {
        for u in 0..depth_map.width() {
            let z = depth_map.depth(u, v) * intrinsics.depth_scale;
            if z.is_nan() || z <= 0.0 {
                continue;
            }
            let x = (u as f32 - cx) * z / intrinsics.fx;
            let y = (v as f32 - cy) * z / intrinsics.fy;
            points.push(Point3f::new(x, y, z));
        }
    }

    log::debug!(
        "pinhole projection: {}x{} raster -> {} points",
        depth_map.width(),
        depth_map.height(),
        points.len()
    );
    PointCloud::from_points(points)
}

/// Project a depth map as an orthographic height field
///
/// Each pixel (u, v) with a valid depth becomes `(u, v, depth * scale)`.
/// NaN and non-positive depths are dropped.
pub fn height_field_to_point_cloud(depth_map: &DepthMap, scale: f32) -> PointCloud<Point3f> {
    let mut points = Vec::new();
    for v in 0..depth_map.height() {
        for u in 0..depth_map.width() {
            let z = depth_map.depth(u, v) * scale;
            if z.is_nan() || z <= 0.0 {
                continue;
            }
            points.push(Point3f::new(u as f32, v as f32, z));
        }
    }
    PointCloud::from_points(points)
}
