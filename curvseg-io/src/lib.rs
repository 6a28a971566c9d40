//! I/O operations for curvseg
//!
//! This crate provides the exchange-format boundary of the pipeline:
//! reading and writing point clouds as PLY files, and converting raster
//! depth maps into point clouds via pinhole or orthographic projection.

pub mod ply;
pub mod projection;

pub use ply::{PlyReader, PlyWriter};
pub use projection::*;

use curvseg_core::{Point3f, PointCloud, Result};

/// Trait for reading point clouds from files
pub trait PointCloudReader {
    fn read_point_cloud<P: AsRef<std::path::Path>>(path: P) -> Result<PointCloud<Point3f>>;
}

/// Trait for writing point clouds to files
pub trait PointCloudWriter {
    fn write_point_cloud<P: AsRef<std::path::Path>>(
        cloud: &PointCloud<Point3f>,
        path: P,
    ) -> Result<()>;
}

/// Auto-detect format and read a point cloud
///
/// A missing or unreadable file is fatal and propagates to the caller; the
/// interactive session performs no retries.
pub fn read_point_cloud<P: AsRef<std::path::Path>>(path: P) -> Result<PointCloud<Point3f>> {
    let path = path.as_ref();
    match path.extension().and_then(|s| s.to_str()) {
        Some("ply") => ply::PlyReader::read_point_cloud(path),
        _ => Err(curvseg_core::Error::UnsupportedFormat(format!(
            "Unsupported point cloud format: {:?}",
            path.extension()
        ))),
    }
}
