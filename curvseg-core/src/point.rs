//! Point types and related functionality

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// An 8-bit RGB color triple
pub type Rgb = [u8; 3];

/// A point with color information
///
/// Storing the color inline keeps the color sequence parallel to the point
/// sequence by construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct ColoredPoint3f {
    pub position: Point3f,
    pub color: Rgb,
}

impl ColoredPoint3f {
    pub fn new(position: Point3f, color: Rgb) -> Self {
        Self { position, color }
    }
}

impl Default for ColoredPoint3f {
    fn default() -> Self {
        Self {
            position: Point3f::origin(),
            color: [255, 255, 255],
        }
    }
}

impl From<ColoredPoint3f> for Point3f {
    fn from(point: ColoredPoint3f) -> Self {
        point.position
    }
}
