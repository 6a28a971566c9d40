//! Threshold-based region classification
//!
//! A pure function of the curvature field and the threshold, cheap enough
//! to rerun on every slider change inside the interactive loop. No neighbor
//! search happens here.

use crate::curvature::CurvatureField;
use curvseg_core::{ColoredPoint3f, PointCloud, Rgb};

/// Color assigned to smooth regions (green)
pub const SMOOTH_COLOR: Rgb = [0, 255, 0];

/// Color assigned to rough regions (red)
pub const ROUGH_COLOR: Rgb = [255, 0, 0];

/// Per-point region label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionLabel {
    Smooth,
    Rough,
}

impl RegionLabel {
    /// The fixed display color for this label
    pub fn color(self) -> Rgb {
        match self {
            RegionLabel::Smooth => SMOOTH_COLOR,
            RegionLabel::Rough => ROUGH_COLOR,
        }
    }
}

/// Classify every point as smooth or rough
///
/// A point is `Smooth` iff its curvature is less than or equal to `tau`
/// (inclusive), `Rough` otherwise. Deterministic and monotone in `tau`:
/// raising the threshold can only move points from rough to smooth.
pub fn classify(curvatures: &CurvatureField, tau: f32) -> Vec<RegionLabel> {
    curvatures
        .values()
        .iter()
        .map(|&c| {
            if c <= tau {
                RegionLabel::Smooth
            } else {
                RegionLabel::Rough
            }
        })
        .collect()
}

/// Rewrite the full color sequence of a colored cloud from the curvature
/// field and threshold
///
/// O(N); the cloud's positions are untouched.
///
/// # Panics
/// Panics if the field length differs from the cloud length; both are
/// derived from the same downsampled cloud so a mismatch is a programming
/// error.
pub fn apply_region_colors(
    cloud: &mut PointCloud<ColoredPoint3f>,
    curvatures: &CurvatureField,
    tau: f32,
) {
    assert_eq!(
        cloud.len(),
        curvatures.len(),
        "curvature field length must match cloud length"
    );

    for (point, &curvature) in cloud.iter_mut().zip(curvatures.values()) {
        point.color = if curvature <= tau {
            SMOOTH_COLOR
        } else {
            ROUGH_COLOR
        };
    }
}
