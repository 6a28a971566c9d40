//! # curvseg Algorithms
//!
//! The batch stages of the curvature segmentation pipeline:
//! voxel downsampling, nearest neighbor indexing, PCA curvature estimation,
//! and threshold-based region classification.
//!
//! Downsampling, index construction and curvature estimation each run once
//! per session; only [`classify`] and [`apply_region_colors`] are cheap
//! enough to rerun on every threshold change.

pub mod downsample;
pub mod neighbor;
pub mod curvature;
pub mod classify;

// Re-export commonly used items
pub use downsample::*;
pub use neighbor::*;
pub use curvature::*;
pub use classify::*;
