//! Core data structures and traits for curvseg
//!
//! This crate provides the fundamental types used throughout the curvature
//! segmentation pipeline: points, point clouds, colors, and the nearest
//! neighbor search trait implemented by the spatial index.

pub mod point;
pub mod point_cloud;
pub mod traits;
pub mod error;

pub use point::*;
pub use point_cloud::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix3, Point3, Vector3};
