//! Point cloud data structures and functionality

use crate::point::*;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// A generic point cloud container
///
/// Points are stored in insertion order. The raw geometry variant is
/// `PointCloud<Point3f>`; display geometry carries an inline color per point
/// as `PointCloud<ColoredPoint3f>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointCloud<T> {
    pub points: Vec<T>,
}

/// A point cloud with 3D points
pub type PointCloud3f = PointCloud<Point3f>;

/// A point cloud with colored points
pub type ColoredPointCloud3f = PointCloud<ColoredPoint3f>;

impl<T> PointCloud<T> {
    /// Create a new empty point cloud
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Create a new point cloud with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Create a point cloud from a vector of points
    pub fn from_points(points: Vec<T>) -> Self {
        Self { points }
    }

    /// Get the number of points in the cloud
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Add a point to the cloud
    pub fn push(&mut self, point: T) {
        self.points.push(point);
    }

    /// Get an iterator over the points
    pub fn iter(&self) -> std::slice::Iter<T> {
        self.points.iter()
    }

    /// Get a mutable iterator over the points
    pub fn iter_mut(&mut self) -> std::slice::IterMut<T> {
        self.points.iter_mut()
    }
}

impl<T> Default for PointCloud<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for PointCloud<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl<T> IndexMut<usize> for PointCloud<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.points[index]
    }
}

impl<T> IntoIterator for PointCloud<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a PointCloud<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl<T> FromIterator<T> for PointCloud<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            points: Vec::from_iter(iter),
        }
    }
}

impl PointCloud<Point3f> {
    /// Convert to a colored cloud, assigning the same color to every point
    pub fn with_uniform_color(&self, color: Rgb) -> PointCloud<ColoredPoint3f> {
        PointCloud::from_points(
            self.points
                .iter()
                .map(|&position| ColoredPoint3f { position, color })
                .collect(),
        )
    }
}

impl PointCloud<ColoredPoint3f> {
    /// Iterator over the positions, ignoring colors
    pub fn positions(&self) -> impl Iterator<Item = &Point3f> {
        self.points.iter().map(|p| &p.position)
    }

    /// Copy of the full color sequence, parallel to the points
    pub fn colors(&self) -> Vec<Rgb> {
        self.points.iter().map(|p| p.color).collect()
    }
}
