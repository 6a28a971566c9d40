//! Core traits for curvseg

use crate::{point::*, point_cloud::*};

/// Trait for nearest neighbor search functionality
pub trait NearestNeighborSearch {
    /// Find the k nearest neighbors to a query point
    ///
    /// Returns `(index, distance)` pairs in ascending distance order. If `k`
    /// exceeds the number of indexed points the result is clamped to the
    /// available count.
    fn find_k_nearest(&self, query: &Point3f, k: usize) -> Vec<(usize, f32)>;
}

/// Trait for objects with a spatial extent
pub trait Bounded {
    /// Get the axis-aligned bounding box of the object
    fn bounding_box(&self) -> (Point3f, Point3f);

    /// Get the center point of the object
    fn center(&self) -> Point3f {
        let (min, max) = self.bounding_box();
        Point3f::new(
            (min.x + max.x) / 2.0,
            (min.y + max.y) / 2.0,
            (min.z + max.z) / 2.0,
        )
    }
}

impl<T> Bounded for PointCloud<T>
where
    T: Clone + Copy,
    Point3f: From<T>,
{
    fn bounding_box(&self) -> (Point3f, Point3f) {
        if self.is_empty() {
            return (Point3f::origin(), Point3f::origin());
        }

        let first_point = Point3f::from(self.points[0]);
        let mut min = first_point;
        let mut max = first_point;

        for point in &self.points {
            let p = Point3f::from(*point);
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);

            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        (min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bounding_box_and_center() {
        let cloud = PointCloud::from_points(vec![
            Point3f::new(-1.0, 0.0, 2.0),
            Point3f::new(3.0, -2.0, 0.0),
            Point3f::new(1.0, 4.0, -2.0),
        ]);

        let (min, max) = cloud.bounding_box();
        assert_eq!(min, Point3f::new(-1.0, -2.0, -2.0));
        assert_eq!(max, Point3f::new(3.0, 4.0, 2.0));

        let center = cloud.center();
        assert_relative_eq!(center.x, 1.0);
        assert_relative_eq!(center.y, 1.0);
        assert_relative_eq!(center.z, 0.0);
    }

    #[test]
    fn test_bounding_box_empty_cloud() {
        let cloud: PointCloud<Point3f> = PointCloud::new();
        let (min, max) = cloud.bounding_box();
        assert_eq!(min, Point3f::origin());
        assert_eq!(max, Point3f::origin());
    }
}
