//! Voxel grid downsampling

use curvseg_core::{Error, Point3f, PointCloud, Result, Vector3f};
use std::collections::HashMap;

/// Voxel grid downsampling
///
/// Reduces the density of a point cloud by bucketing points into an axis
/// aligned grid of cubic cells and emitting one representative point per
/// occupied cell. The representative is the centroid of the cell's points,
/// which makes the output independent of insertion order.
///
/// The output ordering is unspecified; downstream stages must not depend
/// on it.
///
/// # Arguments
/// * `cloud` - Input point cloud
/// * `voxel_size` - Edge length of each voxel cube, must be positive
///
/// # Returns
/// * `Result<PointCloud<Point3f>>` - Downsampled point cloud
///
/// # Example
/// ```rust
/// use curvseg_core::{PointCloud, Point3f};
/// use curvseg_algorithms::voxel_downsample;
///
/// fn main() -> curvseg_core::Result<()> {
///     let cloud = PointCloud::from_points(vec![
///         Point3f::new(0.0, 0.0, 0.0),
///         Point3f::new(0.1, 0.0, 0.0),
///         Point3f::new(0.0, 0.1, 0.0),
///         Point3f::new(3.0, 0.0, 0.0),
///     ]);
///
///     let downsampled = voxel_downsample(&cloud, 0.5)?;
///     assert_eq!(downsampled.len(), 2);
///     Ok(())
/// }
/// ```
pub fn voxel_downsample(cloud: &PointCloud<Point3f>, voxel_size: f32) -> Result<PointCloud<Point3f>> {
    if voxel_size <= 0.0 {
        return Err(Error::Config(format!(
            "voxel_size must be positive, got {}",
            voxel_size
        )));
    }

    if cloud.is_empty() {
        return Ok(PointCloud::new());
    }

    // The grid is anchored at the coordinate origin. A data-dependent anchor
    // (e.g. the bounding box minimum) would shift the cell boundaries between
    // passes, so re-downsampling an already downsampled cloud could merge
    // centroids that sit in adjacent cells.
    let cell_of = |point: &Point3f| -> (i64, i64, i64) {
        let x = (point.x / voxel_size).floor() as i64;
        let y = (point.y / voxel_size).floor() as i64;
        let z = (point.z / voxel_size).floor() as i64;
        (x, y, z)
    };

    // Accumulate a running sum and count per occupied cell.
    let mut cells: HashMap<(i64, i64, i64), (Vector3f, usize)> = HashMap::new();

    for point in cloud.iter() {
        let entry = cells.entry(cell_of(point)).or_insert((Vector3f::zeros(), 0));
        entry.0 += point.coords;
        entry.1 += 1;
    }

    let representatives: Vec<Point3f> = cells
        .values()
        .map(|(sum, count)| Point3f::from(sum / *count as f32))
        .collect();

    log::debug!(
        "voxel_downsample: {} points -> {} cells (voxel_size {})",
        cloud.len(),
        representatives.len(),
        voxel_size
    );

    Ok(PointCloud::from_points(representatives))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sorted_points(cloud: &PointCloud<Point3f>) -> Vec<Point3f> {
        let mut points = cloud.points.clone();
        points.sort_by(|a, b| {
            (a.x, a.y, a.z)
                .partial_cmp(&(b.x, b.y, b.z))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        points
    }

    #[test]
    fn test_downsample_reduces_cardinality() {
        let mut cloud = PointCloud::new();
        for i in 0..100 {
            let t = i as f32 * 0.01;
            cloud.push(Point3f::new(t, t * 0.5, 0.0));
        }

        let downsampled = voxel_downsample(&cloud, 0.25).unwrap();
        assert!(downsampled.len() <= cloud.len());
        assert!(!downsampled.is_empty());
    }

    #[test]
    fn test_downsample_centroid_policy() {
        // Two points in the same cell collapse to their midpoint.
        let cloud = PointCloud::from_points(vec![
            Point3f::new(0.1, 0.0, 0.0),
            Point3f::new(0.3, 0.0, 0.0),
        ]);

        let downsampled = voxel_downsample(&cloud, 1.0).unwrap();
        assert_eq!(downsampled.len(), 1);
        assert_relative_eq!(downsampled[0].x, 0.2, epsilon = 1e-6);
        assert_relative_eq!(downsampled[0].y, 0.0);
        assert_relative_eq!(downsampled[0].z, 0.0);
    }

    #[test]
    fn test_downsample_idempotent_on_separated_points() {
        // Points spaced at least two cells apart survive downsampling
        // unchanged, so a second pass is a no-op up to ordering.
        let cloud = PointCloud::from_points(vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(2.5, 0.0, 0.0),
            Point3f::new(0.0, 5.0, 0.0),
            Point3f::new(0.0, 0.0, 7.5),
        ]);

        let once = voxel_downsample(&cloud, 1.0).unwrap();
        let twice = voxel_downsample(&once, 1.0).unwrap();

        let a = sorted_points(&once);
        let b = sorted_points(&twice);
        assert_eq!(a.len(), b.len());
        for (p, q) in a.iter().zip(b.iter()) {
            assert_relative_eq!(p.x, q.x, epsilon = 1e-6);
            assert_relative_eq!(p.y, q.y, epsilon = 1e-6);
            assert_relative_eq!(p.z, q.z, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_downsample_idempotent_on_adjacent_cells() {
        // Occupied cells touching along a face are the worst case for
        // anchoring: the centroids 0.45 and 1.1 land in the origin-anchored
        // cells 0 and 1 and must stay distinct through a second pass.
        let cloud = PointCloud::from_points(vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(0.9, 0.0, 0.0),
            Point3f::new(1.1, 0.0, 0.0),
        ]);

        let once = voxel_downsample(&cloud, 1.0).unwrap();
        let a = sorted_points(&once);
        assert_eq!(a.len(), 2);
        assert_relative_eq!(a[0].x, 0.45, epsilon = 1e-6);
        assert_relative_eq!(a[1].x, 1.1, epsilon = 1e-6);

        let twice = voxel_downsample(&once, 1.0).unwrap();
        let b = sorted_points(&twice);
        assert_eq!(b.len(), 2);
        for (p, q) in a.iter().zip(b.iter()) {
            assert_relative_eq!(p.x, q.x, epsilon = 1e-6);
            assert_relative_eq!(p.y, q.y, epsilon = 1e-6);
            assert_relative_eq!(p.z, q.z, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_downsample_negative_coordinates() {
        // floor keeps cells consistent across the origin: -0.1 and 0.1 are
        // one cell apart, not merged.
        let cloud = PointCloud::from_points(vec![
            Point3f::new(-0.1, 0.0, 0.0),
            Point3f::new(0.1, 0.0, 0.0),
        ]);

        let downsampled = voxel_downsample(&cloud, 1.0).unwrap();
        assert_eq!(downsampled.len(), 2);
    }

    #[test]
    fn test_downsample_empty_cloud() {
        let cloud: PointCloud<Point3f> = PointCloud::new();
        let downsampled = voxel_downsample(&cloud, 1.0).unwrap();
        assert!(downsampled.is_empty());
    }

    #[test]
    fn test_downsample_rejects_non_positive_voxel_size() {
        let cloud = PointCloud::from_points(vec![Point3f::new(0.0, 0.0, 0.0)]);
        assert!(voxel_downsample(&cloud, 0.0).is_err());
        assert!(voxel_downsample(&cloud, -1.0).is_err());
    }
}
