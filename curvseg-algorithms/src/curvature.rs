//! Local surface variation ("curvature") estimation
//!
//! For every point, the spread of its k-nearest neighborhood is summarized
//! by the eigenvalues of the neighborhood covariance matrix. The ratio of
//! the smallest eigenvalue to the eigenvalue sum is near zero for locally
//! planar neighborhoods and approaches 1/3 for isotropic ones, making it a
//! cheap proxy for local roughness.

use crate::neighbor::NeighborIndex;
use curvseg_core::{Error, Point3f, PointCloud, Result};
use nalgebra::{Matrix3, Vector3};
use rayon::prelude::*;
use std::ops::Index;

/// Eigenvalue sums below this are treated as degenerate neighborhoods
/// (duplicate or colinear points) and map to curvature zero.
const DEGENERATE_EIGENVALUE_SUM: f64 = 1e-9;

/// An immutable per-point curvature field
///
/// Indexed 0..N-1 over the cloud it was estimated from. Values always lie
/// in `[0, 1/3]`. The field is computed once per session; threshold changes
/// never require recomputation.
#[derive(Debug, Clone)]
pub struct CurvatureField {
    values: Vec<f32>,
}

impl CurvatureField {
    /// Number of per-point values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the field is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The full value slice, parallel to the source cloud
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Largest curvature in the field, 0.0 for an empty field
    pub fn max(&self) -> f32 {
        self.values.iter().copied().fold(0.0, f32::max)
    }
}

impl Index<usize> for CurvatureField {
    type Output = f32;

    fn index(&self, index: usize) -> &Self::Output {
        &self.values[index]
    }
}

/// Closed-form eigenvalues of a 3x3 symmetric matrix, ascending
///
/// Uses the trigonometric method for the characteristic cubic, which is
/// exact for symmetric matrices and avoids a general dense eigensolver.
fn symmetric_eigenvalues(m: &Matrix3<f64>) -> [f64; 3] {
    let p1 = m[(0, 1)].powi(2) + m[(0, 2)].powi(2) + m[(1, 2)].powi(2);
    if p1 == 0.0 {
        // Already diagonal.
        let mut eig = [m[(0, 0)], m[(1, 1)], m[(2, 2)]];
        eig.sort_by(f64::total_cmp);
        return eig;
    }

    let q = m.trace() / 3.0;
    let p2 = (m[(0, 0)] - q).powi(2)
        + (m[(1, 1)] - q).powi(2)
        + (m[(2, 2)] - q).powi(2)
        + 2.0 * p1;
    let p = (p2 / 6.0).sqrt();
    let b = (m - Matrix3::identity() * q) / p;
    // Rounding can push the half-determinant slightly outside [-1, 1].
    let r = (b.determinant() / 2.0).clamp(-1.0, 1.0);
    let phi = r.acos() / 3.0;

    let two_thirds_pi = 2.0 * std::f64::consts::FRAC_PI_3;
    let largest = q + 2.0 * p * phi.cos();
    let smallest = q + 2.0 * p * (phi + two_thirds_pi).cos();
    let middle = 3.0 * q - largest - smallest;

    let mut eig = [smallest, middle, largest];
    eig.sort_by(f64::total_cmp);
    eig
}

/// Curvature of a single neighborhood given its member coordinates
fn neighborhood_curvature(neighbors: &[Vector3<f64>]) -> f32 {
    if neighbors.is_empty() {
        return 0.0;
    }

    let n = neighbors.len() as f64;
    let centroid: Vector3<f64> = neighbors.iter().sum::<Vector3<f64>>() / n;

    let mut cov = Matrix3::<f64>::zeros();
    for p in neighbors {
        let d = p - centroid;
        cov += d * d.transpose();
    }
    cov /= n;

    let eig = symmetric_eigenvalues(&cov);
    // The covariance matrix is positive semi-definite; negative eigenvalues
    // are rounding noise.
    let l0 = eig[0].max(0.0);
    let l1 = eig[1].max(0.0);
    let l2 = eig[2].max(0.0);
    let sum = l0 + l1 + l2;

    if sum > DEGENERATE_EIGENVALUE_SUM {
        ((l0 / sum) as f32).clamp(0.0, 1.0 / 3.0)
    } else {
        0.0
    }
}

/// Estimate per-point curvature over a point cloud
///
/// For each point, queries the `k` nearest indexed points (the point itself
/// is a member of the index, so it participates in its own neighborhood at
/// distance zero) and computes the smallest-eigenvalue ratio of the
/// neighborhood covariance. `k` larger than the indexed count is clamped.
///
/// This is the expensive one-shot stage of the pipeline: O(N * k) neighbor
/// lookups plus O(N) constant-size eigen-decompositions, parallelized over
/// points.
///
/// # Arguments
/// * `cloud` - The cloud the index was built from
/// * `index` - Neighbor index over exactly the points of `cloud`
/// * `k` - Neighborhood size, must be positive
///
/// # Returns
/// * `Result<CurvatureField>` - One value in `[0, 1/3]` per point
pub fn estimate_curvature(
    cloud: &PointCloud<Point3f>,
    index: &NeighborIndex,
    k: usize,
) -> Result<CurvatureField> {
    if k == 0 {
        return Err(Error::Config("neighborhood size k must be positive".to_string()));
    }
    if index.len() != cloud.len() {
        return Err(Error::Algorithm(format!(
            "neighbor index covers {} points but cloud has {}",
            index.len(),
            cloud.len()
        )));
    }

    let values: Vec<f32> = cloud
        .points
        .par_iter()
        .map(|point| {
            let neighbors: Vec<Vector3<f64>> = index
                .k_nearest(point, k)
                .into_iter()
                .map(|(idx, _)| {
                    let p = &cloud.points[idx];
                    Vector3::new(p.x as f64, p.y as f64, p.z as f64)
                })
                .collect();
            neighborhood_curvature(&neighbors)
        })
        .collect();

    log::debug!(
        "estimate_curvature: {} points, k={}, max curvature {:.6}",
        values.len(),
        k,
        values.iter().copied().fold(0.0, f32::max)
    );

    Ok(CurvatureField { values })
}
