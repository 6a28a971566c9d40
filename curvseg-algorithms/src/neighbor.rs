//! Static nearest neighbor index
//!
//! A balanced kd-tree over a fixed set of points. The tree is built once
//! from the downsampled cloud and queried many times during curvature
//! estimation; it is never mutated after construction.

use curvseg_core::{NearestNeighborSearch, Point3f};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A candidate neighbor held in the bounded max-heap during a query.
///
/// Ordering compares squared distance first, then index, so that equidistant
/// candidates are kept and reported in ascending index order.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    dist_sq: f32,
    index: u32,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist_sq
            .total_cmp(&other.dist_sq)
            .then(self.index.cmp(&other.index))
    }
}

/// A static kd-tree index over 3D points
///
/// The tree uses an implicit layout: `order` is a permutation of the point
/// indices where every subtree occupies a contiguous range and its root sits
/// at the range midpoint. Splitting axes cycle with depth.
#[derive(Debug, Clone)]
pub struct NeighborIndex {
    points: Vec<Point3f>,
    order: Vec<u32>,
}

impl NeighborIndex {
    /// Build an index over the given points
    ///
    /// Construction is O(N log N); the input order is irrelevant to query
    /// results.
    pub fn build(points: &[Point3f]) -> Self {
        let points = points.to_vec();
        let mut order: Vec<u32> = (0..points.len() as u32).collect();

        fn build_range(points: &[Point3f], order: &mut [u32], depth: usize) {
            if order.len() <= 1 {
                return;
            }
            let axis = depth % 3;
            let mid = order.len() / 2;
            // Ties on the split coordinate are broken by index so the layout
            // is deterministic for duplicate points.
            order.select_nth_unstable_by(mid, |&a, &b| {
                points[a as usize][axis]
                    .total_cmp(&points[b as usize][axis])
                    .then(a.cmp(&b))
            });
            let (left, rest) = order.split_at_mut(mid);
            build_range(points, left, depth + 1);
            build_range(points, &mut rest[1..], depth + 1);
        }

        build_range(&points, &mut order, 0);
        Self { points, order }
    }

    /// Number of indexed points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Find the `k` nearest indexed points to `query`
    ///
    /// Returns `(index, distance)` pairs sorted by ascending distance, ties
    /// broken by ascending index. `k` larger than the indexed count is
    /// clamped to the available points. A point coincident with the query
    /// (including the query point itself when it is a member of the indexed
    /// set) is reported at distance zero.
    pub fn k_nearest(&self, query: &Point3f, k: usize) -> Vec<(usize, f32)> {
        let k = k.min(self.points.len());
        if k == 0 {
            return Vec::new();
        }

        let mut heap: BinaryHeap<Candidate> = BinaryHeap::with_capacity(k + 1);
        self.search(0, self.order.len(), 0, query, k, &mut heap);

        let mut result: Vec<Candidate> = heap.into_vec();
        result.sort_unstable();
        result
            .into_iter()
            .map(|c| (c.index as usize, c.dist_sq.sqrt()))
            .collect()
    }

    fn search(
        &self,
        lo: usize,
        hi: usize,
        depth: usize,
        query: &Point3f,
        k: usize,
        heap: &mut BinaryHeap<Candidate>,
    ) {
        if lo >= hi {
            return;
        }

        let mid = lo + (hi - lo) / 2;
        let index = self.order[mid];
        let point = &self.points[index as usize];
        let dist_sq = (point - query).norm_squared();

        let candidate = Candidate { dist_sq, index };
        if heap.len() < k {
            heap.push(candidate);
        } else if let Some(worst) = heap.peek() {
            if candidate < *worst {
                heap.pop();
                heap.push(candidate);
            }
        }

        let axis = depth % 3;
        let diff = query[axis] - point[axis];
        let (near, far) = if diff < 0.0 {
            ((lo, mid), (mid + 1, hi))
        } else {
            ((mid + 1, hi), (lo, mid))
        };

        self.search(near.0, near.1, depth + 1, query, k, heap);

        // The far half can only contribute if the splitting plane is closer
        // than the current worst candidate (or the heap is not full yet).
        let plane_dist_sq = diff * diff;
        let must_visit = heap.len() < k
            || heap.peek().map_or(true, |worst| plane_dist_sq <= worst.dist_sq);
        if must_visit {
            self.search(far.0, far.1, depth + 1, query, k, heap);
        }
    }
}

impl NearestNeighborSearch for NeighborIndex {
    fn find_k_nearest(&self, query: &Point3f, k: usize) -> Vec<(usize, f32)> {
        self.k_nearest(query, k)
    }
}
