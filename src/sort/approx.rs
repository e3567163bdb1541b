//! Approximate O(N) ordering by bucketed counting sort.
//!
//! Distances are quantized into a fixed number of buckets over
//! `[0, padding × scene diagonal]`, using a square-root remap so that near
//! splats (where ordering errors are most visible) get finer buckets.
//! Splats sharing a bucket are left in an unspecified relative order.

use crate::core::{Gaussian, SceneBounds};
use crate::sort::SortDirection;
use nalgebra::Vector3;
use std::time::Instant;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Default number of distance buckets.
pub const DEFAULT_BUCKET_COUNT: u32 = 65534;

/// Default factor applied to the scene diagonal to get the largest
/// distance that still maps below the last bucket.
pub const DEFAULT_BOUNDS_PADDING: f32 = 1.2;

/// Map a camera distance to its bucket.
///
/// bucket = min(floor(B · sqrt(d / max_dist)), B - 1)
///
/// Distances beyond `max_dist` clamp to the last bucket. With a degenerate
/// range (`max_dist <= 0`) everything at a positive distance goes to the
/// last bucket and everything else (including NaN) to bucket 0.
pub fn bucket_index(distance: f32, max_dist: f32, bucket_count: u32) -> u32 {
    let last = bucket_count.saturating_sub(1);
    if !(max_dist > 0.0) {
        return if distance > 0.0 { last } else { 0 };
    }
    let d_norm = bucket_count as f32 * (distance / max_dist).sqrt();
    if d_norm.is_nan() {
        0
    } else {
        // `as` saturates: negatives to 0, +inf to u32::MAX
        (d_norm as u32).min(last)
    }
}

/// Counting sorter that keeps its scratch buffers between frames.
#[derive(Clone, Debug)]
pub struct ApproxSorter {
    bucket_count: u32,
    bounds_padding: f32,
    keys: Vec<u32>,
    cursors: Vec<u32>,
}

impl Default for ApproxSorter {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKET_COUNT, DEFAULT_BOUNDS_PADDING)
    }
}

impl ApproxSorter {
    /// `bucket_count` is raised to at least 1.
    pub fn new(bucket_count: u32, bounds_padding: f32) -> Self {
        Self {
            bucket_count: bucket_count.max(1),
            bounds_padding,
            keys: Vec::new(),
            cursors: Vec::new(),
        }
    }

    pub fn bucket_count(&self) -> u32 {
        self.bucket_count
    }

    /// Largest distance resolved by the buckets for `bounds`.
    pub fn max_distance(&self, bounds: &SceneBounds) -> f32 {
        self.bounds_padding * bounds.diagonal()
    }

    pub fn order(
        &mut self,
        gaussians: &[Gaussian],
        camera_position: &Vector3<f32>,
        bounds: &SceneBounds,
        direction: SortDirection,
    ) -> Vec<u32> {
        let mut out = Vec::with_capacity(gaussians.len());
        self.order_into(gaussians, camera_position, bounds, direction, &mut out);
        out
    }

    /// Like [`ApproxSorter::order`], writing into a caller-owned buffer.
    pub fn order_into(
        &mut self,
        gaussians: &[Gaussian],
        camera_position: &Vector3<f32>,
        bounds: &SceneBounds,
        direction: SortDirection,
        out: &mut Vec<u32>,
    ) {
        debug_assert!(gaussians.len() <= u32::MAX as usize);
        out.clear();
        if gaussians.is_empty() {
            return;
        }
        let start = Instant::now();

        let max_dist = self.max_distance(bounds);
        let bucket_count = self.bucket_count;
        let last = bucket_count - 1;
        let key_of = |g: &Gaussian| {
            let bucket = bucket_index(g.distance_to(camera_position), max_dist, bucket_count);
            match direction {
                SortDirection::FrontToBack => bucket,
                SortDirection::BackToFront => last - bucket,
            }
        };

        self.keys.clear();
        #[cfg(feature = "rayon")]
        self.keys.par_extend(gaussians.par_iter().map(key_of));
        #[cfg(not(feature = "rayon"))]
        self.keys.extend(gaussians.iter().map(key_of));

        // Histogram
        self.cursors.clear();
        self.cursors.resize(bucket_count as usize, 0);
        for &k in &self.keys {
            self.cursors[k as usize] += 1;
        }

        // Inclusive prefix sum: cursors[k] = end of bucket k
        let mut running = 0u32;
        for c in self.cursors.iter_mut() {
            running += *c;
            *c = running;
        }

        // Scatter, walking backward and filling each bucket from its end.
        out.resize(gaussians.len(), 0);
        for (i, &k) in self.keys.iter().enumerate().rev() {
            let cursor = &mut self.cursors[k as usize];
            *cursor -= 1;
            out[*cursor as usize] = i as u32;
        }

        tracing::debug!(
            "Approximate sort of {} Gaussians into {} buckets took {:.2} ms",
            out.len(),
            bucket_count,
            start.elapsed().as_secs_f64() * 1e3
        );
    }
}

/// One-shot approximate ordering with default bucket count and padding.
pub fn order_approx(
    gaussians: &[Gaussian],
    camera_position: &Vector3<f32>,
    bounds: &SceneBounds,
    direction: SortDirection,
) -> Vec<u32> {
    ApproxSorter::default().order(gaussians, camera_position, bounds, direction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::is_permutation;
    use nalgebra::Matrix3;

    fn at(x: f32, y: f32, z: f32) -> Gaussian {
        Gaussian::new(
            Vector3::new(x, y, z),
            Vector3::new(0.5, 0.5, 0.5),
            1.0,
            Matrix3::identity(),
        )
    }

    fn bounds_of(gaussians: &[Gaussian]) -> SceneBounds {
        crate::core::GaussianCloud::from_gaussians(gaussians.to_vec()).bounds()
    }

    #[test]
    fn test_bucket_index_endpoints() {
        assert_eq!(bucket_index(0.0, 10.0, 100), 0);
        // sqrt(0.25) = 0.5 → bucket 50
        assert_eq!(bucket_index(2.5, 10.0, 100), 50);
        assert_eq!(bucket_index(10.0, 10.0, 100), 99);
        assert_eq!(bucket_index(1e9, 10.0, 100), 99);
        assert_eq!(bucket_index(f32::INFINITY, 10.0, 100), 99);
        assert_eq!(bucket_index(f32::NAN, 10.0, 100), 0);
    }

    #[test]
    fn test_bucket_index_degenerate_range() {
        assert_eq!(bucket_index(0.0, 0.0, 100), 0);
        assert_eq!(bucket_index(3.0, 0.0, 100), 99);
        assert_eq!(bucket_index(3.0, 5.0, 1), 0);
    }

    #[test]
    fn test_bucket_resolution_favours_near_splats() {
        // Equal distance steps span more buckets close to the camera.
        let near = bucket_index(1.0, 100.0, 1000) - bucket_index(0.0, 100.0, 1000);
        let far = bucket_index(100.0, 100.0, 1000) - bucket_index(99.0, 100.0, 1000);
        assert!(near > far);
    }

    #[test]
    fn test_empty_input() {
        let order = order_approx(&[], &Vector3::zeros(), &SceneBounds::default(), SortDirection::BackToFront);
        assert!(order.is_empty());
    }

    #[test]
    fn test_back_to_front_distinct_buckets() {
        let gaussians = vec![at(0.0, 0.0, -2.0), at(0.0, 0.0, -10.0), at(0.0, 0.0, -5.0)];
        let bounds = bounds_of(&gaussians);
        let order = order_approx(&gaussians, &Vector3::zeros(), &bounds, SortDirection::BackToFront);
        assert_eq!(order, vec![1, 2, 0]);

        let order = order_approx(&gaussians, &Vector3::zeros(), &bounds, SortDirection::FrontToBack);
        assert_eq!(order, vec![0, 2, 1]);
    }

    #[test]
    fn test_all_in_one_bucket_is_permutation() {
        let gaussians: Vec<Gaussian> = (0..50).map(|i| at(i as f32 * 1e-3, 0.0, 0.0)).collect();
        let bounds = bounds_of(&gaussians);
        let mut sorter = ApproxSorter::new(1, DEFAULT_BOUNDS_PADDING);
        let order = sorter.order(&gaussians, &Vector3::zeros(), &bounds, SortDirection::BackToFront);
        assert!(is_permutation(&order, gaussians.len()));
    }

    #[test]
    fn test_camera_far_outside_bounds_is_permutation() {
        let gaussians: Vec<Gaussian> = (0..100).map(|i| at(i as f32 * 0.1, 0.0, 0.0)).collect();
        let bounds = bounds_of(&gaussians);
        let camera = Vector3::new(1e6, 1e6, 1e6);
        let order = order_approx(&gaussians, &camera, &bounds, SortDirection::BackToFront);
        assert!(is_permutation(&order, gaussians.len()));
    }

    #[test]
    fn test_scratch_buffers_are_reused() {
        let gaussians: Vec<Gaussian> = (0..10).map(|i| at(i as f32, 0.0, 0.0)).collect();
        let bounds = bounds_of(&gaussians);
        let mut sorter = ApproxSorter::new(16, DEFAULT_BOUNDS_PADDING);

        let first = sorter.order(&gaussians, &Vector3::zeros(), &bounds, SortDirection::BackToFront);
        let second = sorter.order(&gaussians[..4], &Vector3::zeros(), &bounds, SortDirection::BackToFront);
        assert!(is_permutation(&first, 10));
        assert!(is_permutation(&second, 4));
    }

    #[test]
    fn test_degenerate_bounds_single_point() {
        let gaussians = vec![at(1.0, 1.0, 1.0)];
        let bounds = bounds_of(&gaussians);
        let order = order_approx(&gaussians, &Vector3::zeros(), &bounds, SortDirection::BackToFront);
        assert_eq!(order, vec![0]);
    }
}
