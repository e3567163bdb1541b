//! Exact back-to-front ordering by comparison sort.

use crate::core::Gaussian;
use crate::sort::SortDirection;
use nalgebra::Vector3;
use std::cmp::Ordering;
use std::time::Instant;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Order Gaussian indices by exact distance from `camera_position`.
///
/// Distances are computed once per Gaussian, then the index array is sorted
/// with `f32::total_cmp`, so NaN positions cannot corrupt the sort. Ties are
/// broken arbitrarily. O(N log N): too slow for per-frame use on millions of
/// splats, meant for on-demand re-sorts.
pub fn order_exact(
    gaussians: &[Gaussian],
    camera_position: &Vector3<f32>,
    direction: SortDirection,
) -> Vec<u32> {
    debug_assert!(gaussians.len() <= u32::MAX as usize);
    let start = Instant::now();

    let distances: Vec<f32> = gaussians
        .iter()
        .map(|g| g.distance_to(camera_position))
        .collect();
    let mut order: Vec<u32> = (0..gaussians.len() as u32).collect();

    let compare = |a: &u32, b: &u32| -> Ordering {
        let da = distances[*a as usize];
        let db = distances[*b as usize];
        match direction {
            SortDirection::BackToFront => db.total_cmp(&da),
            SortDirection::FrontToBack => da.total_cmp(&db),
        }
    };

    #[cfg(feature = "rayon")]
    order.par_sort_unstable_by(compare);
    #[cfg(not(feature = "rayon"))]
    order.sort_unstable_by(compare);

    tracing::debug!(
        "Exact sort of {} Gaussians took {:.2} ms",
        order.len(),
        start.elapsed().as_secs_f64() * 1e3
    );
    order
}
