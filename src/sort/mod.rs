//! Visibility ordering: which splat to draw first.
//!
//! Two interchangeable strategies produce a permutation of `[0, N)`:
//! - `Exact`: comparison sort on true camera distance, O(N log N)
//! - `Approximate`: bucketed counting sort, O(N), intended for every frame
//!
//! The permutation is recomputed wholesale on each request and handed to the
//! renderer through [`SharedOrder`].

mod approx;
mod exact;
mod shared;
mod worker;

pub use approx::{
    bucket_index, order_approx, ApproxSorter, DEFAULT_BOUNDS_PADDING, DEFAULT_BUCKET_COUNT,
};
pub use exact::order_exact;
pub use shared::{OrderSnapshot, SharedOrder};
pub use worker::SortWorker;

use crate::core::{Gaussian, GaussianCloud, SceneBounds, Viewpoint};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which ordering algorithm to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortStrategy {
    Exact,
    #[default]
    Approximate,
}

impl SortStrategy {
    /// The other strategy.
    pub fn toggle(self) -> Self {
        match self {
            SortStrategy::Exact => SortStrategy::Approximate,
            SortStrategy::Approximate => SortStrategy::Exact,
        }
    }
}

impl fmt::Display for SortStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortStrategy::Exact => write!(f, "exact"),
            SortStrategy::Approximate => write!(f, "approximate"),
        }
    }
}

impl FromStr for SortStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exact" => Ok(SortStrategy::Exact),
            "approximate" | "approx" => Ok(SortStrategy::Approximate),
            other => Err(format!("unknown sort strategy '{}'", other)),
        }
    }
}

/// Which end of the order is drawn first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Farthest first, for back-to-front "over" blending.
    #[default]
    BackToFront,
    /// Nearest first, for front-to-back "under" blending.
    FrontToBack,
}

/// Ordering settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortConfig {
    pub strategy: SortStrategy,
    pub direction: SortDirection,
    pub bucket_count: u32,
    pub bounds_padding: f32,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            strategy: SortStrategy::Approximate,
            direction: SortDirection::BackToFront,
            bucket_count: DEFAULT_BUCKET_COUNT,
            bounds_padding: DEFAULT_BOUNDS_PADDING,
        }
    }
}

/// Strategy dispatch plus the state the approximate sorter reuses.
#[derive(Clone, Debug)]
pub struct VisibilitySorter {
    strategy: SortStrategy,
    direction: SortDirection,
    bounds: SceneBounds,
    approx: ApproxSorter,
}

impl VisibilitySorter {
    pub fn new(config: &SortConfig, bounds: SceneBounds) -> Self {
        Self {
            strategy: config.strategy,
            direction: config.direction,
            bounds,
            approx: ApproxSorter::new(config.bucket_count, config.bounds_padding),
        }
    }

    /// Sorter calibrated to the bounds of `cloud`.
    pub fn for_cloud(cloud: &GaussianCloud, config: &SortConfig) -> Self {
        Self::new(config, cloud.bounds())
    }

    pub fn strategy(&self) -> SortStrategy {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: SortStrategy) {
        self.strategy = strategy;
    }

    /// Switch strategy and return the new one.
    pub fn toggle_strategy(&mut self) -> SortStrategy {
        self.strategy = self.strategy.toggle();
        self.strategy
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn bounds(&self) -> SceneBounds {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: SceneBounds) {
        self.bounds = bounds;
    }

    /// Compute a fresh draw order for `viewpoint`.
    pub fn compute_order<V>(&mut self, gaussians: &[Gaussian], viewpoint: &V) -> Vec<u32>
    where
        V: Viewpoint + ?Sized,
    {
        let eye = viewpoint.position();
        match self.strategy {
            SortStrategy::Exact => order_exact(gaussians, &eye, self.direction),
            SortStrategy::Approximate => {
                self.approx.order(gaussians, &eye, &self.bounds, self.direction)
            }
        }
    }
}

/// True when `order` contains every index in `[0, n)` exactly once.
pub fn is_permutation(order: &[u32], n: usize) -> bool {
    if order.len() != n {
        return false;
    }
    let mut seen = vec![false; n];
    for &i in order {
        match seen.get_mut(i as usize) {
            Some(s) if !*s => *s = true,
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Camera;
    use nalgebra::{Matrix3, Vector3};

    fn cloud() -> GaussianCloud {
        let gaussians = [-2.0f32, -10.0, -5.0]
            .iter()
            .map(|z| {
                Gaussian::new(
                    Vector3::new(0.0, 0.0, *z),
                    Vector3::new(0.5, 0.5, 0.5),
                    1.0,
                    Matrix3::identity(),
                )
            })
            .collect();
        GaussianCloud::from_gaussians(gaussians)
    }

    #[test]
    fn test_strategies_agree_on_separated_points() {
        let cloud = cloud();
        let camera = Camera::default();
        let mut sorter = VisibilitySorter::for_cloud(&cloud, &SortConfig::default());

        let approx = sorter.compute_order(cloud.as_slice(), &camera);
        assert_eq!(sorter.toggle_strategy(), SortStrategy::Exact);
        let exact = sorter.compute_order(cloud.as_slice(), &camera);

        assert_eq!(approx, vec![1, 2, 0]);
        assert_eq!(exact, approx);
    }

    #[test]
    fn test_front_to_back_config() {
        let cloud = cloud();
        let config = SortConfig {
            strategy: SortStrategy::Exact,
            direction: SortDirection::FrontToBack,
            ..Default::default()
        };
        let mut sorter = VisibilitySorter::for_cloud(&cloud, &config);
        let order = sorter.compute_order(cloud.as_slice(), &Vector3::zeros());
        assert_eq!(order, vec![0, 2, 1]);
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("exact".parse::<SortStrategy>(), Ok(SortStrategy::Exact));
        assert_eq!("Approx".parse::<SortStrategy>(), Ok(SortStrategy::Approximate));
        assert!("bogus".parse::<SortStrategy>().is_err());
        assert_eq!(SortStrategy::Exact.to_string(), "exact");
        assert_eq!(SortStrategy::Exact.toggle(), SortStrategy::Approximate);
    }

    #[test]
    fn test_sort_config_json() {
        let config: SortConfig =
            serde_json::from_str(r#"{ "strategy": "exact", "direction": "front_to_back" }"#).unwrap();
        assert_eq!(config.strategy, SortStrategy::Exact);
        assert_eq!(config.direction, SortDirection::FrontToBack);
        assert_eq!(config.bucket_count, DEFAULT_BUCKET_COUNT);
    }

    #[test]
    fn test_is_permutation() {
        assert!(is_permutation(&[], 0));
        assert!(is_permutation(&[2, 0, 1], 3));
        assert!(!is_permutation(&[0, 0, 1], 3));
        assert!(!is_permutation(&[0, 1, 3], 3));
        assert!(!is_permutation(&[0, 1], 3));
    }
}
