//! Axis-aligned scene bounds over Gaussian centers.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneBounds {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl SceneBounds {
    /// Degenerate box containing a single point.
    pub fn from_point(p: Vector3<f32>) -> Self {
        Self { min: p, max: p }
    }

    /// Length of the box diagonal.
    pub fn diagonal(&self) -> f32 {
        (self.max - self.min).norm()
    }

    pub fn extent(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn center(&self) -> Vector3<f32> {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, p: &Vector3<f32>) -> bool {
        (0..3).all(|i| self.min[i] <= p[i] && p[i] <= self.max[i])
    }

    /// Grow the box to include `p`. NaN components leave that axis as is.
    pub fn expand(&mut self, p: &Vector3<f32>) {
        self.min = self.min.zip_map(p, f32::min);
        self.max = self.max.zip_map(p, f32::max);
    }

    /// Smallest box containing both boxes.
    pub fn merge(&self, other: &SceneBounds) -> SceneBounds {
        SceneBounds {
            min: self.min.zip_map(&other.min, f32::min),
            max: self.max.zip_map(&other.max, f32::max),
        }
    }
}

impl Default for SceneBounds {
    fn default() -> Self {
        Self::from_point(Vector3::zeros())
    }
}

/// Running min/max over positions, seeded by the first point it sees.
///
/// Positions with a NaN or infinite component are not counted.
///
/// Seeding from the first point (rather than ±∞) means an empty cloud still
/// reports a well-defined zero-volume box at the origin.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoundsTracker {
    bounds: Option<SceneBounds>,
}

impl BoundsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, position: &Vector3<f32>) {
        if !position.iter().all(|v| v.is_finite()) {
            return;
        }
        match &mut self.bounds {
            Some(b) => b.expand(position),
            None => self.bounds = Some(SceneBounds::from_point(*position)),
        }
    }

    /// Combine two partial trackers (per-partition reduction).
    pub fn merge(self, other: BoundsTracker) -> BoundsTracker {
        let bounds = match (self.bounds, other.bounds) {
            (Some(a), Some(b)) => Some(a.merge(&b)),
            (a, b) => a.or(b),
        };
        BoundsTracker { bounds }
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    pub fn get(&self) -> SceneBounds {
        self.bounds.unwrap_or_default()
    }
}
