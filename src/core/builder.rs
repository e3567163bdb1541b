//! Gaussian construction from per-point attributes.
//!
//! Each row of the attribute table is decoded independently:
//! 1. color   = 0.5 + Y_0^0 · f_dc
//! 2. opacity = sigmoid(opacity)
//! 3. scale   = exp(scale_i)
//! 4. R       = rotation matrix of (rot_0..rot_3)
//! 5. Σ       = (R·S)(R·S)^T with S = diag(scale)

use crate::core::bounds::BoundsTracker;
use crate::core::gaussian::{Gaussian, GaussianCloud};
use crate::core::math::{normalize_quaternion, quaternion_to_matrix, sh_dc_to_color, sigmoid};
use crate::io::AttributeTable;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Attribute columns required to build a Gaussian, in row order.
pub const REQUIRED_COLUMNS: [&str; 14] = [
    "x", "y", "z", "f_dc_0", "f_dc_1", "f_dc_2", "opacity", "scale_0", "scale_1", "scale_2",
    "rot_0", "rot_1", "rot_2", "rot_3",
];

/// Errors raised before any Gaussian is constructed.
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    #[error("missing attribute column '{0}'")]
    MissingColumn(String),

    #[error("column '{column}' has {found} rows, expected {expected}")]
    RowCountMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
}

/// How the four `rot_*` columns map onto quaternion components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuaternionLayout {
    /// rot_0 is the scalar part (layout written by 3DGS training code).
    #[default]
    Wxyz,
    /// rot_3 is the scalar part.
    Xyzw,
}

impl QuaternionLayout {
    /// Reorder raw components into (w, x, y, z).
    pub fn to_wxyz(self, r: [f32; 4]) -> [f32; 4] {
        match self {
            QuaternionLayout::Wxyz => r,
            QuaternionLayout::Xyzw => [r[3], r[0], r[1], r[2]],
        }
    }
}

/// Decoding policy for [`build_row`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    pub quaternion_layout: QuaternionLayout,

    /// Normalize rotations before conversion. A zero quaternion then falls
    /// back to identity. When off, a non-unit quaternion scales Σ.
    pub normalize_rotations: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            quaternion_layout: QuaternionLayout::Wxyz,
            normalize_rotations: true,
        }
    }
}

/// One row of raw attributes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GaussianRow {
    pub position: [f32; 3],
    pub sh_dc: [f32; 3],
    pub opacity_logit: f32,
    pub log_scale: [f32; 3],
    pub rotation: [f32; 4],
}

/// Σ = M·M^T with M = R·diag(scale).
///
/// Symmetric and PSD for any real input.
pub fn covariance_from_scale_rotation(scale: &Vector3<f32>, rotation: &Matrix3<f32>) -> Matrix3<f32> {
    // R·S scales the columns of R
    let m = rotation * Matrix3::from_diagonal(scale);
    m * m.transpose()
}

/// Decode one row into a renderable Gaussian.
pub fn build_row(row: &GaussianRow, options: &BuildOptions) -> Gaussian {
    let [w, x, y, z] = options.quaternion_layout.to_wxyz(row.rotation);
    let rotation = if options.normalize_rotations {
        match normalize_quaternion(w, x, y, z) {
            Some([w, x, y, z]) => quaternion_to_matrix(w, x, y, z),
            None => Matrix3::identity(),
        }
    } else {
        quaternion_to_matrix(w, x, y, z)
    };

    let scale = Vector3::new(
        row.log_scale[0].exp(),
        row.log_scale[1].exp(),
        row.log_scale[2].exp(),
    );

    Gaussian {
        position: Vector3::from(row.position),
        color: sh_dc_to_color(row.sh_dc),
        opacity: sigmoid(row.opacity_logit),
        covariance: covariance_from_scale_rotation(&scale, &rotation),
    }
}

/// Borrowed, validated views of the required columns.
struct Columns<'a> {
    cols: [&'a [f32]; 14],
    rows: usize,
}

impl<'a> Columns<'a> {
    fn resolve(table: &'a AttributeTable) -> Result<Self, BuildError> {
        let mut cols: [&[f32]; 14] = [&[]; 14];
        for (slot, name) in cols.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = table
                .column(name)
                .ok_or_else(|| BuildError::MissingColumn(name.to_string()))?;
        }

        let rows = cols[0].len();
        for (col, name) in cols.iter().zip(REQUIRED_COLUMNS) {
            if col.len() != rows {
                return Err(BuildError::RowCountMismatch {
                    column: name.to_string(),
                    expected: rows,
                    found: col.len(),
                });
            }
        }

        Ok(Self { cols, rows })
    }

    fn row(&self, i: usize) -> GaussianRow {
        let c = &self.cols;
        GaussianRow {
            position: [c[0][i], c[1][i], c[2][i]],
            sh_dc: [c[3][i], c[4][i], c[5][i]],
            opacity_logit: c[6][i],
            log_scale: [c[7][i], c[8][i], c[9][i]],
            rotation: [c[10][i], c[11][i], c[12][i], c[13][i]],
        }
    }
}

/// Builds a [`GaussianCloud`] from an [`AttributeTable`].
#[derive(Clone, Debug, Default)]
pub struct GaussianBuilder {
    options: BuildOptions,
}

impl GaussianBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Construct all Gaussians, or fail before constructing any.
    pub fn build(&self, table: &AttributeTable) -> Result<GaussianCloud, BuildError> {
        let columns = Columns::resolve(table)?;
        let start = Instant::now();

        let (gaussians, tracker) = self.build_rows(&columns);

        let degenerate = gaussians.iter().filter(|g| !g.is_finite()).count();
        if degenerate > 0 {
            tracing::warn!(
                "{} of {} Gaussians have non-finite attributes",
                degenerate,
                gaussians.len()
            );
        }

        let bounds = tracker.get();
        tracing::info!(
            "Built {} Gaussians in {:.1} ms, bounds min={:?} max={:?}",
            gaussians.len(),
            start.elapsed().as_secs_f64() * 1e3,
            bounds.min.as_slice(),
            bounds.max.as_slice()
        );

        Ok(GaussianCloud::from_parts(gaussians, bounds))
    }

    #[cfg(not(feature = "rayon"))]
    fn build_rows(&self, columns: &Columns<'_>) -> (Vec<Gaussian>, BoundsTracker) {
        let mut tracker = BoundsTracker::new();
        let mut gaussians = Vec::with_capacity(columns.rows);
        for i in 0..columns.rows {
            let g = build_row(&columns.row(i), &self.options);
            tracker.update(&g.position);
            gaussians.push(g);
        }
        (gaussians, tracker)
    }

    #[cfg(feature = "rayon")]
    fn build_rows(&self, columns: &Columns<'_>) -> (Vec<Gaussian>, BoundsTracker) {
        let options = &self.options;
        let gaussians: Vec<Gaussian> = (0..columns.rows)
            .into_par_iter()
            .map(|i| build_row(&columns.row(i), options))
            .collect();

        // Per-partition min/max, merged.
        let tracker = gaussians
            .par_iter()
            .fold(BoundsTracker::new, |mut t, g| {
                t.update(&g.position);
                t
            })
            .reduce(BoundsTracker::new, BoundsTracker::merge);

        (gaussians, tracker)
    }
}
