//! Scale anisotropy statistics.
//!
//! For each splat the three world-space scales are sorted and divided by the
//! largest, giving two ratios in (0, 1]:
//! - `min_ratio` near 0 with `mid_ratio` near 1: a flat disc
//! - both near 0: a needle
//! - both near 1: a sphere
//!
//! Useful for checking what a reconstruction actually produced before
//! tuning the renderer.

use crate::core::BuildError;
use crate::io::AttributeTable;
use std::io::Write;

/// Scale ratios of one splat, relative to its largest axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleAnisotropy {
    pub min_ratio: f32,
    pub mid_ratio: f32,
}

impl ScaleAnisotropy {
    /// Placeholder for a splat whose scales give no usable ratio.
    pub const UNUSABLE: ScaleAnisotropy = ScaleAnisotropy {
        min_ratio: f32::NAN,
        mid_ratio: f32::NAN,
    };

    pub fn is_usable(&self) -> bool {
        self.min_ratio.is_finite() && self.mid_ratio.is_finite()
    }
}

/// Anisotropy of a splat from its log-scales.
///
/// Returns `None` when the largest scale is zero or not finite.
pub fn scale_anisotropy(log_scale: [f32; 3]) -> Option<ScaleAnisotropy> {
    let mut s = log_scale.map(|v| v.exp().abs());
    s.sort_by(f32::total_cmp);
    let [min, mid, max] = s;
    if !(max.is_finite() && max > 0.0) {
        return None;
    }
    Some(ScaleAnisotropy {
        min_ratio: min / max,
        mid_ratio: mid / max,
    })
}

/// Anisotropy of every row, in row order.
///
/// Rows whose scales give no usable ratio yield [`ScaleAnisotropy::UNUSABLE`],
/// so entry `i` always belongs to vertex `i`.
pub fn analyze_scales(table: &AttributeTable) -> Result<Vec<ScaleAnisotropy>, BuildError> {
    let mut cols: [&[f32]; 3] = [&[]; 3];
    for (slot, name) in cols.iter_mut().zip(["scale_0", "scale_1", "scale_2"]) {
        *slot = table
            .column(name)
            .ok_or_else(|| BuildError::MissingColumn(name.to_string()))?;
    }
    let rows = cols[0].len();
    for (col, name) in cols.iter().zip(["scale_0", "scale_1", "scale_2"]) {
        if col.len() != rows {
            return Err(BuildError::RowCountMismatch {
                column: name.to_string(),
                expected: rows,
                found: col.len(),
            });
        }
    }

    let stats: Vec<ScaleAnisotropy> = (0..rows)
        .map(|i| {
            scale_anisotropy([cols[0][i], cols[1][i], cols[2][i]])
                .unwrap_or(ScaleAnisotropy::UNUSABLE)
        })
        .collect();
    let unusable = stats.iter().filter(|s| !s.is_usable()).count();
    if unusable > 0 {
        tracing::warn!("{} of {} splats have unusable scales", unusable, rows);
    }
    Ok(stats)
}

/// Aggregate view of a set of [`ScaleAnisotropy`] values.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnisotropySummary {
    /// Usable entries the summary is computed over
    pub count: usize,
    pub mean_min_ratio: f32,
    pub mean_mid_ratio: f32,
    /// Share of splats with `min_ratio` below the threshold but not `mid_ratio`
    pub flat_fraction: f32,
    /// Share of splats with both ratios below the threshold
    pub needle_fraction: f32,
}

/// Unusable entries are left out.
pub fn summarize(stats: &[ScaleAnisotropy], threshold: f32) -> AnisotropySummary {
    let usable: Vec<&ScaleAnisotropy> = stats.iter().filter(|s| s.is_usable()).collect();
    if usable.is_empty() {
        return AnisotropySummary::default();
    }
    let n = usable.len() as f32;
    let (mut sum_min, mut sum_mid) = (0.0f64, 0.0f64);
    let (mut flat, mut needle) = (0usize, 0usize);
    for s in &usable {
        sum_min += s.min_ratio as f64;
        sum_mid += s.mid_ratio as f64;
        match (s.min_ratio < threshold, s.mid_ratio < threshold) {
            (true, true) => needle += 1,
            (true, false) => flat += 1,
            _ => {}
        }
    }
    AnisotropySummary {
        count: usable.len(),
        mean_min_ratio: (sum_min / usable.len() as f64) as f32,
        mean_mid_ratio: (sum_mid / usable.len() as f64) as f32,
        flat_fraction: flat as f32 / n,
        needle_fraction: needle as f32 / n,
    }
}

/// Long-format CSV: a `value,kind` header, then a `min` and a `mid` row per
/// splat. Unusable entries are written as `NaN`.
pub fn write_csv<W: Write>(mut writer: W, stats: &[ScaleAnisotropy]) -> std::io::Result<()> {
    writeln!(writer, "value,kind")?;
    for s in stats {
        writeln!(writer, "{},min", s.min_ratio)?;
        writeln!(writer, "{},mid", s.mid_ratio)?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ratios_are_order_independent() {
        let a = scale_anisotropy([1.0f32.ln(), 4.0f32.ln(), 2.0f32.ln()]).unwrap();
        let b = scale_anisotropy([4.0f32.ln(), 2.0f32.ln(), 1.0f32.ln()]).unwrap();
        assert_eq!(a, b);
        assert_relative_eq!(a.min_ratio, 0.25, epsilon = 1e-6);
        assert_relative_eq!(a.mid_ratio, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_ties_keep_middle_value() {
        let s = scale_anisotropy([0.0, 0.0, 1.0f32.ln() - 2.0]).unwrap();
        assert_relative_eq!(s.mid_ratio, 1.0, epsilon = 1e-6);
        assert_relative_eq!(s.min_ratio, (-2.0f32).exp(), epsilon = 1e-6);
    }

    #[test]
    fn test_unusable_scales() {
        assert!(scale_anisotropy([f32::NEG_INFINITY; 3]).is_none());
        assert!(scale_anisotropy([0.0, 0.0, f32::INFINITY]).is_none());
    }

    #[test]
    fn test_analyze_requires_scale_columns() {
        let table = AttributeTable::new().with_column("scale_0", vec![0.0]);
        assert_eq!(
            analyze_scales(&table).unwrap_err(),
            BuildError::MissingColumn("scale_1".to_string())
        );
    }

    #[test]
    fn test_analyze_and_summarize() {
        let table = AttributeTable::new()
            .with_column("scale_0", vec![0.0, -5.0, -5.0])
            .with_column("scale_1", vec![0.0, 0.0, -5.0])
            .with_column("scale_2", vec![0.0, 0.0, 0.0]);

        let stats = analyze_scales(&table).unwrap();
        assert_eq!(stats.len(), 3);

        let summary = summarize(&stats, 0.1);
        assert_eq!(summary.count, 3);
        assert_relative_eq!(summary.flat_fraction, 1.0 / 3.0, epsilon = 1e-6);
        assert_relative_eq!(summary.needle_fraction, 1.0 / 3.0, epsilon = 1e-6);
        assert_eq!(summarize(&[], 0.1), AnisotropySummary::default());
    }

    #[test]
    fn test_unusable_rows_keep_their_place() {
        let table = AttributeTable::new()
            .with_column("scale_0", vec![0.0, f32::NEG_INFINITY, -1.0])
            .with_column("scale_1", vec![0.0, f32::NEG_INFINITY, 0.0])
            .with_column("scale_2", vec![0.0, f32::NEG_INFINITY, 0.0]);

        let stats = analyze_scales(&table).unwrap();
        assert_eq!(stats.len(), 3);
        assert!(stats[0].is_usable());
        assert!(!stats[1].is_usable());
        assert_relative_eq!(stats[2].min_ratio, (-1.0f32).exp(), epsilon = 1e-6);

        let summary = summarize(&stats, 0.1);
        assert_eq!(summary.count, 2);
        assert!(summary.mean_min_ratio.is_finite());

        let mut out = Vec::new();
        write_csv(&mut out, &stats).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1 + 2 * 3);
        assert_eq!(lines[3], "NaN,min");
        assert_eq!(lines[4], "NaN,mid");
    }

    #[test]
    fn test_csv_layout() {
        let stats = [ScaleAnisotropy {
            min_ratio: 0.25,
            mid_ratio: 0.5,
        }];
        let mut out = Vec::new();
        write_csv(&mut out, &stats).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "value,kind\n0.25,min\n0.5,mid\n");
    }
}
