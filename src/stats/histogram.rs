//! Equal-width histogram with a Gaussian KDE overlay.
//!
//! Bin edges span the observed `[min, max]`; a degenerate range is widened by
//! half a unit on both sides. The last bin is closed on the right.
//!
//! The density curve uses Scott's rule for the bandwidth and is scaled to
//! counts (`density * n * bin_width`) so it can be drawn over the bars.

use serde::{Deserialize, Serialize};

pub const DEFAULT_BINS: usize = 30;
const KDE_GRID_POINTS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub bins: Vec<Bin>,
    /// Empty when fewer than two observations or zero variance
    pub density: Vec<DensityPoint>,
    pub observations: usize,
}

impl Histogram {
    pub fn total(&self) -> u64 {
        self.bins.iter().map(|b| b.count).sum()
    }

    pub fn max_count(&self) -> u64 {
        self.bins.iter().map(|b| b.count).max().unwrap_or(0)
    }

    pub fn range(&self) -> Option<(f64, f64)> {
        Some((self.bins.first()?.start, self.bins.last()?.end))
    }
}

/// Bucket `values` into `bins` equal-width bins and attach the density overlay.
pub fn histogram(values: &[f64], bins: usize) -> Histogram {
    let bins = bins.max(1);
    let (min, max) = match min_max(values) {
        Some(r) => r,
        None => {
            return Histogram {
                bins: Vec::new(),
                density: Vec::new(),
                observations: 0,
            }
        }
    };
    let (lo, hi) = if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    };
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0u64; bins];
    for &v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let out_bins = counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| Bin {
            start: lo + width * i as f64,
            end: if i + 1 == bins {
                hi
            } else {
                lo + width * (i + 1) as f64
            },
            count,
        })
        .collect();

    let density = match scott_bandwidth(values) {
        Some(bw) => {
            let scale = values.len() as f64 * width;
            kde_grid(min, max)
                .into_iter()
                .map(|x| DensityPoint {
                    x,
                    y: gaussian_kde(values, bw, x) * scale,
                })
                .collect()
        }
        None => Vec::new(),
    };

    Histogram {
        bins: out_bins,
        density,
        observations: values.len(),
    }
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

/// Scott's rule: sample standard deviation times n^(-1/5).
fn scott_bandwidth(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let bw = var.sqrt() * (n as f64).powf(-0.2);
    if bw > 0.0 && bw.is_finite() {
        Some(bw)
    } else {
        None
    }
}

fn kde_grid(min: f64, max: f64) -> Vec<f64> {
    let step = (max - min) / (KDE_GRID_POINTS - 1) as f64;
    (0..KDE_GRID_POINTS).map(|i| min + step * i as f64).collect()
}

fn gaussian_kde(values: &[f64], bw: f64, x: f64) -> f64 {
    let norm = 1.0 / ((2.0 * std::f64::consts::PI).sqrt() * bw * values.len() as f64);
    values
        .iter()
        .map(|v| {
            let z = (x - v) / bw;
            (-0.5 * z * z).exp()
        })
        .sum::<f64>()
        * norm
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_input() {
        let h = histogram(&[], DEFAULT_BINS);
        assert!(h.bins.is_empty());
        assert!(h.density.is_empty());
        assert_eq!(h.observations, 0);
        assert!(h.range().is_none());
    }

    #[test]
    fn test_bins_cover_range_and_counts_sum() {
        let values: Vec<f64> = (0..=60).map(|v| v as f64).collect();
        let h = histogram(&values, DEFAULT_BINS);
        assert_eq!(h.bins.len(), DEFAULT_BINS);
        assert_eq!(h.total(), 61);
        let (lo, hi) = h.range().unwrap();
        assert_relative_eq!(lo, 0.0);
        assert_relative_eq!(hi, 60.0);
        // width 2: [0,2) holds 0 and 1; the closed last bin holds 58, 59, 60
        assert_eq!(h.bins[0].count, 2);
        assert_eq!(h.bins[DEFAULT_BINS - 1].count, 3);
    }

    #[test]
    fn test_degenerate_range_is_widened() {
        let h = histogram(&[7.0, 7.0, 7.0], 30);
        let (lo, hi) = h.range().unwrap();
        assert_relative_eq!(lo, 6.5);
        assert_relative_eq!(hi, 7.5);
        assert_eq!(h.total(), 3);
        // zero variance: no density curve
        assert!(h.density.is_empty());
    }

    #[test]
    fn test_density_is_scaled_to_counts() {
        let values: Vec<f64> = (0..200).map(|i| (i % 20) as f64).collect();
        let h = histogram(&values, 10);
        assert_eq!(h.density.len(), KDE_GRID_POINTS);
        assert_relative_eq!(h.density[0].x, 0.0);
        assert_relative_eq!(h.density.last().unwrap().x, 19.0, epsilon = 1e-9);
        // Roughly uniform data: the curve sits near the average bar height
        let mid = h.density[KDE_GRID_POINTS / 2].y;
        let avg_bar = h.total() as f64 / h.bins.len() as f64;
        assert!((mid - avg_bar).abs() / avg_bar < 0.25, "mid={mid} avg={avg_bar}");
    }

    #[test]
    fn test_scott_bandwidth() {
        let bw = scott_bandwidth(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let expected = 2.5f64.sqrt() * 5f64.powf(-0.2);
        assert_relative_eq!(bw, expected, epsilon = 1e-12);
        assert!(scott_bandwidth(&[1.0]).is_none());
    }
}
