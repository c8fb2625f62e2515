//! Histogram binning and Gaussian kernel density estimate

use itertools_num::linspace;

/// Points on the density curve
pub const KDE_GRID_POINTS: usize = 200;

/// Equal-width bins over the data range
#[derive(Debug, Clone, PartialEq)]
pub struct Bins {
    pub edges: Vec<f64>,
    pub counts: Vec<u64>,
}

impl Bins {
    pub fn width(&self) -> f64 {
        match self.edges.as_slice() {
            [first, second, ..] => second - first,
            _ => 0.0,
        }
    }

    pub fn centers(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Sturges' rule: ceil(log2(n)) + 1
pub fn sturges_bins(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    (n as f64).log2().ceil() as usize + 1
}

/// Bin finite values into `bins` equal-width bins. `None` when nothing is finite.
pub fn histogram(values: &[f64], bins: usize) -> Option<Bins> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let (mut lo, mut hi) = min_max(&finite)?;
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let bins = bins.max(1);
    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0u64; bins];

    for v in finite {
        // Last bin is closed on the right
        let index = (((v - lo) / width) as usize).min(bins - 1);
        counts[index] += 1;
    }

    Some(Bins { edges, counts })
}

/// Scott's rule: sample std * n^(-1/5). `None` for fewer than two
/// samples or zero spread.
pub fn scott_bandwidth(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std = variance.sqrt();
    if std == 0.0 || !std.is_finite() {
        return None;
    }
    Some(std * (n as f64).powf(-0.2))
}

/// Gaussian KDE evaluated at each grid point (integrates to 1)
pub fn gaussian_kde(values: &[f64], bandwidth: f64, grid: &[f64]) -> Vec<f64> {
    let n = values.len() as f64;
    let norm = 1.0 / (n * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    grid.iter()
        .map(|&x| {
            values
                .iter()
                .map(|&v| {
                    let z = (x - v) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum::<f64>()
                * norm
        })
        .collect()
}

/// Density curve scaled to histogram counts, over the data range
pub fn count_scaled_kde(values: &[f64], bins: &Bins) -> Option<(Vec<f64>, Vec<f64>)> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let bandwidth = scott_bandwidth(&finite)?;
    let (lo, hi) = min_max(&finite)?;

    let grid: Vec<f64> = linspace(lo, hi, KDE_GRID_POINTS).collect();
    let scale = finite.len() as f64 * bins.width();
    let density = gaussian_kde(&finite, bandwidth, &grid)
        .into_iter()
        .map(|d| d * scale)
        .collect();

    Some((grid, density))
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(values.iter().fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))))
}
