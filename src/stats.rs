//! Numeric helpers that feed drawing: histogram binning, Gaussian KDE,
//! box-plot summaries and a least-squares line.

use serde::{Deserialize, Serialize};

/// Equal-width histogram over `[edges[0], edges[last]]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Histogram {
    /// `heights.len() + 1` bin edges, ascending.
    pub edges: Vec<f64>,
    /// Counts, densities or their running sums depending on how it was built.
    pub heights: Vec<f64>,
}

impl Histogram {
    /// Bin `values` into `bins` equal-width bins spanning their range.
    ///
    /// The last bin is closed on the right. A single distinct value gets
    /// the range `[v - 0.5, v + 0.5]`. With `density` the area sums to one;
    /// with `cumulative` heights are running sums (ending at 1 for a density).
    pub fn compute(values: &[f64], bins: usize, density: bool, cumulative: bool) -> Option<Self> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let range = span(&finite)?;
        Some(Self::with_range(&finite, bins, range, density, cumulative))
    }

    /// Like [`Histogram::compute`], each value counting its paired weight
    /// instead of one. Pairs with a non-finite value or weight are dropped.
    pub fn compute_weighted(
        values: &[f64],
        weights: &[f64],
        bins: usize,
        density: bool,
        cumulative: bool,
    ) -> Option<Self> {
        let (vs, ws): (Vec<f64>, Vec<f64>) = values
            .iter()
            .zip(weights)
            .filter(|(v, w)| v.is_finite() && w.is_finite())
            .map(|(v, w)| (*v, *w))
            .unzip();
        let range = span(&vs)?;
        let (edges, counts) = bin_counts(&vs, Some(&ws), bins, range);
        let total = counts.iter().sum();
        Some(Self::normalized(edges, counts, total, density, cumulative))
    }

    /// Bin into a fixed range; values outside it are ignored.
    pub fn with_range(
        values: &[f64],
        bins: usize,
        range: (f64, f64),
        density: bool,
        cumulative: bool,
    ) -> Self {
        let (edges, counts) = bin_counts(values, None, bins, range);
        let total = counts.iter().sum();
        Self::normalized(edges, counts, total, density, cumulative)
    }

    /// Histograms of several groups over shared bins, for stacking.
    ///
    /// Each group is `(values, weights)`. With `density` the groups are
    /// normalized by the grand total, so the whole stack has unit area.
    /// `None` when no group has a finite value.
    pub fn stacked(
        groups: &[(Vec<f64>, Option<Vec<f64>>)],
        bins: usize,
        density: bool,
        cumulative: bool,
    ) -> Option<Vec<Self>> {
        let all: Vec<f64> = groups.iter().flat_map(|(v, _)| v.iter().copied()).collect();
        let range = span(&all)?;
        let binned: Vec<(Vec<f64>, Vec<f64>)> = groups
            .iter()
            .map(|(v, w)| bin_counts(v, w.as_deref(), bins, range))
            .collect();
        let total: f64 = binned.iter().flat_map(|(_, c)| c.iter()).sum();
        Some(
            binned
                .into_iter()
                .map(|(edges, counts)| Self::normalized(edges, counts, total, density, cumulative))
                .collect(),
        )
    }

    fn normalized(edges: Vec<f64>, counts: Vec<f64>, total: f64, density: bool, cumulative: bool) -> Self {
        let width = match (edges.first(), edges.last()) {
            (Some(lo), Some(hi)) if !counts.is_empty() => (hi - lo) / counts.len() as f64,
            _ => 1.0,
        };
        let mut heights = if density && total > 0.0 {
            counts.iter().map(|c| c / (total * width)).collect()
        } else {
            counts
        };
        if cumulative {
            let mut acc = 0.0;
            for h in heights.iter_mut() {
                acc += if density { *h * width } else { *h };
                *h = acc;
            }
        }
        Self { edges, heights }
    }

    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.edges
            .windows(2)
            .zip(&self.heights)
            .map(|(e, h)| (e[0], e[1], *h))
    }

    pub fn max_height(&self) -> f64 {
        self.heights.iter().copied().fold(0.0, f64::max)
    }

    /// Outline of the histogram as a step path (`histtype="step"`).
    pub fn step_outline(&self) -> Vec<(f64, f64)> {
        let mut pts = Vec::with_capacity(self.heights.len() * 2 + 2);
        if let Some(&first) = self.edges.first() {
            pts.push((first, 0.0));
        }
        for (l, r, h) in self.bins() {
            pts.push((l, h));
            pts.push((r, h));
        }
        if let Some(&last) = self.edges.last() {
            pts.push((last, 0.0));
        }
        pts
    }
}

/// Range of the finite values, widened by 0.5 each way when they are all equal.
fn span(values: &[f64]) -> Option<(f64, f64)> {
    let (lo, hi) = min_max(values)?;
    Some(if lo == hi { (lo - 0.5, hi + 0.5) } else { (lo, hi) })
}

/// Bin edges and (weighted) counts over `[lo, hi]`.
fn bin_counts(values: &[f64], weights: Option<&[f64]>, bins: usize, (lo, hi): (f64, f64)) -> (Vec<f64>, Vec<f64>) {
    let bins = bins.max(1);
    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0.0f64; bins];
    for (i, &v) in values.iter().enumerate() {
        if !v.is_finite() || v < lo || v > hi {
            continue;
        }
        let w = match weights {
            Some(ws) => match ws.get(i) {
                Some(w) if w.is_finite() => *w,
                _ => continue,
            },
            None => 1.0,
        };
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += w;
    }
    (edges, counts)
}

pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance (n - 1 in the denominator).
pub fn variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    Some(values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64)
}

/// Linear-interpolated percentile of already sorted data, `q` in 0..=100.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut v: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    v.sort_by(f64::total_cmp);
    v
}

/// Evenly spaced samples including both ends.
pub fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (n - 1) as f64;
            (0..n).map(|i| lo + step * i as f64).collect()
        }
    }
}

/// Bin count by the Freedman–Diaconis rule, falling back to `sqrt(n)` when
/// the interquartile range is zero.
pub fn freedman_diaconis_bins(values: &[f64]) -> usize {
    let sorted = sorted_finite(values);
    let n = sorted.len();
    if n < 2 {
        return 1;
    }
    let iqr = match (percentile_sorted(&sorted, 75.0), percentile_sorted(&sorted, 25.0)) {
        (Some(q3), Some(q1)) => q3 - q1,
        _ => 0.0,
    };
    let h = 2.0 * iqr / (n as f64).cbrt();
    if h <= 0.0 {
        return ((n as f64).sqrt().ceil() as usize).max(1);
    }
    let span = sorted[n - 1] - sorted[0];
    ((span / h).ceil() as usize).max(1)
}

/// Larger of the Sturges and Freedman–Diaconis estimates (numpy's "auto").
pub fn auto_bins(values: &[f64]) -> usize {
    let n = values.iter().filter(|v| v.is_finite()).count();
    if n == 0 {
        return 1;
    }
    let sturges = (n as f64).log2().ceil() as usize + 1;
    sturges.max(freedman_diaconis_bins(values)).min(200)
}

// ------------------------ Kernel density ------------------------

/// One-dimensional Gaussian KDE with Silverman's bandwidth factor
/// `(n * 3 / 4)^(-1/5)` scaled by the sample standard deviation.
#[derive(Debug, Clone, PartialEq)]
pub struct Kde {
    data: Vec<f64>,
    bandwidth: f64,
}

impl Kde {
    /// `None` for fewer than two values or zero variance, where the kernel
    /// is undefined.
    pub fn silverman(values: &[f64]) -> Option<Self> {
        let data: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let var = variance(&data)?;
        if var <= 0.0 {
            return None;
        }
        let n = data.len() as f64;
        let factor = (n * 3.0 / 4.0).powf(-1.0 / 5.0);
        Some(Self {
            data,
            bandwidth: var.sqrt() * factor,
        })
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let norm = 1.0 / (self.data.len() as f64 * self.bandwidth * (2.0 * std::f64::consts::PI).sqrt());
        self.data
            .iter()
            .map(|d| (-0.5 * ((x - d) / self.bandwidth).powi(2)).exp())
            .sum::<f64>()
            * norm
    }

    /// `points` samples over the data range.
    pub fn curve(&self, points: usize) -> Vec<(f64, f64)> {
        let Some((lo, hi)) = min_max(&self.data) else {
            return Vec::new();
        };
        self.curve_over(lo, hi, points)
    }

    pub fn curve_over(&self, lo: f64, hi: f64, points: usize) -> Vec<(f64, f64)> {
        linspace(lo, hi, points)
            .into_iter()
            .map(|x| (x, self.evaluate(x)))
            .collect()
    }

    /// Range extended by `cut` bandwidths on each side.
    pub fn support(&self, cut: f64) -> Option<(f64, f64)> {
        let (lo, hi) = min_max(&self.data)?;
        Some((lo - cut * self.bandwidth, hi + cut * self.bandwidth))
    }
}

/// Bivariate Gaussian KDE with full covariance and Silverman factor
/// `n^(-1/6)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Kde2d {
    points: Vec<(f64, f64)>,
    /// Inverse of the kernel covariance, row major.
    inv: [f64; 4],
    norm: f64,
}

impl Kde2d {
    pub fn silverman(points: &[(f64, f64)]) -> Option<Self> {
        let points: Vec<(f64, f64)> = points
            .iter()
            .copied()
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect();
        let n = points.len();
        if n < 3 {
            return None;
        }
        let nf = n as f64;
        let mx = points.iter().map(|p| p.0).sum::<f64>() / nf;
        let my = points.iter().map(|p| p.1).sum::<f64>() / nf;
        let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
        for (x, y) in &points {
            sxx += (x - mx).powi(2);
            syy += (y - my).powi(2);
            sxy += (x - mx) * (y - my);
        }
        let f2 = nf.powf(-1.0 / 6.0).powi(2);
        let (a, b, d) = (sxx / (nf - 1.0) * f2, sxy / (nf - 1.0) * f2, syy / (nf - 1.0) * f2);
        let det = a * d - b * b;
        if det <= 0.0 || !det.is_finite() {
            return None;
        }
        Some(Self {
            points,
            inv: [d / det, -b / det, -b / det, a / det],
            norm: 1.0 / (nf * 2.0 * std::f64::consts::PI * det.sqrt()),
        })
    }

    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        let [i00, i01, i10, i11] = self.inv;
        self.points
            .iter()
            .map(|(px, py)| {
                let (dx, dy) = (x - px, y - py);
                let q = dx * (i00 * dx + i01 * dy) + dy * (i10 * dx + i11 * dy);
                (-0.5 * q).exp()
            })
            .sum::<f64>()
            * self.norm
    }

    /// Density on an `nx` x `ny` grid of cell centers, row-major by y.
    pub fn grid(&self, (x0, x1): (f64, f64), (y0, y1): (f64, f64), nx: usize, ny: usize) -> Vec<Vec<f64>> {
        let xs = linspace(x0, x1, nx);
        linspace(y0, y1, ny)
            .into_iter()
            .map(|y| xs.iter().map(|&x| self.evaluate(x, y)).collect())
            .collect()
    }
}

// ------------------------ Box summaries ------------------------

/// Quartiles, whiskers and outliers of one box.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub mean: f64,
    /// Most extreme data points within `whis * IQR` of the box.
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub fliers: Vec<f64>,
    /// Median confidence interval `median ± 1.57 * IQR / sqrt(n)`.
    pub notch_low: f64,
    pub notch_high: f64,
    pub count: usize,
}

impl BoxStats {
    pub fn compute(values: &[f64], whis: f64) -> Option<Self> {
        let sorted = sorted_finite(values);
        let n = sorted.len();
        let q1 = percentile_sorted(&sorted, 25.0)?;
        let median = percentile_sorted(&sorted, 50.0)?;
        let q3 = percentile_sorted(&sorted, 75.0)?;
        let iqr = q3 - q1;
        let (lo_fence, hi_fence) = (q1 - whis * iqr, q3 + whis * iqr);

        let whisker_low = sorted
            .iter()
            .copied()
            .find(|v| *v >= lo_fence)
            .unwrap_or(q1)
            .min(q1);
        let whisker_high = sorted
            .iter()
            .rev()
            .copied()
            .find(|v| *v <= hi_fence)
            .unwrap_or(q3)
            .max(q3);
        let fliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < whisker_low || *v > whisker_high)
            .collect();
        let half_notch = 1.57 * iqr / (n as f64).sqrt();

        Some(Self {
            q1,
            median,
            q3,
            mean: mean(&sorted)?,
            whisker_low,
            whisker_high,
            fliers,
            notch_low: median - half_notch,
            notch_high: median + half_notch,
            count: n,
        })
    }
}

/// Least-squares line `y = slope * x + intercept`.
pub fn linear_fit(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    let n = points.len();
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let mx = points.iter().map(|p| p.0).sum::<f64>() / nf;
    let my = points.iter().map(|p| p.1).sum::<f64>() / nf;
    let sxx: f64 = points.iter().map(|p| (p.0 - mx).powi(2)).sum();
    if sxx == 0.0 {
        return None;
    }
    let sxy: f64 = points.iter().map(|p| (p.0 - mx) * (p.1 - my)).sum();
    let slope = sxy / sxx;
    Some((slope, my - slope * mx))
}
