//! Descriptive statistics and the statistical tests behind spec scoring.
//!
//! Everything operates on `f64` slices that the caller has already coerced;
//! each test returns `Option<f64>` so degenerate input yields a null score
//! instead of aborting the caller's batch.

use std::collections::BTreeMap;

use serde::Serialize;

/// `describe()` output for one column. Quantitative columns fill every
/// field; categorical columns carry a zero count and empty metrics.
#[derive(Debug, Clone, Serialize)]
pub struct DescribeStats {
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
    pub percentiles: BTreeMap<String, f64>,
}

pub fn describe(values: &[f64], cuts: &[f64]) -> DescribeStats {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut percentiles = BTreeMap::new();
    for cut in cuts {
        if let Some(value) = percentile(&sorted, *cut) {
            percentiles.insert(format!("p{}", (cut * 100.0).round() as u32), value);
        }
    }

    DescribeStats {
        count: values.len(),
        min: sorted.first().copied(),
        max: sorted.last().copied(),
        mean: mean(values),
        median: percentile(&sorted, 0.5),
        std: std_dev(values),
        percentiles,
    }
}

/// Linear-interpolation percentile over an ascending-sorted slice.
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    if sorted.len() == 1 {
        return Some(sorted[0]);
    }
    let rank = q * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }
    let weight = rank - lower as f64;
    Some(sorted[lower] * (1.0 - weight) + sorted[upper] * weight)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance (n - 1 denominator).
pub fn variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let sum_squares: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some(sum_squares / (values.len() - 1) as f64)
}

pub fn std_dev(values: &[f64]) -> Option<f64> {
    variance(values).map(|v| v.max(0.0).sqrt())
}

/// Gini coefficient over non-negative values. Null for empty input, any
/// negative value, or a zero sum.
pub fn gini(values: &[f64]) -> Option<f64> {
    if values.is_empty() || values.iter().any(|v| *v < 0.0) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len() as f64;
    let sum: f64 = sorted.iter().sum();
    if sum <= 0.0 {
        return None;
    }
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, v)| (i + 1) as f64 * v)
        .sum();
    Some((2.0 * weighted) / (n * sum) - (n + 1.0) / n)
}

/// Shannon entropy (nats) of the distribution proportional to `weights`.
pub fn shannon_entropy(weights: &[f64]) -> Option<f64> {
    if weights.is_empty() || weights.iter().any(|w| *w < 0.0) {
        return None;
    }
    let sum: f64 = weights.iter().sum();
    if sum <= 0.0 {
        return None;
    }
    let entropy = weights
        .iter()
        .filter(|w| **w > 0.0)
        .map(|w| {
            let p = w / sum;
            -p * p.ln()
        })
        .sum();
    Some(entropy)
}

/// Pearson correlation. Null when either series is constant or the lengths
/// disagree.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Minimum sample size for the K² omnibus test; below this the skewness
/// transform is undefined.
pub const NORMALITY_MIN_SAMPLES: usize = 8;

/// D'Agostino K² omnibus normality test p-value. Null below the minimum
/// sample size or for constant input.
pub fn normality_p(values: &[f64]) -> Option<f64> {
    if values.len() < NORMALITY_MIN_SAMPLES {
        return None;
    }
    let n = values.len() as f64;
    let m = mean(values)?;
    let m2 = central_moment(values, m, 2);
    if m2 <= 0.0 {
        return None;
    }
    let z_skew = skewness_z(values, n, m, m2)?;
    let z_kurt = kurtosis_z(values, n, m, m2)?;
    let k2 = z_skew * z_skew + z_kurt * z_kurt;
    // Chi-square survival function with two degrees of freedom.
    Some((-k2 / 2.0).exp())
}

fn central_moment(values: &[f64], mean: f64, order: i32) -> f64 {
    values
        .iter()
        .map(|v| (v - mean).powi(order))
        .sum::<f64>()
        / values.len() as f64
}

/// D'Agostino (1970) transformed skewness statistic.
fn skewness_z(values: &[f64], n: f64, mean: f64, m2: f64) -> Option<f64> {
    let m3 = central_moment(values, mean, 3);
    let g1 = m3 / m2.powf(1.5);
    let y = g1 * ((n + 1.0) * (n + 3.0) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    if w2 <= 1.0 {
        return None;
    }
    let delta = 1.0 / (0.5 * w2.ln()).sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();
    let t = y / alpha;
    Some(delta * (t + (t * t + 1.0).sqrt()).ln())
}

/// Anscombe-Glynn (1983) transformed kurtosis statistic.
fn kurtosis_z(values: &[f64], n: f64, mean: f64, m2: f64) -> Option<f64> {
    let m4 = central_moment(values, mean, 4);
    let b2 = m4 / (m2 * m2);
    let expected = 3.0 * (n - 1.0) / (n + 1.0);
    let var_b2 =
        24.0 * n * (n - 2.0) * (n - 3.0) / ((n + 1.0) * (n + 1.0) * (n + 3.0) * (n + 5.0));
    if var_b2 <= 0.0 {
        return None;
    }
    let x = (b2 - expected) / var_b2.sqrt();
    let sqrt_beta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
        * (6.0 * (n + 3.0) * (n + 5.0) / (n * (n - 2.0) * (n - 3.0))).sqrt();
    if sqrt_beta1 == 0.0 {
        return None;
    }
    let a = 6.0
        + 8.0 / sqrt_beta1 * (2.0 / sqrt_beta1 + (1.0 + 4.0 / (sqrt_beta1 * sqrt_beta1)).sqrt());
    if a <= 4.0 {
        return None;
    }
    let denom = 1.0 + x * (2.0 / (a - 4.0)).sqrt();
    if denom == 0.0 {
        return None;
    }
    let term = ((1.0 - 2.0 / a) / denom).cbrt();
    Some((1.0 - 2.0 / (9.0 * a) - term) / (2.0 / (9.0 * a)).sqrt())
}

/// Freedman-Diaconis bin edges: width `2·IQR·n^(-1/3)`, capped at
/// `max_bins`. Edges are right-exclusive except the last, which is nudged
/// past the maximum so every value lands in exactly one bin.
pub fn bin_edges(values: &[f64], max_bins: usize) -> Option<Vec<f64>> {
    if values.is_empty() || max_bins == 0 {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let span = max - min;

    let bins = if span <= 0.0 {
        1
    } else {
        let iqr = percentile(&sorted, 0.75)? - percentile(&sorted, 0.25)?;
        let width = 2.0 * iqr * (sorted.len() as f64).powf(-1.0 / 3.0);
        if width <= 0.0 {
            max_bins
        } else {
            ((span / width).ceil() as usize).clamp(1, max_bins)
        }
    };

    let width = if span > 0.0 { span / bins as f64 } else { 1.0 };
    let mut edges: Vec<f64> = (0..=bins).map(|i| min + width * i as f64).collect();
    let nudge = span.abs().max(1.0) * 1e-9;
    if let Some(last) = edges.last_mut() {
        *last = max + nudge;
    }
    Some(edges)
}

/// Index of the bin containing `value`, right-exclusive per edge.
pub fn bin_index(edges: &[f64], value: f64) -> Option<usize> {
    if edges.len() < 2 || value < edges[0] || value >= edges[edges.len() - 1] {
        return None;
    }
    let mut index = 0;
    for (i, edge) in edges[..edges.len() - 1].iter().enumerate() {
        if value >= *edge {
            index = i;
        } else {
            break;
        }
    }
    Some(index)
}
