use serde::{Deserialize, Serialize};

/// Which normalization the standard deviation uses.
///
/// Applied uniformly to the matched-filter SNR series and to the scalar
/// amplitude SNR proxies in the metrics report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StdDevConvention {
    /// Divide by N (ddof = 0)
    #[default]
    Population,
    /// Divide by N - 1 (ddof = 1)
    Sample,
}

impl StdDevConvention {
    fn ddof(self) -> usize {
        match self {
            StdDevConvention::Population => 0,
            StdDevConvention::Sample => 1,
        }
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Standard deviation over the whole slice.
///
/// Returns 0.0 when there are too few values for the convention, so callers
/// see a degenerate spread rather than NaN.
pub fn std_dev(values: &[f64], convention: StdDevConvention) -> f64 {
    let ddof = convention.ddof();
    if values.len() <= ddof {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|&v| (v - m) * (v - m)).sum();
    (sum_sq / (values.len() - ddof) as f64).sqrt()
}

pub fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0f64, |acc, &v| acc.max(v.abs()))
}

/// Index and value of the largest element.
pub fn argmax(values: &[f64]) -> Option<(usize, f64)> {
    values
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len().is_multiple_of(2) {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    }
}

/// Mean of squared sample-wise differences. Slices must be equal length.
pub fn mean_squared_error(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    if a.is_empty() {
        return 0.0;
    }
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        / a.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_std_dev_conventions() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(std_dev(&values, StdDevConvention::Population), 2.0);
        assert_relative_eq!(
            std_dev(&values, StdDevConvention::Sample),
            (32.0f64 / 7.0).sqrt()
        );
    }

    #[test]
    fn test_std_dev_degenerate() {
        assert_eq!(std_dev(&[3.0], StdDevConvention::Sample), 0.0);
        assert_eq!(std_dev(&[3.0, 3.0, 3.0], StdDevConvention::Population), 0.0);
        assert_eq!(std_dev(&[], StdDevConvention::Population), 0.0);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_relative_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_relative_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_argmax_and_max_abs() {
        assert_eq!(argmax(&[1.0, 5.0, 2.0, 5.0]), Some((1, 5.0)));
        assert_eq!(argmax(&[]), None);
        assert_relative_eq!(max_abs(&[1.0, -7.5, 3.0]), 7.5);
    }

    #[test]
    fn test_mean_squared_error() {
        assert_relative_eq!(mean_squared_error(&[1.0, 2.0], &[1.0, 2.0]), 0.0);
        assert_relative_eq!(mean_squared_error(&[0.0, 0.0], &[1.0, 3.0]), 5.0);
    }
}
