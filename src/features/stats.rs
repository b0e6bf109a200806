//! Descriptive statistics used by the extractor, trends, and training code

/// Arithmetic mean (None for an empty slice)
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance (None for an empty slice)
pub fn variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    Some(values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (None for an empty slice)
pub fn std_dev(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

/// Percentile with linear interpolation between closest ranks
///
/// Formula: `rank = p / 100 * (n - 1)`, interpolating between
/// `sorted[floor(rank)]` and `sorted[ceil(rank)]`.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Least-squares slope of `ys` over `xs`
///
/// Returns None with fewer than two points or when every x is identical.
pub fn slope(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;
    let sxx: f64 = xs.iter().map(|x| (x - mx).powi(2)).sum();
    if sxx <= f64::EPSILON {
        return None;
    }
    let sxy: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    Some(sxy / sxx)
}

/// Slope of `ys` over their index positions
pub fn index_slope(ys: &[f64]) -> Option<f64> {
    let xs: Vec<f64> = (0..ys.len()).map(|i| i as f64).collect();
    slope(&xs, ys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, 4.0, 6.0]), Some(4.0));

        // Population std of [2, 4, 4, 4, 5, 5, 7, 9] is exactly 2
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((std_dev(&values).unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(std_dev(&[5.0]), Some(0.0));
    }

    #[test]
    fn test_percentile_interpolation() {
        let values = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert_eq!(percentile(&values, 0.0), Some(10.0));
        assert_eq!(percentile(&values, 50.0), Some(30.0));
        assert_eq!(percentile(&values, 100.0), Some(50.0));
        // rank = 0.9 * 4 = 3.6 -> 40 + 0.6 * 10
        assert!((percentile(&values, 90.0).unwrap() - 46.0).abs() < 1e-9);

        // Order of input does not matter
        let shuffled = [50.0, 10.0, 40.0, 30.0, 20.0];
        assert_eq!(percentile(&shuffled, 90.0), percentile(&values, 90.0));
        assert_eq!(percentile(&[], 90.0), None);
    }

    #[test]
    fn test_slope() {
        assert_eq!(index_slope(&[1.0, 3.0, 5.0, 7.0]), Some(2.0));
        assert_eq!(index_slope(&[4.0, 4.0, 4.0]), Some(0.0));
        assert_eq!(index_slope(&[1.0]), None);
        assert_eq!(slope(&[1.0, 1.0], &[0.0, 5.0]), None);
    }
}
