/// Compute the `p`-th percentile of `values` by linear interpolation between
/// the order statistics around rank `(n - 1) * p / 100`.
///
/// Returns `0.0` for an empty slice.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    percentile_of_sorted(&sorted, p)
}

/// As [`percentile`], but `sorted` must already be in ascending order
pub fn percentile_of_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    let rank = (n - 1) as f64 * p.clamp(0.0, 100.0) / 100.0;
    let lower = rank.floor() as usize;
    let upper = (lower + 1).min(n - 1);
    let frac = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// A centered moving average where each point averages the `window` values
/// in `[i - window / 2, i + window / 2)`, truncated at the array ends.
pub fn centered_moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let half = (window / 2).max(1);
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0);
    for v in values {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + v);
    }
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(n).max(i + 1);
            (prefix[hi] - prefix[lo]) / (hi - lo) as f64
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_percentile_linear() {
        let values = vec![4.0, 1.0, 3.0, 2.0, 5.0];
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 50.0), 3.0);
        assert_eq!(percentile(&values, 100.0), 5.0);
        assert!((percentile(&values, 95.0) - 4.8).abs() < 1e-12);
        assert!((percentile(&values, 10.0) - 1.4).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_degenerate() {
        assert_eq!(percentile(&[], 95.0), 0.0);
        assert_eq!(percentile(&[7.0], 95.0), 7.0);
        assert!((percentile(&[1.0, 2.0], 50.0) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_moving_average() {
        let values = vec![1.0, 1.0, 1.0, 5.0, 1.0, 1.0];
        let avg = centered_moving_average(&values, 2);
        assert_eq!(avg.len(), values.len());
        assert_eq!(avg[0], 1.0);
        assert_eq!(avg[3], 3.0);
        assert_eq!(avg[4], 3.0);

        let flat = centered_moving_average(&[0.01; 20], 10);
        assert!(flat.iter().all(|v| (v - 0.01).abs() < 1e-12));
    }
}
