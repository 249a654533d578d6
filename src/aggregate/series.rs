/// Returns `part / total` as a percentage, or 0.0 when `total` is zero.
pub fn percent(part: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        (part / total) * 100.0
    }
}

/// Running total: element `i` is the sum of `series[0..=i]`.
pub fn cumulative_sum(series: &[f64]) -> Vec<f64> {
    series
        .iter()
        .scan(0.0, |acc, v| {
            *acc += v;
            Some(*acc)
        })
        .collect()
}

/// Trailing window sum: element `i` is the sum of
/// `series[max(0, i + 1 - window)..=i]`.
///
/// Early indices sum whatever prefix is available. A zero window yields zeros.
/// Each window is summed from scratch, so a window of zeros is exactly 0.0.
pub fn moving_sum(series: &[f64], window: usize) -> Vec<f64> {
    if window == 0 {
        return vec![0.0; series.len()];
    }

    (0..series.len())
        .map(|i| series[(i + 1).saturating_sub(window)..=i].iter().sum())
        .collect()
}

/// Divides `numerator[i]` by `denominator[i - lag]` as a percentage.
///
/// The denominator is shifted right by `lag` and zero-filled, and a zero
/// denominator yields 0.0. The result has the length of `numerator`; missing
/// denominator entries count as zero.
pub fn lag_ratio(numerator: &[f64], denominator: &[f64], lag: usize) -> Vec<f64> {
    numerator
        .iter()
        .enumerate()
        .map(|(i, n)| {
            let d = i
                .checked_sub(lag)
                .and_then(|j| denominator.get(j))
                .copied()
                .unwrap_or(0.0);
            percent(*n, d)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_with_zero_total() {
        assert_eq!(percent(10.0, 0.0), 0.0);
        assert_eq!(percent(1.0, 4.0), 25.0);
    }

    #[test]
    fn test_cumulative_sum() {
        assert_eq!(cumulative_sum(&[1.0, 2.0, 3.0]), vec![1.0, 3.0, 6.0]);
        assert!(cumulative_sum(&[]).is_empty());
    }

    #[test]
    fn test_moving_sum_full_window() {
        let series: Vec<f64> = (1..=10).map(f64::from).collect();
        let sums = moving_sum(&series, 7);
        assert_eq!(sums[6], 28.0);
        assert_eq!(sums[7], 35.0);
        assert_eq!(sums[9], 49.0);
    }

    #[test]
    fn test_moving_sum_shorter_than_window() {
        assert_eq!(moving_sum(&[1.0, 2.0, 3.0], 7), vec![1.0, 3.0, 6.0]);
        assert!(moving_sum(&[], 7).is_empty());
    }

    #[test]
    fn test_moving_sum_zero_window() {
        assert_eq!(moving_sum(&[4.0, 5.0], 0), vec![0.0, 0.0]);
    }

    #[test]
    fn test_moving_sum_fractions_then_zeros() {
        let sums = moving_sum(&[0.3, 0.6, 0.1, 0.0, 0.0, 0.0, 0.0], 2);
        assert_eq!(sums[3], 0.1);
        assert_eq!(&sums[4..], &[0.0, 0.0, 0.0]);

        let deaths = moving_sum(&[0.2, 0.1, 0.0, 0.0, 0.0, 0.0, 0.0], 2);
        let ratio = lag_ratio(&deaths, &sums, 0);
        assert_eq!(ratio[6], 0.0);
    }

    #[test]
    fn test_lag_ratio() {
        assert_eq!(lag_ratio(&[0.0, 0.0, 10.0], &[5.0, 5.0, 5.0], 2), vec![0.0, 0.0, 200.0]);
    }

    #[test]
    fn test_lag_ratio_zero_lag_and_zero_denominator() {
        assert_eq!(lag_ratio(&[1.0, 3.0], &[4.0, 0.0], 0), vec![25.0, 0.0]);
    }
}
