//! Trailing moving-average smoothing.

/// Smooth `values` with a trailing simple moving average of `window` points.
///
/// The output has the same length as the input. Near the start the window
/// shrinks instead of leaving gaps: output `k` (for `k < window`) is the mean
/// of the first `k + 1` inputs, so the first output always equals the first
/// input. A window of 0 or 1 returns the input unchanged.
pub fn smooth(values: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 {
        return values.to_vec();
    }

    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_one_is_identity() {
        let values = vec![72.0, 75.5, 71.0];
        assert_eq!(smooth(&values, 1), values);
        assert_eq!(smooth(&values, 0), values);
    }

    #[test]
    fn test_empty_input() {
        assert!(smooth(&[], 1).is_empty());
        assert!(smooth(&[], 5).is_empty());
    }

    #[test]
    fn test_trailing_window_edge_policy() {
        assert_eq!(smooth(&[10.0, 20.0, 30.0, 40.0], 2), vec![10.0, 15.0, 25.0, 35.0]);
    }

    #[test]
    fn test_shrinking_window_at_start() {
        let out = smooth(&[3.0, 6.0, 9.0, 12.0, 15.0], 3);
        assert_eq!(out, vec![3.0, 4.5, 6.0, 9.0, 12.0]);
    }

    #[test]
    fn test_window_larger_than_input() {
        let out = smooth(&[2.0, 4.0, 6.0], 10);
        assert_eq!(out, vec![2.0, 3.0, 4.0]);
    }
}
