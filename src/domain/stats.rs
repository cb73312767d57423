//! Numeric primitives shared by the signal evaluators.
//!
//! Every function here is total over its guarded domain: short input or a
//! zero denominator yields `None` (or a defined zero), never a panic.

/// Arithmetic mean of the last `period` values.
///
/// `None` if `period == 0` or fewer than `period` values are available.
pub fn sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let tail = &values[values.len() - period..];
    Some(tail.iter().sum::<f64>() / period as f64)
}

/// Ordinary least squares of value against index 0..n-1.
///
/// Returns `(slope, r_squared)`. `None` for fewer than 2 points. When the
/// values are perfectly flat (SS_tot = 0) the fit is exact and r_squared is
/// 1.0; a residual on a flat series cannot occur mathematically but is
/// guarded to 0.0 anyway.
pub fn linear_regression(values: &[f64]) -> Option<(f64, f64)> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = values.iter().sum::<f64>() / n as f64;

    let mut ssxx = 0.0;
    let mut ssxy = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        ssxx += dx * dx;
        ssxy += dx * (y - y_mean);
    }
    if ssxx == 0.0 {
        return None;
    }

    let slope = ssxy / ssxx;
    let intercept = y_mean - slope * x_mean;

    let mut ss_tot = 0.0;
    let mut ss_res = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let y_hat = slope * i as f64 + intercept;
        ss_tot += (y - y_mean) * (y - y_mean);
        ss_res += (y - y_hat) * (y - y_hat);
    }

    let r_squared = if ss_tot == 0.0 {
        if ss_res == 0.0 { 1.0 } else { 0.0 }
    } else {
        1.0 - ss_res / ss_tot
    };

    Some((slope, r_squared))
}

/// Population standard deviation of day-over-day percentage returns.
///
/// `None` if fewer than 2 values. Pairs with a zero previous value are
/// skipped rather than dividing by zero.
pub fn stdev_of_returns(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }

    let returns: Vec<f64> = values
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0] * 100.0)
        .collect();
    if returns.is_empty() {
        return None;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean) * (r - mean)).sum::<f64>() / n;
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sma_basic() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(sma(&values, 3), Some(4.0));
        assert_eq!(sma(&values, 5), Some(3.0));
    }

    #[test]
    fn sma_insufficient_data() {
        assert_eq!(sma(&[1.0, 2.0], 3), None);
        assert_eq!(sma(&[], 1), None);
    }

    #[test]
    fn sma_zero_period() {
        assert_eq!(sma(&[1.0, 2.0], 0), None);
    }

    #[test]
    fn regression_perfect_line() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let (slope, r2) = linear_regression(&values).unwrap();
        assert_relative_eq!(slope, 1.0, epsilon = 1e-12);
        assert_relative_eq!(r2, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn regression_downtrend() {
        let values = [5.0, 4.0, 3.0, 2.0, 1.0];
        let (slope, r2) = linear_regression(&values).unwrap();
        assert_relative_eq!(slope, -1.0, epsilon = 1e-12);
        assert_relative_eq!(r2, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn regression_flat_series_r2_is_one() {
        let values = [3.0, 3.0, 3.0, 3.0];
        let (slope, r2) = linear_regression(&values).unwrap();
        assert_relative_eq!(slope, 0.0, epsilon = 1e-12);
        assert_relative_eq!(r2, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn regression_noisy_series_low_r2() {
        let values = [1.0, 5.0, 2.0, 6.0, 1.5, 5.5];
        let (_, r2) = linear_regression(&values).unwrap();
        assert!(r2 < 0.5, "noisy sawtooth should fit poorly, got r2={r2}");
    }

    #[test]
    fn regression_too_short() {
        assert_eq!(linear_regression(&[1.0]), None);
        assert_eq!(linear_regression(&[]), None);
    }

    #[test]
    fn stdev_of_returns_constant_series() {
        let values = [100.0, 100.0, 100.0];
        assert_relative_eq!(stdev_of_returns(&values).unwrap(), 0.0);
    }

    #[test]
    fn stdev_of_returns_known_value() {
        // returns: +10%, -10% → mean 0, population stdev 10
        let values = [100.0, 110.0, 99.0];
        let sd = stdev_of_returns(&values).unwrap();
        assert_relative_eq!(sd, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn stdev_of_returns_too_short() {
        assert_eq!(stdev_of_returns(&[100.0]), None);
        assert_eq!(stdev_of_returns(&[]), None);
    }

    #[test]
    fn stdev_of_returns_skips_zero_denominator() {
        let values = [0.0, 100.0];
        assert_eq!(stdev_of_returns(&values), None);
    }
}
