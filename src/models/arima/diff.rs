//! Differencing and integration for (seasonal) ARIMA models.
//!
//! Differencing is expressed as a lag polynomial
//! `δ(B) = (1 - B)^d (1 - B^s)^D`, so that regular and seasonal integration
//! share one code path.

/// Apply regular differencing `d` times.
///
/// # Example
/// ```
/// use country_forecast::models::arima::difference;
///
/// assert_eq!(difference(&[1.0, 3.0, 6.0, 10.0], 1), vec![2.0, 3.0, 4.0]);
/// ```
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Apply seasonal differencing `d` times with the given period.
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    if period == 0 {
        return series.to_vec();
    }
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= period {
            return Vec::new();
        }
        result = result[period..]
            .iter()
            .zip(&result)
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// Multiply two lag polynomials given by ascending coefficients.
pub fn multiply_polynomials(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// Coefficients of `(1 - B)^d (1 - B^s)^D`, starting with the `B^0` term.
pub fn differencing_polynomial(d: usize, cap_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = multiply_polynomials(&poly, &[1.0, -1.0]);
    }
    if period > 0 {
        let mut seasonal = vec![0.0; period + 1];
        seasonal[0] = 1.0;
        seasonal[period] = -1.0;
        for _ in 0..cap_d {
            poly = multiply_polynomials(&poly, &seasonal);
        }
    }
    poly
}

/// Apply regular then seasonal differencing.
pub fn difference_full(series: &[f64], d: usize, cap_d: usize, period: usize) -> Vec<f64> {
    seasonal_difference(&difference(series, d), cap_d, period)
}

/// Undo differencing for values forecast on the differenced scale.
///
/// `history` is the undifferenced series the model was fitted on; the
/// forecasts continue it. With `δ(B) y_t = w_t` this solves
/// `y_t = w_t - Σ_{k≥1} δ_k y_{t-k}` step by step.
pub fn integrate(
    differenced: &[f64],
    history: &[f64],
    d: usize,
    cap_d: usize,
    period: usize,
) -> Vec<f64> {
    let delta = differencing_polynomial(d, cap_d, period);
    if delta.len() == 1 {
        return differenced.to_vec();
    }

    let mut extended = history.to_vec();
    let mut out = Vec::with_capacity(differenced.len());
    for &w in differenced {
        let t = extended.len();
        let mut y = w;
        for (k, coef) in delta.iter().enumerate().skip(1) {
            if t >= k {
                y -= coef * extended[t - k];
            }
        }
        extended.push(y);
        out.push(y);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn difference_order_2() {
        let series = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        assert_eq!(difference(&series, 2), vec![1.0, 1.0, 1.0]);
        assert_eq!(difference(&series, 0), series);
    }

    #[test]
    fn difference_exhausts_short_series() {
        assert!(difference(&[1.0], 1).is_empty());
        assert!(difference(&[], 2).is_empty());
    }

    #[test]
    fn seasonal_difference_basic() {
        let series = vec![100.0, 120.0, 80.0, 110.0, 130.0, 90.0];
        assert_eq!(seasonal_difference(&series, 1, 3), vec![10.0, 10.0, 10.0]);
    }

    #[test]
    fn polynomial_matches_repeated_differencing() {
        let series: Vec<f64> = (0..30).map(|i| (i as f64 * 0.7).sin() * 5.0 + i as f64).collect();
        let delta = differencing_polynomial(1, 1, 4);
        let direct = difference_full(&series, 1, 1, 4);

        let start = delta.len() - 1;
        for (offset, expected) in direct.iter().enumerate() {
            let t = start + offset;
            let via_poly: f64 = delta.iter().enumerate().map(|(k, c)| c * series[t - k]).sum();
            assert_relative_eq!(via_poly, *expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn integrate_continues_first_difference() {
        let history = vec![10.0, 12.0, 15.0, 19.0, 24.0];
        let integrated = integrate(&[6.0, 7.0], &history, 1, 0, 0);

        assert_relative_eq!(integrated[0], 30.0, epsilon = 1e-10);
        assert_relative_eq!(integrated[1], 37.0, epsilon = 1e-10);
    }

    #[test]
    fn integrate_second_difference_of_quadratic() {
        // y = t^2 has constant second difference 2.
        let history: Vec<f64> = (0..6).map(|t| (t * t) as f64).collect();
        let integrated = integrate(&[2.0, 2.0], &history, 2, 0, 0);

        assert_relative_eq!(integrated[0], 36.0, epsilon = 1e-10);
        assert_relative_eq!(integrated[1], 49.0, epsilon = 1e-10);
    }

    #[test]
    fn integrate_seasonal_repeats_pattern() {
        let history = vec![1.0, 5.0, 3.0, 1.0, 5.0, 3.0];
        let integrated = integrate(&[0.0, 0.0, 0.0, 0.0], &history, 0, 1, 3);

        assert_eq!(integrated, vec![1.0, 5.0, 3.0, 1.0]);
    }
}
