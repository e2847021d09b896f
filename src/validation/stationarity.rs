//! Stationarity analysis with the Augmented Dickey-Fuller test.
//!
//! The test regresses `Δy_t` on a constant, the lagged level `y_{t-1}` and
//! `k` lagged differences. `k` is chosen by AIC over a common sample, the
//! statistic is the t-value of the level coefficient, p-values follow
//! MacKinnon (1994) and critical values MacKinnon (2010).

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};
use crate::models::arima::difference;
use crate::utils::ols::ols_fit;
use crate::utils::stats::{is_constant, normal_cdf};

/// p-value at or below which a series counts as stationary.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Error reported for a series holding a single distinct value.
pub const CONSTANT_INPUT_ERROR: &str = "Input data is constant";

/// Residual sum of squares, relative to `Σ Δy²`, under which the regression
/// is an exact fit and the statistic is meaningless.
const EXACT_FIT_TOLERANCE: f64 = 1e-20;

// MacKinnon (1994) p-value surface, constant-only regression, one variable.
const TAU_MAX: f64 = 2.74;
const TAU_MIN: f64 = -18.83;
const TAU_STAR: f64 = -1.61;
const TAU_SMALL_P: [f64; 3] = [2.1659, 1.4412, 0.038269];
const TAU_LARGE_P: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

// MacKinnon (2010) response surfaces for the critical values.
const CRIT_1PCT: [f64; 4] = [-3.43035, -6.5393, -16.786, -79.433];
const CRIT_5PCT: [f64; 4] = [-2.86154, -2.8903, -4.234, -40.040];
const CRIT_10PCT: [f64; 4] = [-2.56677, -1.5384, -2.809, 0.0];

/// Critical values for stationarity tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CriticalValues {
    /// Critical value at 1% significance
    pub cv_1pct: f64,
    /// Critical value at 5% significance
    pub cv_5pct: f64,
    /// Critical value at 10% significance
    pub cv_10pct: f64,
}

impl CriticalValues {
    /// Finite-sample critical values for a regression on `nobs` rows.
    pub fn for_nobs(nobs: usize) -> Self {
        let surface = |c: &[f64; 4]| {
            let x = 1.0 / nobs as f64;
            c[0] + c[1] * x + c[2] * x * x + c[3] * x * x * x
        };
        Self {
            cv_1pct: surface(&CRIT_1PCT),
            cv_5pct: surface(&CRIT_5PCT),
            cv_10pct: surface(&CRIT_10PCT),
        }
    }
}

/// Outcome of one Augmented Dickey-Fuller test.
#[derive(Debug, Clone, PartialEq)]
pub struct AdfResult {
    /// t-value of the lagged level coefficient.
    pub statistic: f64,
    /// Approximate p-value.
    pub p_value: f64,
    /// Lagged differences in the final regression.
    pub used_lag: usize,
    /// Rows of the final regression.
    pub nobs: usize,
    pub critical_values: CriticalValues,
    /// Best AIC of the lag search.
    pub ic_best: f64,
}

impl AdfResult {
    /// Whether the unit-root null is rejected at [`SIGNIFICANCE_LEVEL`].
    pub fn is_stationary(&self) -> bool {
        self.p_value <= SIGNIFICANCE_LEVEL
    }
}

/// Default lag cap `ceil(12 * (n / 100)^(1/4))`.
pub fn default_max_lag(n: usize) -> usize {
    (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize
}

/// MacKinnon approximate p-value for the constant-only ADF statistic.
pub fn mackinnon_p_value(statistic: f64) -> f64 {
    if statistic > TAU_MAX {
        return 1.0;
    }
    if statistic < TAU_MIN {
        return 0.0;
    }
    let coefs: &[f64] = if statistic <= TAU_STAR {
        &TAU_SMALL_P
    } else {
        &TAU_LARGE_P
    };
    let z = coefs.iter().rev().fold(0.0, |acc, c| acc * statistic + c);
    normal_cdf(z)
}

/// Augmented Dickey-Fuller test for unit root (non-stationarity).
///
/// Tests null hypothesis that series has a unit root (non-stationary).
/// Rejection implies stationarity.
///
/// # Arguments
/// * `series` - Observations in time order
/// * `max_lag` - Largest lag order to consider (default: `12 * (n/100)^(1/4)`,
///   capped at `n/2 - 2`)
///
/// # Errors
/// * `EmptyData` for an empty series
/// * `InsufficientData` when fewer than four observations are given
/// * `InvalidParameter` when no regression can be estimated or it fits exactly
pub fn adf_test(series: &[f64], max_lag: Option<usize>) -> Result<AdfResult> {
    let n = series.len();
    if n == 0 {
        return Err(ForecastError::EmptyData);
    }
    let cap = (n / 2)
        .checked_sub(2)
        .ok_or(ForecastError::InsufficientData { needed: 4, got: n })?;
    let max_lag = max_lag.unwrap_or_else(|| default_max_lag(n)).min(cap);

    let diff = difference(series, 1);

    // Lag search on the sample usable by the largest lag.
    let mut best: Option<(usize, f64)> = None;
    for lag in 0..=max_lag {
        let (y, columns) = design(series, &diff, lag, max_lag);
        match ols_fit(&y, &columns) {
            Ok(fit) => {
                let aic = fit.aic();
                if best.map_or(true, |(_, best_aic)| aic < best_aic) {
                    best = Some((lag, aic));
                }
            }
            Err(e) => debug!("ADF lag {lag} skipped: {e}"),
        }
    }
    let (used_lag, ic_best) = best.ok_or_else(|| {
        ForecastError::InvalidParameter("no ADF regression could be estimated".to_string())
    })?;

    let (y, columns) = design(series, &diff, used_lag, used_lag);
    let fit = ols_fit(&y, &columns)?;
    let scale: f64 = y.iter().map(|v| v * v).sum();
    if fit.rss <= EXACT_FIT_TOLERANCE * scale {
        return Err(ForecastError::InvalidParameter(
            "ADF regression fits the data exactly".to_string(),
        ));
    }

    let statistic = fit.t_value(0);
    if !statistic.is_finite() {
        return Err(ForecastError::InvalidParameter(
            "ADF statistic is not finite".to_string(),
        ));
    }

    Ok(AdfResult {
        statistic,
        p_value: mackinnon_p_value(statistic),
        used_lag,
        nobs: fit.nobs,
        critical_values: CriticalValues::for_nobs(fit.nobs),
        ic_best,
    })
}

/// Response and design columns `[y_{t-1}, Δy_{t-1}, .., Δy_{t-lag}, 1]`.
///
/// Rows start at difference index `sample_start`, so regressions with
/// different `lag` but the same `sample_start` share one sample.
fn design(series: &[f64], diff: &[f64], lag: usize, sample_start: usize) -> (Vec<f64>, Vec<Vec<f64>>) {
    let rows = sample_start..diff.len();
    let y: Vec<f64> = diff[rows.clone()].to_vec();

    let mut columns = Vec::with_capacity(lag + 2);
    columns.push(series[rows.clone()].to_vec());
    for j in 1..=lag {
        columns.push(rows.clone().map(|t| diff[t - j]).collect());
    }
    columns.push(vec![1.0; y.len()]);
    (y, columns)
}

/// Stationarity verdict for one series, possibly after differencing.
///
/// Numeric fields are `None` when the test did not run; `error` then says
/// why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationarityReport {
    /// Differencing steps applied before the reported test.
    pub differencing: usize,
    pub statistic: Option<f64>,
    pub p_value: Option<f64>,
    pub used_lag: Option<usize>,
    pub nobs: Option<usize>,
    pub critical_values: Option<CriticalValues>,
    pub is_stationary: bool,
    pub error: Option<String>,
}

impl StationarityReport {
    fn from_test(differencing: usize, adf: &AdfResult) -> Self {
        Self {
            differencing,
            statistic: Some(adf.statistic),
            p_value: Some(adf.p_value),
            used_lag: Some(adf.used_lag),
            nobs: Some(adf.nobs),
            critical_values: Some(adf.critical_values),
            is_stationary: adf.is_stationary(),
            error: None,
        }
    }

    fn failed(differencing: usize, error: impl Into<String>) -> Self {
        Self {
            differencing,
            statistic: None,
            p_value: None,
            used_lag: None,
            nobs: None,
            critical_values: None,
            is_stationary: false,
            error: Some(error.into()),
        }
    }

    /// True when the series held a single distinct value at the reported
    /// step.
    pub fn is_constant(&self) -> bool {
        self.error.as_deref() == Some(CONSTANT_INPUT_ERROR)
    }
}

/// Test a series for stationarity, differencing up to `max_diff` times.
///
/// With `max_diff == 0` the test runs once on the raw values. Otherwise the
/// series is differenced until the test rejects the unit root or the cap is
/// reached, in which case the last test is reported as is. A constant series
/// (raw or differenced) stops with [`CONSTANT_INPUT_ERROR`] without testing.
///
/// A series too short for the test is reported at the step where that
/// happens; differencing only shortens it further. Other test failures at an
/// intermediate step move on to the next difference.
///
/// # Example
/// ```
/// use country_forecast::validation::stationarity::{analyze, CONSTANT_INPUT_ERROR};
///
/// let report = analyze(&[10.0, 10.0, 10.0, 10.0], 2);
/// assert_eq!(report.error.as_deref(), Some(CONSTANT_INPUT_ERROR));
/// assert_eq!(report.differencing, 0);
/// assert!(report.statistic.is_none());
/// ```
pub fn analyze(series: &[f64], max_diff: usize) -> StationarityReport {
    let mut current = series.to_vec();
    let mut step = 0;
    loop {
        if is_constant(&current) {
            return StationarityReport::failed(step, CONSTANT_INPUT_ERROR);
        }

        match adf_test(&current, None) {
            Ok(adf) if adf.is_stationary() || step == max_diff => {
                return StationarityReport::from_test(step, &adf);
            }
            Ok(adf) => debug!(
                "p-value {:.4} after {step} differencing step(s), differencing again",
                adf.p_value
            ),
            Err(e @ (ForecastError::InsufficientData { .. } | ForecastError::EmptyData)) => {
                return StationarityReport::failed(step, e.to_string());
            }
            Err(e) if step == max_diff => return StationarityReport::failed(step, e.to_string()),
            Err(e) => debug!("ADF test failed after {step} differencing step(s): {e}"),
        }

        current = difference(&current, 1);
        step += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn white_noise(n: usize, seed: u64) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
    }

    fn exponential_growth(n: usize) -> Vec<f64> {
        white_noise(n, 11)
            .into_iter()
            .enumerate()
            .map(|(t, u)| 100.0 * 1.05f64.powi(t as i32) + u)
            .collect()
    }

    #[test]
    fn adf_white_noise_is_stationary() {
        let result = adf_test(&white_noise(120, 7), None).unwrap();

        assert!(result.statistic < result.critical_values.cv_1pct);
        assert!(result.p_value < 0.01);
        assert!(result.is_stationary());
    }

    #[test]
    fn adf_exponential_growth_is_not_stationary() {
        let result = adf_test(&exponential_growth(60), None).unwrap();
        assert!(result.p_value > SIGNIFICANCE_LEVEL);
        assert!(!result.is_stationary());
    }

    #[test]
    fn adf_lag_search_bounds() {
        let series = white_noise(50, 3);
        let result = adf_test(&series, None).unwrap();

        // ceil(12 * 0.5^0.25) = 11, below the 50 / 2 - 2 cap.
        assert_eq!(default_max_lag(50), 11);
        assert!(result.used_lag <= 11);
        assert_eq!(result.nobs, 49 - result.used_lag);

        let fixed = adf_test(&series, Some(0)).unwrap();
        assert_eq!(fixed.used_lag, 0);
        assert_eq!(fixed.nobs, 49);
    }

    #[test]
    fn adf_short_series() {
        assert_eq!(
            adf_test(&[1.0, 2.0, 1.5], None).unwrap_err(),
            ForecastError::InsufficientData { needed: 4, got: 3 }
        );
        assert_eq!(adf_test(&[], None).unwrap_err(), ForecastError::EmptyData);
    }

    #[test]
    fn adf_exact_fit_is_rejected() {
        let linear: Vec<f64> = (0..20).map(|t| 1.0 + 2.0 * t as f64).collect();
        assert!(matches!(
            adf_test(&linear, None),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn mackinnon_p_value_reference_points() {
        // The asymptotic 5% critical value maps to p = 0.05.
        assert_relative_eq!(mackinnon_p_value(-2.86154), 0.05, epsilon = 1e-3);
        assert_eq!(mackinnon_p_value(3.0), 1.0);
        assert_eq!(mackinnon_p_value(-20.0), 0.0);
        assert!(mackinnon_p_value(-1.0) > mackinnon_p_value(-2.0));
    }

    #[test]
    fn critical_values_response_surface() {
        let cv = CriticalValues::for_nobs(100);
        let x: f64 = 0.01;
        let expected_1 = -3.43035 - 6.5393 * x - 16.786 * x * x - 79.433 * x * x * x;
        assert_relative_eq!(cv.cv_1pct, expected_1, epsilon = 1e-12);
        assert!(cv.cv_1pct < cv.cv_5pct && cv.cv_5pct < cv.cv_10pct);
    }

    #[test]
    fn analyze_constant_series() {
        let report = analyze(&[5.0; 12], 0);

        assert!(report.is_constant());
        assert_eq!(report.differencing, 0);
        assert!(report.p_value.is_none());
        assert!(report.critical_values.is_none());
        assert!(!report.is_stationary);
    }

    #[test]
    fn analyze_stops_at_first_stationary_step() {
        let report = analyze(&white_noise(100, 21), 3);

        assert_eq!(report.differencing, 0);
        assert!(report.is_stationary);
        assert!(report.error.is_none());
    }

    #[test]
    fn analyze_forced_accept_at_cap() {
        let report = analyze(&exponential_growth(60), 1);

        assert_eq!(report.differencing, 1);
        assert!(!report.is_stationary);
        assert!(report.error.is_none());
        assert!(report.statistic.is_some());
    }

    #[test]
    fn analyze_constant_after_differencing() {
        let linear: Vec<f64> = (0..15).map(|t| 4.0 + 3.0 * t as f64).collect();
        let report = analyze(&linear, 2);

        assert_eq!(report.differencing, 1);
        assert!(report.is_constant());
    }

    #[test]
    fn analyze_reports_short_series() {
        let report = analyze(&[1.0, 3.0, 2.0], 0);
        assert_eq!(report.differencing, 0);
        assert!(report.error.unwrap().contains("insufficient data"));
    }

    #[test]
    fn short_series_is_not_differenced_into_a_constant() {
        // Differencing twice would leave a single value.
        let report = analyze(&[1.0, 3.0, 2.0], 2);

        assert_eq!(report.differencing, 0);
        assert!(!report.is_constant());
        assert!(report.error.as_deref().unwrap().contains("insufficient data"));
        assert!(report.statistic.is_none());
    }
}
