//! ARIMA and seasonal ARIMA models fitted by conditional sum of squares.

use std::fmt::Write as _;

use crate::core::Forecast;
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{
    difference_full, differencing_polynomial, integrate, multiply_polynomials,
};
use crate::models::Forecaster;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{mean, quantile_normal};

/// Box bound on every AR and MA coefficient during estimation.
const COEFFICIENT_BOUND: f64 = 0.99;

/// ARIMA model specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ARIMASpec {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
    /// Estimate a constant on the differenced scale (a drift when `d > 0`).
    pub constant: bool,
}

impl ARIMASpec {
    /// Create a new ARIMA specification without a constant.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self {
            p,
            d,
            q,
            constant: false,
        }
    }

    pub fn with_constant(mut self, constant: bool) -> Self {
        self.constant = constant;
        self
    }

    /// Total number of parameters.
    pub fn num_params(&self) -> usize {
        self.p + self.q + usize::from(self.constant)
    }
}

impl Default for ARIMASpec {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

/// Seasonal ARIMA specification `(p, d, q) x (P, D, Q, s)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SARIMASpec {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    /// Seasonal AR order (P)
    pub cap_p: usize,
    /// Seasonal differencing order (D)
    pub cap_d: usize,
    /// Seasonal MA order (Q)
    pub cap_q: usize,
    /// Seasonal period in observations
    pub s: usize,
    /// Estimate a constant on the differenced scale.
    pub constant: bool,
}

impl SARIMASpec {
    pub fn new(
        p: usize,
        d: usize,
        q: usize,
        cap_p: usize,
        cap_d: usize,
        cap_q: usize,
        s: usize,
    ) -> Self {
        Self {
            p,
            d,
            q,
            cap_p,
            cap_d,
            cap_q,
            s,
            constant: false,
        }
    }

    pub fn with_constant(mut self, constant: bool) -> Self {
        self.constant = constant;
        self
    }

    /// Number of AR and MA coefficients, seasonal ones included.
    fn num_terms(&self) -> usize {
        self.p + self.q + self.cap_p + self.cap_q
    }

    /// Total number of parameters.
    pub fn num_params(&self) -> usize {
        self.num_terms() + usize::from(self.constant)
    }

    /// True when any seasonal order is non-zero.
    pub fn has_seasonal_terms(&self) -> bool {
        self.cap_p + self.cap_d + self.cap_q > 0
    }

    /// Largest AR lag once the seasonal polynomial is expanded.
    pub fn max_ar_lag(&self) -> usize {
        self.p + self.cap_p * self.period()
    }

    /// Largest MA lag once the seasonal polynomial is expanded.
    pub fn max_ma_lag(&self) -> usize {
        self.q + self.cap_q * self.period()
    }

    /// Observations consumed by regular and seasonal differencing.
    pub fn differencing_loss(&self) -> usize {
        self.d + self.cap_d * self.period()
    }

    /// Shortest series the model can be fitted on.
    pub fn min_observations(&self) -> usize {
        self.differencing_loss() + self.max_ar_lag().max(self.max_ma_lag()) + 2
    }

    /// Effective seasonal period: zero when no seasonal term is present.
    fn period(&self) -> usize {
        if self.has_seasonal_terms() {
            self.s
        } else {
            0
        }
    }
}

impl From<ARIMASpec> for SARIMASpec {
    fn from(spec: ARIMASpec) -> Self {
        Self::new(spec.p, spec.d, spec.q, 0, 0, 0, 0).with_constant(spec.constant)
    }
}

/// Model coefficients in estimation order.
#[derive(Debug, Clone, Default)]
struct Coefficients {
    intercept: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
    seasonal_ar: Vec<f64>,
    seasonal_ma: Vec<f64>,
}

impl Coefficients {
    /// Split a flat `[intercept?, ar, ma, seasonal_ar, seasonal_ma]` vector;
    /// the intercept is present only for specs with a constant.
    fn from_params(params: &[f64], spec: &SARIMASpec) -> Self {
        let (intercept, mut rest) = match params.split_first() {
            Some((&c, tail)) if spec.constant => (c, tail),
            _ => (0.0, params),
        };
        let mut take = |count: usize| {
            let (head, tail) = rest.split_at(count);
            rest = tail;
            head.to_vec()
        };
        let ar = take(spec.p);
        let ma = take(spec.q);
        let seasonal_ar = take(spec.cap_p);
        let seasonal_ma = take(spec.cap_q);
        Self {
            intercept,
            ar,
            ma,
            seasonal_ar,
            seasonal_ma,
        }
    }

    /// `φ(B) Φ(B^s)` with ascending coefficients, leading 1.
    fn ar_polynomial(&self, period: usize) -> Vec<f64> {
        multiply_polynomials(
            &lag_polynomial(&self.ar, -1.0, 1),
            &lag_polynomial(&self.seasonal_ar, -1.0, period),
        )
    }

    /// `θ(B) Θ(B^s)` with ascending coefficients, leading 1.
    fn ma_polynomial(&self, period: usize) -> Vec<f64> {
        multiply_polynomials(
            &lag_polynomial(&self.ma, 1.0, 1),
            &lag_polynomial(&self.seasonal_ma, 1.0, period),
        )
    }
}

/// `1 + sign * (c_1 B^step + c_2 B^{2 step} + ...)`.
fn lag_polynomial(coeffs: &[f64], sign: f64, step: usize) -> Vec<f64> {
    let mut poly = vec![0.0; coeffs.len() * step + 1];
    poly[0] = 1.0;
    for (i, c) in coeffs.iter().enumerate() {
        poly[(i + 1) * step] = sign * c;
    }
    poly
}

/// One-step residuals of the ARMA recursion on the differenced series.
///
/// The recursion starts at the first observation with pre-sample values at
/// the intercept and pre-sample shocks at zero, so every observation has a
/// residual whatever the AR order.
fn css_residuals(w: &[f64], intercept: f64, ar_lags: &[f64], ma_lags: &[f64]) -> Vec<f64> {
    let n = w.len();
    let mut residuals = vec![0.0; n];

    for t in 0..n {
        let mut pred = intercept;
        for (i, a) in ar_lags.iter().enumerate().take(t) {
            pred += a * (w[t - 1 - i] - intercept);
        }
        for (j, m) in ma_lags.iter().enumerate().take(t) {
            pred += m * residuals[t - 1 - j];
        }
        residuals[t] = w[t] - pred;
    }

    residuals
}

/// Lag weights used by the recursion: `y_t` depends on `lags[i] * y_{t-1-i}`.
fn ar_lags(ar_poly: &[f64]) -> Vec<f64> {
    ar_poly[1..].iter().map(|c| -c).collect()
}

/// Estimated parameters plus everything needed to forecast.
#[derive(Debug, Clone)]
struct FittedState {
    spec: SARIMASpec,
    coefficients: Coefficients,
    ar_poly: Vec<f64>,
    ma_poly: Vec<f64>,
    original: Vec<f64>,
    differenced: Vec<f64>,
    /// Residuals on the differenced scale.
    innovations: Vec<f64>,
    /// In-sample predictions on the original scale, NaN where undefined.
    fitted: Vec<f64>,
    residuals: Vec<f64>,
    residual_variance: f64,
    log_likelihood: f64,
    aic: f64,
    bic: f64,
    nobs: usize,
    converged: bool,
}

impl FittedState {
    /// Fit `spec` to `values`.
    ///
    /// The likelihood is evaluated on the original-scale observations from
    /// index `max(burn_in, differencing loss)` on, so fits sharing a
    /// `burn_in` at least as large as every differencing loss are scored on
    /// the same sample.
    fn estimate(values: &[f64], spec: SARIMASpec, burn_in: usize) -> Result<Self> {
        if values.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidParameter(
                "series contains non-finite values".to_string(),
            ));
        }
        if spec.has_seasonal_terms() && spec.s < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "seasonal period must be at least 2, got {}",
                spec.s
            )));
        }
        let needed = spec.min_observations();
        if values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        let period = spec.period();
        let differenced = difference_full(values, spec.d, spec.cap_d, period);
        let offset = values.len() - differenced.len();
        let skip = burn_in.max(offset) - offset;
        let nobs = differenced.len().saturating_sub(skip);
        if nobs == 0 {
            return Err(ForecastError::InsufficientData {
                needed: burn_in.max(offset) + 1,
                got: values.len(),
            });
        }
        let (coefficients, converged) = estimate_coefficients(&differenced, &spec, skip);

        let ar_poly = coefficients.ar_polynomial(period);
        let ma_poly = coefficients.ma_polynomial(period);
        let lags = ar_lags(&ar_poly);
        let innovations = css_residuals(
            &differenced,
            coefficients.intercept,
            &lags,
            &ma_poly[1..],
        );

        let residual_variance =
            innovations[skip..].iter().map(|e| e * e).sum::<f64>() / nobs as f64;
        if !residual_variance.is_finite() || residual_variance <= 0.0 {
            return Err(ForecastError::FitFailed(format!(
                "degenerate residual variance {residual_variance}"
            )));
        }

        let n_eff = nobs as f64;
        let k = spec.num_params() as f64;
        let log_likelihood =
            -0.5 * n_eff * (1.0 + residual_variance.ln() + (2.0 * std::f64::consts::PI).ln());
        let aic = -2.0 * log_likelihood + 2.0 * k;
        let bic = -2.0 * log_likelihood + k * n_eff.ln();
        if !aic.is_finite() {
            return Err(ForecastError::FitFailed("non-finite AIC".to_string()));
        }

        // Innovations on the differenced scale equal residuals on the original
        // scale, shifted by the observations lost to differencing.
        let mut fitted = vec![f64::NAN; values.len()];
        let mut residuals = vec![0.0; values.len()];
        for t in offset..values.len() {
            let e = innovations[t - offset];
            fitted[t] = values[t] - e;
            residuals[t] = e;
        }

        Ok(Self {
            spec,
            coefficients,
            ar_poly,
            ma_poly,
            original: values.to_vec(),
            differenced,
            innovations,
            fitted,
            residuals,
            residual_variance,
            log_likelihood,
            aic,
            bic,
            nobs,
            converged,
        })
    }

    fn predict(&self, horizon: usize) -> Forecast {
        if horizon == 0 {
            return Forecast::new();
        }

        let intercept = self.coefficients.intercept;
        let lags = ar_lags(&self.ar_poly);
        let ma_lags = &self.ma_poly[1..];

        let mut extended = self.differenced.clone();
        let mut shocks = self.innovations.clone();
        for _ in 0..horizon {
            let t = extended.len();
            let mut pred = intercept;
            for (i, a) in lags.iter().enumerate().take(t) {
                pred += a * (extended[t - 1 - i] - intercept);
            }
            for (j, m) in ma_lags.iter().enumerate().take(t) {
                pred += m * shocks[t - 1 - j];
            }
            extended.push(pred);
            shocks.push(0.0);
        }

        let forecast_diff = &extended[self.differenced.len()..];
        let predictions = integrate(
            forecast_diff,
            &self.original,
            self.spec.d,
            self.spec.cap_d,
            self.spec.period(),
        );
        Forecast::from_values(predictions)
    }

    /// MA(∞) weights of the integrated process, `ψ_0 = 1`.
    fn psi_weights(&self, horizon: usize) -> Vec<f64> {
        let full_ar = multiply_polynomials(
            &self.ar_poly,
            &differencing_polynomial(self.spec.d, self.spec.cap_d, self.spec.period()),
        );

        let mut psi = vec![0.0; horizon];
        if horizon == 0 {
            return psi;
        }
        psi[0] = 1.0;
        for j in 1..horizon {
            let mut value = self.ma_poly.get(j).copied().unwrap_or(0.0);
            for i in 1..=j.min(full_ar.len() - 1) {
                value -= full_ar[i] * psi[j - i];
            }
            psi[j] = value;
        }
        psi
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval level must lie in (0, 1), got {level}"
            )));
        }

        let forecast = self.predict(horizon);
        if horizon == 0 {
            return Ok(forecast);
        }

        let z = quantile_normal((1.0 + level) / 2.0);
        let preds = forecast.primary();
        let psi = self.psi_weights(horizon);

        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        let mut cumulative = 0.0;
        for (h, weight) in psi.iter().enumerate() {
            cumulative += weight * weight;
            let se = (self.residual_variance * cumulative).sqrt();
            lower.push(preds[h] - z * se);
            upper.push(preds[h] + z * se);
        }

        Ok(Forecast::from_values_with_intervals(
            preds.to_vec(),
            lower,
            upper,
        ))
    }

    fn summary(&self, model: &str) -> String {
        let c = &self.coefficients;
        let mut out = String::new();
        let _ = writeln!(out, "Model: {model}");
        let _ = writeln!(out, "Observations: {}", self.original.len());
        let _ = writeln!(out, "Effective observations: {}", self.nobs);
        let _ = writeln!(out, "Log likelihood: {:.4}", self.log_likelihood);
        let _ = writeln!(out, "AIC: {:.4}", self.aic);
        let _ = writeln!(out, "BIC: {:.4}", self.bic);
        let _ = writeln!(out, "sigma2: {:.6}", self.residual_variance);
        if self.spec.constant {
            let _ = writeln!(out, "const: {:.6}", c.intercept);
        }
        for (i, v) in c.ar.iter().enumerate() {
            let _ = writeln!(out, "ar.L{}: {v:.6}", i + 1);
        }
        for (i, v) in c.ma.iter().enumerate() {
            let _ = writeln!(out, "ma.L{}: {v:.6}", i + 1);
        }
        for (i, v) in c.seasonal_ar.iter().enumerate() {
            let _ = writeln!(out, "ar.S.L{}: {v:.6}", (i + 1) * self.spec.s);
        }
        for (i, v) in c.seasonal_ma.iter().enumerate() {
            let _ = writeln!(out, "ma.S.L{}: {v:.6}", (i + 1) * self.spec.s);
        }
        let _ = write!(
            out,
            "Converged: {}",
            if self.converged { "yes" } else { "no" }
        );
        out
    }
}

/// Minimize the conditional sum of squares over the constant (if any) and
/// the ARMA terms. Residuals before `skip` drive the recursion but are left
/// out of the sum.
///
/// Returns the coefficients and whether the optimizer reported convergence.
fn estimate_coefficients(w: &[f64], spec: &SARIMASpec, skip: usize) -> (Coefficients, bool) {
    let mu = if spec.constant { mean(&w[skip..]) } else { 0.0 };
    let n_terms = spec.num_terms();
    if n_terms == 0 {
        return (
            Coefficients {
                intercept: mu,
                ..Default::default()
            },
            true,
        );
    }

    let period = spec.period();
    let mut initial = Vec::with_capacity(spec.num_params());
    let mut bounds = Vec::with_capacity(spec.num_params());
    if spec.constant {
        initial.push(mu);
        bounds.push((f64::NEG_INFINITY, f64::INFINITY));
    }
    for order in [spec.p, spec.q, spec.cap_p, spec.cap_q] {
        initial.extend((0..order).map(|i| 0.1 / (i + 1) as f64));
    }
    bounds.extend(std::iter::repeat((-COEFFICIENT_BOUND, COEFFICIENT_BOUND)).take(n_terms));

    let config = NelderMeadConfig {
        max_iter: 1000,
        tolerance: 1e-8,
        ..Default::default()
    };

    let result = nelder_mead(
        |params| {
            let c = Coefficients::from_params(params, spec);
            let ar_poly = c.ar_polynomial(period);
            let ma_poly = c.ma_polynomial(period);
            let lags = ar_lags(&ar_poly);
            css_residuals(w, c.intercept, &lags, &ma_poly[1..])[skip..]
                .iter()
                .map(|e| e * e)
                .sum()
        },
        &initial,
        Some(&bounds),
        config,
    );

    (
        Coefficients::from_params(&result.optimal_point, spec),
        result.converged,
    )
}

/// ARIMA forecasting model.
///
/// ARIMA(p, d, q) combines:
/// - AR(p): Autoregressive component
/// - I(d): Differencing for stationarity
/// - MA(q): Moving average component
///
/// No constant is estimated unless requested with
/// [`with_constant`](Self::with_constant); with `d > 0` the constant acts as
/// a drift term.
#[derive(Debug, Clone)]
pub struct ARIMA {
    spec: ARIMASpec,
    burn_in: usize,
    state: Option<FittedState>,
}

impl ARIMA {
    /// Create a new ARIMA model without a constant.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self::from_spec(ARIMASpec::new(p, d, q))
    }

    pub fn from_spec(spec: ARIMASpec) -> Self {
        Self {
            spec,
            burn_in: 0,
            state: None,
        }
    }

    pub fn with_constant(mut self, constant: bool) -> Self {
        self.spec = self.spec.with_constant(constant);
        self
    }

    /// Leave the first `burn_in` observations out of the likelihood.
    ///
    /// Models fitted with the same `burn_in`, at least as large as their
    /// differencing loss, have AIC values computed on the same observations.
    pub fn with_burn_in(mut self, burn_in: usize) -> Self {
        self.burn_in = burn_in;
        self
    }

    /// Get the model specification.
    pub fn spec(&self) -> ARIMASpec {
        self.spec
    }

    /// Get AR coefficients.
    pub fn ar_coefficients(&self) -> &[f64] {
        self.state
            .as_ref()
            .map(|s| s.coefficients.ar.as_slice())
            .unwrap_or_default()
    }

    /// Get MA coefficients.
    pub fn ma_coefficients(&self) -> &[f64] {
        self.state
            .as_ref()
            .map(|s| s.coefficients.ma.as_slice())
            .unwrap_or_default()
    }

    /// Get the intercept.
    pub fn intercept(&self) -> f64 {
        self.state.as_ref().map_or(0.0, |s| s.coefficients.intercept)
    }

    /// Get BIC.
    pub fn bic(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.bic)
    }

    /// Innovation variance estimate.
    pub fn residual_variance(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.residual_variance)
    }

    fn label(&self) -> String {
        format!("ARIMA({}, {}, {})", self.spec.p, self.spec.d, self.spec.q)
    }
}

impl Default for ARIMA {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl Forecaster for ARIMA {
    fn fit(&mut self, values: &[f64]) -> Result<()> {
        self.state = Some(FittedState::estimate(values, self.spec.into(), self.burn_in)?);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let state = self.state.as_ref().ok_or(ForecastError::FitRequired)?;
        Ok(state.predict(horizon))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let state = self.state.as_ref().ok_or(ForecastError::FitRequired)?;
        state.predict_with_intervals(horizon, level)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.fitted.as_slice())
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.residuals.as_slice())
    }

    fn aic(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.aic)
    }

    fn name(&self) -> &str {
        "ARIMA"
    }

    fn summary(&self) -> String {
        match &self.state {
            Some(state) => state.summary(&self.label()),
            None => format!("Model: {} (not fitted)", self.label()),
        }
    }
}

/// Seasonal ARIMA model `(p, d, q) x (P, D, Q, s)`.
///
/// The seasonal and non-seasonal polynomials are multiplied, so an
/// `(1, 0, 0) x (1, 0, 0, s)` model carries AR lags `1`, `s` and `s + 1`.
#[derive(Debug, Clone)]
pub struct SARIMA {
    spec: SARIMASpec,
    burn_in: usize,
    state: Option<FittedState>,
}

impl SARIMA {
    /// Create a new seasonal ARIMA model.
    pub fn new(spec: SARIMASpec) -> Self {
        Self {
            spec,
            burn_in: 0,
            state: None,
        }
    }

    /// Leave the first `burn_in` observations out of the likelihood.
    pub fn with_burn_in(mut self, burn_in: usize) -> Self {
        self.burn_in = burn_in;
        self
    }

    /// Get the model specification.
    pub fn spec(&self) -> SARIMASpec {
        self.spec
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        self.state
            .as_ref()
            .map(|s| s.coefficients.ar.as_slice())
            .unwrap_or_default()
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        self.state
            .as_ref()
            .map(|s| s.coefficients.ma.as_slice())
            .unwrap_or_default()
    }

    pub fn seasonal_ar_coefficients(&self) -> &[f64] {
        self.state
            .as_ref()
            .map(|s| s.coefficients.seasonal_ar.as_slice())
            .unwrap_or_default()
    }

    pub fn seasonal_ma_coefficients(&self) -> &[f64] {
        self.state
            .as_ref()
            .map(|s| s.coefficients.seasonal_ma.as_slice())
            .unwrap_or_default()
    }

    /// Get BIC.
    pub fn bic(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.bic)
    }

    fn label(&self) -> String {
        let s = &self.spec;
        format!(
            "SARIMA({}, {}, {})x({}, {}, {}, {})",
            s.p, s.d, s.q, s.cap_p, s.cap_d, s.cap_q, s.s
        )
    }
}

impl Forecaster for SARIMA {
    fn fit(&mut self, values: &[f64]) -> Result<()> {
        self.state = Some(FittedState::estimate(values, self.spec, self.burn_in)?);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let state = self.state.as_ref().ok_or(ForecastError::FitRequired)?;
        Ok(state.predict(horizon))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let state = self.state.as_ref().ok_or(ForecastError::FitRequired)?;
        state.predict_with_intervals(horizon, level)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.fitted.as_slice())
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.residuals.as_slice())
    }

    fn aic(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.aic)
    }

    fn name(&self) -> &str {
        "SARIMA"
    }

    fn summary(&self) -> String {
        match &self.state {
            Some(state) => state.summary(&self.label()),
            None => format!("Model: {} (not fitted)", self.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn trend_with_wiggle(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 10.0 + 0.5 * i as f64 + (i as f64 * 0.3).sin())
            .collect()
    }

    #[test]
    fn arima_basic_fit() {
        let mut model = ARIMA::new(1, 1, 1);
        model.fit(&trend_with_wiggle(50)).unwrap();

        assert_eq!(model.ar_coefficients().len(), 1);
        assert_eq!(model.ma_coefficients().len(), 1);

        let forecast = model.predict(5).unwrap();
        assert_eq!(forecast.horizon(), 5);
    }

    #[test]
    fn arima_ar1() {
        // y_t = 0.7 * y_{t-1} + e_t
        let mut values = vec![10.0];
        for i in 1..100 {
            values.push(0.7 * values[i - 1] + (i as f64 * 0.1).sin());
        }

        let mut model = ARIMA::new(1, 0, 0);
        model.fit(&values).unwrap();

        assert!(model.ar_coefficients()[0] > 0.3);
        assert_eq!(model.predict(5).unwrap().horizon(), 5);
    }

    #[test]
    fn arima_white_noise_mean() {
        let values = vec![3.0, 5.0, 4.0, 6.0, 2.0, 4.0];
        let mut model = ARIMA::new(0, 0, 0).with_constant(true);
        model.fit(&values).unwrap();

        assert_relative_eq!(model.intercept(), 4.0, epsilon = 1e-12);
        let forecast = model.predict(3).unwrap();
        for v in forecast.primary() {
            assert_relative_eq!(*v, 4.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn arima_with_differencing_continues_trend() {
        let values: Vec<f64> = (0..50)
            .map(|i| 10.0 + 2.0 * i as f64 + (i as f64).cos() * 0.2)
            .collect();

        let mut model = ARIMA::new(1, 1, 0).with_constant(true);
        model.fit(&values).unwrap();

        let preds = model.predict(5).unwrap();
        let last = values[values.len() - 1];
        assert!(preds.primary()[0] > last);
        assert!(preds.primary()[4] > preds.primary()[0]);
    }

    #[test]
    fn arima_random_walk_intervals_widen_like_sqrt_h() {
        let values: Vec<f64> = (0..40)
            .map(|i| 100.0 + i as f64 + ((i * 7) % 5) as f64)
            .collect();
        let mut model = ARIMA::new(0, 1, 0);
        model.fit(&values).unwrap();

        let forecast = model.predict_with_intervals(4, 0.95).unwrap();
        let lower = forecast.lower().unwrap();
        let upper = forecast.upper().unwrap();
        let width1 = upper[0] - lower[0];
        let width4 = upper[3] - lower[3];

        // psi weights are all one for a random walk.
        assert_relative_eq!(width4 / width1, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn arima_intervals_contain_point() {
        let mut model = ARIMA::new(1, 1, 1);
        model.fit(&trend_with_wiggle(50)).unwrap();

        let forecast = model.predict_with_intervals(5, 0.95).unwrap();
        let preds = forecast.primary();
        let lower = forecast.lower().unwrap();
        let upper = forecast.upper().unwrap();
        for i in 0..5 {
            assert!(lower[i].is_finite());
            assert!(lower[i] <= preds[i] && preds[i] <= upper[i]);
        }
    }

    #[test]
    fn arima_rejects_bad_level() {
        let mut model = ARIMA::new(0, 1, 0);
        model.fit(&trend_with_wiggle(20)).unwrap();

        assert!(matches!(
            model.predict_with_intervals(3, 1.5),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn arima_information_criteria() {
        let values: Vec<f64> = (0..50).map(|i| 10.0 + (i as f64 * 0.3).sin()).collect();
        let mut model = ARIMA::new(1, 0, 1);
        model.fit(&values).unwrap();

        assert!(model.aic().unwrap().is_finite());
        assert!(model.bic().unwrap().is_finite());
    }

    #[test]
    fn arima_constant_series_fails() {
        let mut model = ARIMA::new(0, 0, 0).with_constant(true);
        assert!(matches!(
            model.fit(&[7.0; 12]),
            Err(ForecastError::FitFailed(_))
        ));
    }

    #[test]
    fn arima_insufficient_data() {
        let mut model = ARIMA::new(2, 1, 1);
        assert!(matches!(
            model.fit(&[1.0, 2.0, 3.0]),
            Err(ForecastError::InsufficientData { .. })
        ));
    }

    #[test]
    fn arima_requires_fit() {
        let model = ARIMA::new(1, 1, 1);
        assert!(matches!(model.predict(5), Err(ForecastError::FitRequired)));
        assert!(!model.is_fitted());
    }

    #[test]
    fn arima_zero_horizon() {
        let values: Vec<f64> = (0..30).map(|i| i as f64 + (i % 3) as f64).collect();
        let mut model = ARIMA::new(1, 1, 1);
        model.fit(&values).unwrap();

        assert_eq!(model.predict(0).unwrap().horizon(), 0);
    }

    #[test]
    fn arima_spec() {
        let spec = ARIMASpec::new(2, 1, 3);
        assert_eq!(spec.num_params(), 5);
        assert_eq!(spec.with_constant(true).num_params(), 6);
        assert_eq!(ARIMASpec::default(), ARIMASpec::new(1, 1, 1));
    }

    #[test]
    fn arima_without_constant_has_no_drift() {
        let values = [10.0, 12.0, 14.0, 15.0, 18.0, 20.0, 21.0, 24.0];
        let mut model = ARIMA::new(0, 1, 0);
        model.fit(&values).unwrap();

        assert_eq!(model.intercept(), 0.0);
        for v in model.predict(4).unwrap().primary() {
            assert_relative_eq!(*v, 24.0, epsilon = 1e-12);
        }
        assert!(!model.summary().contains("const"));

        let mut drifting = ARIMA::new(0, 1, 0).with_constant(true);
        drifting.fit(&values).unwrap();
        assert_relative_eq!(drifting.intercept(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(drifting.predict(1).unwrap().primary()[0], 26.0, epsilon = 1e-12);
        assert!(drifting.summary().contains("const"));
    }

    fn gaussian_aic(squares: impl Iterator<Item = f64>, k: f64) -> f64 {
        let squares: Vec<f64> = squares.collect();
        let n = squares.len() as f64;
        let variance = squares.iter().sum::<f64>() / n;
        n * (1.0 + variance.ln() + (2.0 * std::f64::consts::PI).ln()) + 2.0 * k
    }

    #[test]
    fn burn_in_aligns_likelihood_sample_across_differencing() {
        let values = [3.0, -1.0, 2.0, 0.5, -2.0, 1.5, -0.5, 2.5, -1.5, 1.0];

        let mut level = ARIMA::new(0, 0, 0).with_burn_in(1);
        level.fit(&values).unwrap();
        let expected = gaussian_aic(values[1..].iter().map(|v| v * v), 0.0);
        assert_relative_eq!(level.aic().unwrap(), expected, epsilon = 1e-9);

        let mut differenced = ARIMA::new(0, 1, 0).with_burn_in(1);
        differenced.fit(&values).unwrap();
        let expected = gaussian_aic(values.windows(2).map(|w| (w[1] - w[0]).powi(2)), 0.0);
        assert_relative_eq!(differenced.aic().unwrap(), expected, epsilon = 1e-9);
    }

    #[test]
    fn burn_in_keeps_residuals_for_every_observation() {
        let values = trend_with_wiggle(30);
        let mut model = ARIMA::new(2, 0, 0).with_burn_in(3);
        model.fit(&values).unwrap();

        let fitted = model.fitted_values().unwrap();
        assert!(fitted.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn burn_in_longer_than_series_fails() {
        let mut model = ARIMA::new(0, 0, 0).with_burn_in(10);
        assert!(matches!(
            model.fit(&[1.0, 2.0, 3.0, 4.0]),
            Err(ForecastError::InsufficientData { needed: 11, got: 4 })
        ));
    }

    #[test]
    fn arima_fitted_and_residuals_reconstruct_series() {
        let values = trend_with_wiggle(30);
        let mut model = ARIMA::new(1, 1, 0);
        model.fit(&values).unwrap();

        let fitted = model.fitted_values().unwrap();
        let residuals = model.residuals().unwrap();
        assert_eq!(fitted.len(), values.len());
        assert!(fitted[0].is_nan());
        for t in 2..values.len() {
            assert_relative_eq!(fitted[t] + residuals[t], values[t], epsilon = 1e-9);
        }
    }

    #[test]
    fn arima_summary_lists_parameters() {
        let mut model = ARIMA::new(1, 1, 1);
        assert!(model.summary().contains("not fitted"));

        model.fit(&trend_with_wiggle(40)).unwrap();
        let summary = model.summary();
        assert!(summary.contains("ARIMA(1, 1, 1)"));
        assert!(summary.contains("ar.L1"));
        assert!(summary.contains("ma.L1"));
        assert!(summary.contains("AIC"));
    }

    #[test]
    fn sarima_spec_lags() {
        let spec = SARIMASpec::new(1, 1, 0, 1, 1, 1, 4);
        assert_eq!(spec.max_ar_lag(), 5);
        assert_eq!(spec.max_ma_lag(), 4);
        assert_eq!(spec.differencing_loss(), 5);
        assert_eq!(spec.min_observations(), 12);
        assert_eq!(spec.num_params(), 3);
    }

    #[test]
    fn sarima_without_seasonal_terms_matches_arima() {
        let values = trend_with_wiggle(40);
        let mut arima = ARIMA::new(1, 1, 0);
        let mut sarima = SARIMA::new(SARIMASpec::new(1, 1, 0, 0, 0, 0, 11));
        arima.fit(&values).unwrap();
        sarima.fit(&values).unwrap();

        assert_relative_eq!(arima.aic().unwrap(), sarima.aic().unwrap(), epsilon = 1e-9);
        let a = arima.predict(3).unwrap();
        let s = sarima.predict(3).unwrap();
        for (x, y) in a.primary().iter().zip(s.primary()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-9);
        }
    }

    #[test]
    fn sarima_seasonal_difference_repeats_cycle() {
        let pattern = [2.0, 8.0, 5.0, 1.0];
        // Seasonal differences are 1.0 plus a small wobble that keeps the
        // residual variance positive.
        let values: Vec<f64> = (0..24)
            .map(|i| pattern[i % 4] + (i / 4) as f64 + 0.05 * (i as f64 * 1.3).sin())
            .collect();
        let mut model = SARIMA::new(SARIMASpec::new(0, 0, 0, 0, 1, 0, 4).with_constant(true));
        model.fit(&values).unwrap();

        let forecast = model.predict(4).unwrap();
        for (h, v) in forecast.primary().iter().enumerate() {
            let expected = values[20 + h] + 1.0;
            assert_relative_eq!(*v, expected, epsilon = 0.1);
        }
    }

    #[test]
    fn sarima_seasonal_ar_fits() {
        let values: Vec<f64> = (0..60)
            .map(|i| 50.0 + 5.0 * ((i % 6) as f64 - 2.5) + (i as f64 * 0.37).sin())
            .collect();
        let mut model = SARIMA::new(SARIMASpec::new(0, 0, 0, 1, 0, 0, 6).with_constant(true));
        model.fit(&values).unwrap();

        assert_eq!(model.seasonal_ar_coefficients().len(), 1);
        assert!(model.seasonal_ar_coefficients()[0] > 0.0);
        assert!(model.summary().contains("ar.S.L6"));

        let forecast = model.predict_with_intervals(6, 0.95).unwrap();
        assert!(forecast.has_intervals());
    }

    #[test]
    fn sarima_rejects_period_below_two() {
        let mut model = SARIMA::new(SARIMASpec::new(0, 0, 0, 1, 0, 0, 1));
        assert!(matches!(
            model.fit(&trend_with_wiggle(30)),
            Err(ForecastError::InvalidParameter(_))
        ));
    }
}
