//! Exhaustive ARIMA / SARIMA order search selected by AIC.
//!
//! Every combination of the configured ranges is fitted independently. A
//! failed fit is recorded as an outcome and never stops the search; only a
//! search in which nothing could be fitted is an error.

use std::fmt;
use std::ops::Range;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::core::{Forecast, Series};
use crate::error::{ForecastError, Result};
use crate::models::arima::model::{SARIMASpec, ARIMA, SARIMA};
use crate::models::Forecaster;

/// Orders tried for each of the seasonal components P, D and Q.
const SEASONAL_ORDERS: Range<usize> = 0..2;

/// Model family, as shown in forecast keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ModelFamily {
    Arima,
    Sarimax,
}

impl ModelFamily {
    pub fn tag(&self) -> &'static str {
        match self {
            ModelFamily::Arima => "ARIMA",
            ModelFamily::Sarimax => "SARIMAX",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Model order (p, d, q, P, D, Q, s).
///
/// Plain ARIMA orders carry zero seasonal orders and `s == 0`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ModelOrder {
    /// Non-seasonal AR order.
    pub p: usize,
    /// Non-seasonal differencing order.
    pub d: usize,
    /// Non-seasonal MA order.
    pub q: usize,
    /// Seasonal AR order.
    pub cap_p: usize,
    /// Seasonal differencing order.
    pub cap_d: usize,
    /// Seasonal MA order.
    pub cap_q: usize,
    /// Seasonal period.
    pub s: usize,
}

impl ModelOrder {
    /// Non-seasonal order.
    pub fn arima(p: usize, d: usize, q: usize) -> Self {
        Self {
            p,
            d,
            q,
            cap_p: 0,
            cap_d: 0,
            cap_q: 0,
            s: 0,
        }
    }

    /// Order with a seasonal component of period `s`.
    pub fn sarima(
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
        }
    }

    /// Check if this is a seasonal model.
    pub fn is_seasonal(&self) -> bool {
        self.s > 1 && (self.cap_p > 0 || self.cap_d > 0 || self.cap_q > 0)
    }

    /// `(p, d, q)`.
    pub fn non_seasonal(&self) -> (usize, usize, usize) {
        (self.p, self.d, self.q)
    }

    /// `(P, D, Q, s)`.
    pub fn seasonal(&self) -> (usize, usize, usize, usize) {
        (self.cap_p, self.cap_d, self.cap_q, self.s)
    }
}

impl fmt::Display for ModelOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.p, self.d, self.q)?;
        if self.s > 0 {
            write!(
                f,
                "x({}, {}, {}, {})",
                self.cap_p, self.cap_d, self.cap_q, self.s
            )?;
        }
        Ok(())
    }
}

/// A fitted model of either family.
#[derive(Debug, Clone)]
pub enum FittedModel {
    Arima(ARIMA),
    Sarima(SARIMA),
}

impl FittedModel {
    /// Fit the model described by `order` within `family`.
    ///
    /// The first `burn_in` observations drive the recursion but are left
    /// out of the likelihood.
    pub fn fit(
        values: &[f64],
        order: ModelOrder,
        family: ModelFamily,
        constant: bool,
        burn_in: usize,
    ) -> Result<Self> {
        match family {
            ModelFamily::Arima => {
                let mut model = ARIMA::new(order.p, order.d, order.q)
                    .with_constant(constant)
                    .with_burn_in(burn_in);
                model.fit(values)?;
                Ok(FittedModel::Arima(model))
            }
            ModelFamily::Sarimax => {
                let spec = SARIMASpec::new(
                    order.p,
                    order.d,
                    order.q,
                    order.cap_p,
                    order.cap_d,
                    order.cap_q,
                    order.s,
                )
                .with_constant(constant);
                let mut model = SARIMA::new(spec).with_burn_in(burn_in);
                model.fit(values)?;
                Ok(FittedModel::Sarima(model))
            }
        }
    }

    fn inner(&self) -> &dyn Forecaster {
        match self {
            FittedModel::Arima(m) => m,
            FittedModel::Sarima(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Forecaster {
        match self {
            FittedModel::Arima(m) => m,
            FittedModel::Sarima(m) => m,
        }
    }
}

impl Forecaster for FittedModel {
    fn fit(&mut self, values: &[f64]) -> Result<()> {
        self.inner_mut().fit(values)
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.inner().predict(horizon)
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        self.inner().predict_with_intervals(horizon, level)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.inner().fitted_values()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.inner().residuals()
    }

    fn aic(&self) -> Option<f64> {
        self.inner().aic()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }

    fn summary(&self) -> String {
        self.inner().summary()
    }
}

/// Result of fitting one order combination.
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateOutcome {
    Fitted { order: ModelOrder, aic: f64 },
    Failed { order: ModelOrder, reason: String },
}

impl CandidateOutcome {
    pub fn order(&self) -> ModelOrder {
        match self {
            CandidateOutcome::Fitted { order, .. } | CandidateOutcome::Failed { order, .. } => {
                *order
            }
        }
    }

    /// AIC of a successful fit.
    pub fn aic(&self) -> Option<f64> {
        match self {
            CandidateOutcome::Fitted { aic, .. } => Some(*aic),
            CandidateOutcome::Failed { .. } => None,
        }
    }

    pub fn is_fitted(&self) -> bool {
        matches!(self, CandidateOutcome::Fitted { .. })
    }
}

/// The selected model of a search.
#[derive(Debug, Clone)]
pub struct ModelFit {
    /// Family the search ran in.
    pub family: ModelFamily,
    /// Order with the lowest AIC.
    pub order: ModelOrder,
    /// AIC of the selected model.
    pub aic: f64,
    /// The fitted model itself.
    pub model: FittedModel,
    /// Human-readable parameter report.
    pub summary: String,
    /// Last year of the series the model was fitted on.
    pub last_observed_year: i32,
    /// Every combination tried, in search order.
    pub candidates: Vec<CandidateOutcome>,
}

impl ModelFit {
    /// Number of combinations that could not be fitted.
    pub fn failed_count(&self) -> usize {
        self.candidates.iter().filter(|c| !c.is_fitted()).count()
    }
}

/// Enumerate orders: p outermost, then d, q and the seasonal P, D, Q.
pub fn candidate_orders(config: &SearchConfig) -> Vec<ModelOrder> {
    let mut orders = Vec::new();
    for p in config.p.values() {
        for d in config.d.values() {
            for q in config.q.values() {
                match config.seasonal {
                    None => orders.push(ModelOrder::arima(p, d, q)),
                    Some(seasonal) => {
                        for cap_p in SEASONAL_ORDERS {
                            for cap_d in SEASONAL_ORDERS {
                                for cap_q in SEASONAL_ORDERS {
                                    orders.push(ModelOrder::sarima(
                                        p,
                                        d,
                                        q,
                                        cap_p,
                                        cap_d,
                                        cap_q,
                                        seasonal.period,
                                    ));
                                }
                            }
                        }
                    }
                }
            }
        }
    }
    orders
}

/// Observations lost to differencing by the most differenced candidate.
///
/// Every candidate leaves this many leading observations out of its
/// likelihood, so all AIC values are computed on the same sample.
pub fn common_burn_in(config: &SearchConfig) -> usize {
    let d = config.d.max_value().unwrap_or(0);
    let seasonal = config
        .seasonal
        .map_or(0, |s| SEASONAL_ORDERS.end.saturating_sub(1) * s.period);
    d + seasonal
}

/// Fit every candidate order and keep the one with the strictly lowest AIC.
///
/// All candidates are scored on the observations after
/// [`common_burn_in`]. Ties keep the combination enumerated first.
///
/// # Errors
/// * `InsufficientData` when the series is shorter than
///   `max(p) + max(d) + max(q) + 1`; nothing is fitted
/// * `OptimizationFailed` when no candidate produced a finite AIC
///
/// # Example
/// ```
/// use country_forecast::config::SearchConfig;
/// use country_forecast::core::Series;
/// use country_forecast::models::arima::search;
///
/// let values: Vec<f64> = (0..30).map(|i| 50.0 + i as f64 + (i as f64).sin()).collect();
/// let series = Series::from_consecutive(1990, &values);
///
/// let fit = search(&series, &SearchConfig::default()).unwrap();
/// assert_eq!(fit.candidates.len(), 8);
/// assert_eq!(fit.last_observed_year, 2019);
/// ```
pub fn search(series: &Series, config: &SearchConfig) -> Result<ModelFit> {
    let needed = config.min_observations();
    if series.len() < needed {
        return Err(ForecastError::InsufficientData {
            needed,
            got: series.len(),
        });
    }
    let last_observed_year = series.last_year().ok_or(ForecastError::EmptyData)?;

    let values = series.values();
    let family = config.family();
    let burn_in = common_burn_in(config);
    let mut candidates = Vec::new();
    let mut best: Option<(ModelOrder, f64, FittedModel)> = None;

    for order in candidate_orders(config) {
        let fitted = FittedModel::fit(&values, order, family, config.include_constant, burn_in)
            .and_then(|model| match model.aic() {
                Some(aic) if aic.is_finite() => Ok((model, aic)),
                _ => Err(ForecastError::FitFailed("non-finite AIC".to_string())),
            });

        match fitted {
            Ok((model, aic)) => {
                candidates.push(CandidateOutcome::Fitted { order, aic });
                if best.as_ref().map_or(true, |(_, best_aic, _)| aic < *best_aic) {
                    best = Some((order, aic, model));
                }
            }
            Err(e) => {
                debug!("{family} {order} failed: {e}");
                candidates.push(CandidateOutcome::Failed {
                    order,
                    reason: e.to_string(),
                });
            }
        }
    }

    let (order, aic, model) = best.ok_or(ForecastError::OptimizationFailed)?;
    info!(
        "selected {family} {order} with AIC {aic:.4} ({} of {} candidates fitted)",
        candidates.iter().filter(|c| c.is_fitted()).count(),
        candidates.len()
    );

    Ok(ModelFit {
        family,
        order,
        aic,
        summary: model.summary(),
        model,
        last_observed_year,
        candidates,
    })
}
