//! Projection of fitted models onto calendar years.

use std::fmt;

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::ForecastConfig;
use crate::core::Series;
use crate::error::{ForecastError, Result};
use crate::models::arima::{ModelFamily, ModelFit, ModelOrder};
use crate::models::Forecaster;

/// Identifies one stored forecast.
///
/// Displays as `"France (2050) - ARIMA (1, 1, 0)"` or, for seasonal models,
/// `"France (2050) - SARIMAX (1, 1, 0) (11)"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ForecastKey {
    entity: String,
    horizon_year: i32,
    family: ModelFamily,
    order: ModelOrder,
}

impl ForecastKey {
    pub fn new(
        entity: impl Into<String>,
        horizon_year: i32,
        family: ModelFamily,
        order: ModelOrder,
    ) -> Self {
        Self {
            entity: entity.into(),
            horizon_year,
            family,
            order,
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn horizon_year(&self) -> i32 {
        self.horizon_year
    }

    pub fn family(&self) -> ModelFamily {
        self.family
    }

    pub fn order(&self) -> ModelOrder {
        self.order
    }

    /// Seasonal period of SARIMAX forecasts.
    pub fn seasonal_period(&self) -> Option<usize> {
        match self.family {
            ModelFamily::Sarimax => Some(self.order.s),
            ModelFamily::Arima => None,
        }
    }
}

impl fmt::Display for ForecastKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (p, d, q) = self.order.non_seasonal();
        write!(
            f,
            "{} ({}) - {} ({p}, {d}, {q})",
            self.entity, self.horizon_year, self.family
        )?;
        if let Some(period) = self.seasonal_period() {
            write!(f, " ({period})")?;
        }
        Ok(())
    }
}

/// Point forecasts and interval bounds indexed by year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub values: Series,
    pub lower: Series,
    pub upper: Series,
}

/// A stored forecast.
///
/// The three series share one year index that never changes after
/// creation; only the correction step rewrites point values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    key: ForecastKey,
    values: Series,
    lower: Series,
    upper: Series,
}

impl ForecastResult {
    pub fn new(key: ForecastKey, projection: Projection) -> Self {
        Self {
            key,
            values: projection.values,
            lower: projection.lower,
            upper: projection.upper,
        }
    }

    pub fn key(&self) -> &ForecastKey {
        &self.key
    }

    pub fn entity(&self) -> &str {
        self.key.entity()
    }

    /// Point forecasts.
    pub fn values(&self) -> &Series {
        &self.values
    }

    /// Lower interval bound.
    pub fn lower(&self) -> &Series {
        &self.lower
    }

    /// Upper interval bound.
    pub fn upper(&self) -> &Series {
        &self.upper
    }

    pub(crate) fn values_mut(&mut self) -> &mut Series {
        &mut self.values
    }
}

/// Forecast `model` for the years `last_observed_year + 1 ..= horizon_year`.
///
/// With `clamp_negative` negative point forecasts become zero; interval
/// bounds are never clamped.
///
/// # Errors
/// * `InvalidBounds` when there is no last observed year or the horizon is
///   not after it
/// * `FitFailed` when the model returns no intervals or non-finite values
pub fn project(
    model: &dyn Forecaster,
    last_observed_year: Option<i32>,
    horizon_year: i32,
    level: f64,
    clamp_negative: bool,
) -> Result<Projection> {
    let last = last_observed_year.ok_or_else(|| {
        ForecastError::InvalidBounds("fitted series has no observations".to_string())
    })?;
    if horizon_year <= last {
        return Err(ForecastError::InvalidBounds(format!(
            "horizon {horizon_year} is not after the last observed year {last}"
        )));
    }

    let steps = (horizon_year - last) as usize;
    let forecast = model.predict_with_intervals(steps, level)?;
    let (Some(lower), Some(upper)) = (forecast.lower(), forecast.upper()) else {
        return Err(ForecastError::FitFailed(format!(
            "{} produced no prediction intervals",
            model.name()
        )));
    };
    let point = forecast.primary();
    if point
        .iter()
        .chain(lower)
        .chain(upper)
        .any(|v| !v.is_finite())
    {
        return Err(ForecastError::FitFailed(
            "forecast contains non-finite values".to_string(),
        ));
    }

    let years = (last + 1)..=horizon_year;
    let values = years
        .clone()
        .zip(point)
        .map(|(year, &v)| (year, if clamp_negative { v.max(0.0) } else { v }))
        .collect();
    let lower = years.clone().zip(lower.iter().copied()).collect();
    let upper = years.zip(upper.iter().copied()).collect();

    Ok(Projection {
        values,
        lower,
        upper,
    })
}

/// Project a search result for `entity` according to `config`.
pub fn forecast_fit(entity: &str, fit: &ModelFit, config: &ForecastConfig) -> Result<ForecastResult> {
    let key = ForecastKey::new(entity, config.horizon_year, fit.family, fit.order);
    let projection = project(
        &fit.model,
        Some(fit.last_observed_year),
        config.horizon_year,
        config.level,
        config.clamp_negative,
    )?;
    info!(
        "forecast {key}: {} year(s) from {}",
        projection.values.len(),
        fit.last_observed_year + 1
    );
    Ok(ForecastResult::new(key, projection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::arima::ARIMA;

    fn declining_model() -> ARIMA {
        let values: Vec<f64> = (0..25)
            .map(|i| 40.0 - 2.0 * i as f64 + (i as f64 * 1.1).sin())
            .collect();
        let mut model = ARIMA::new(0, 1, 0).with_constant(true);
        model.fit(&values).unwrap();
        model
    }

    #[test]
    fn key_display_matches_labels() {
        let arima = ForecastKey::new("France", 2050, ModelFamily::Arima, ModelOrder::arima(1, 1, 0));
        assert_eq!(arima.to_string(), "France (2050) - ARIMA (1, 1, 0)");

        let sarimax = ForecastKey::new(
            "France",
            2050,
            ModelFamily::Sarimax,
            ModelOrder::sarima(1, 0, 1, 1, 0, 0, 11),
        );
        assert_eq!(sarimax.to_string(), "France (2050) - SARIMAX (1, 0, 1) (11)");
        assert_eq!(sarimax.seasonal_period(), Some(11));
    }

    #[test]
    fn projection_is_indexed_by_year() {
        let model = declining_model();
        let projection = project(&model, Some(2020), 2025, 0.95, false).unwrap();

        assert_eq!(projection.values.years(), vec![2021, 2022, 2023, 2024, 2025]);
        assert_eq!(projection.lower.years(), projection.values.years());
        assert_eq!(projection.upper.years(), projection.values.years());
        for (year, v) in projection.values.iter() {
            let lo = projection.lower.get(year).unwrap();
            let hi = projection.upper.get(year).unwrap();
            assert!(lo <= v && v <= hi);
        }
    }

    #[test]
    fn clamp_applies_to_points_only() {
        let model = declining_model();
        let clamped = project(&model, Some(2000), 2040, 0.95, true).unwrap();
        let raw = project(&model, Some(2000), 2040, 0.95, false).unwrap();

        assert!(raw.values.values().iter().any(|v| *v < 0.0));
        assert!(clamped.values.values().iter().all(|v| *v >= 0.0));
        assert_eq!(clamped.lower, raw.lower);
        assert!(clamped.lower.values().iter().any(|v| *v < 0.0));
    }

    #[test]
    fn invalid_bounds() {
        let model = declining_model();
        assert!(matches!(
            project(&model, None, 2030, 0.95, false),
            Err(ForecastError::InvalidBounds(_))
        ));
        assert!(matches!(
            project(&model, Some(2030), 2030, 0.95, false),
            Err(ForecastError::InvalidBounds(_))
        ));
    }

    #[test]
    fn unfitted_model_is_an_error() {
        let model = ARIMA::new(1, 0, 0);
        assert_eq!(
            project(&model, Some(2000), 2001, 0.95, false).unwrap_err(),
            ForecastError::FitRequired
        );
    }
}
