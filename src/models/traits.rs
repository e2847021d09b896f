//! Forecaster trait defining the common interface for all models.

use crate::core::Forecast;
use crate::error::Result;

/// Common interface for the annual series models.
///
/// Models are fitted on the observed values in year order; predictions are
/// step-indexed, step `h` being `h` years after the last fitted value.
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
pub trait Forecaster {
    /// Fit the model to the values in chronological order.
    fn fit(&mut self, values: &[f64]) -> Result<()>;

    /// Generate predictions for the specified horizon.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// Generate predictions with symmetric prediction intervals at `level`.
    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let _ = level;
        self.predict(horizon)
    }

    /// Get the fitted values (in-sample predictions on the original scale).
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Get the residuals (actual - fitted).
    fn residuals(&self) -> Option<&[f64]>;

    /// Akaike information criterion of the fit.
    fn aic(&self) -> Option<f64>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Human-readable report of the fitted parameters.
    fn summary(&self) -> String;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}
