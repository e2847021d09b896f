//! Forecast projection, storage and correction.

mod correction;
mod project;
mod store;

pub use correction::{correct, CorrectionMode, CorrectionRequest, TailPolicy};
pub use project::{forecast_fit, project, ForecastKey, ForecastResult, Projection};
pub use store::ForecastStore;
