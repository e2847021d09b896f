//! ARIMA and SARIMA (Autoregressive Integrated Moving Average) models.
//!
//! This module provides:
//! - ARIMA models with various (p, d, q) specifications
//! - SARIMA models with seasonal components (P, D, Q)\[s\]
//! - An exhaustive order search selecting by AIC

mod diff;
mod model;
mod search;

pub use diff::{difference, difference_full, integrate, seasonal_difference};
pub use model::{ARIMASpec, SARIMASpec, ARIMA, SARIMA};
pub use search::{
    candidate_orders, common_burn_in, search, CandidateOutcome, FittedModel, ModelFamily, ModelFit,
    ModelOrder,
};
