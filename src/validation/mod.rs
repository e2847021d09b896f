//! Statistical validation of input series.
//!
//! # Example
//!
//! ```
//! use country_forecast::validation::{analyze, SIGNIFICANCE_LEVEL};
//!
//! let series = vec![1.0, 1.2, 0.9, 1.1, 1.0, 0.95, 1.05, 1.0, 1.1, 0.9, 1.02, 0.97];
//! let report = analyze(&series, 1);
//! if let Some(p) = report.p_value {
//!     assert_eq!(report.is_stationary, p <= SIGNIFICANCE_LEVEL);
//! }
//! ```

pub mod stationarity;

pub use stationarity::{
    adf_test, analyze, AdfResult, CriticalValues, StationarityReport, CONSTANT_INPUT_ERROR,
    SIGNIFICANCE_LEVEL,
};
