//! # country-forecast
//!
//! Annual country-level time series forecasting.
//!
//! The pipeline loads entity × variable series from CSV, tests them for
//! stationarity with the Augmented Dickey-Fuller test, searches ARIMA or
//! SARIMAX orders by AIC, projects the selected model to a horizon year with
//! prediction intervals and lets the user reshape the projection towards a
//! target value. Export tables and chart data are derived from the stored
//! forecasts.
//!
//! ```
//! use country_forecast::prelude::*;
//!
//! let csv = "Country,Date,Coal\n".to_string()
//!     + &(0..30)
//!         .map(|i| format!("France,{},{}\n", 1990 + i, 100.0 - 2.0 * i as f64 + (i as f64).sin()))
//!         .collect::<String>();
//! let dataset = read_csv(csv.as_bytes()).unwrap();
//! let selection = SeriesSelection::new("Coal", 1990, 2019);
//!
//! let fits = run_search(&dataset, &["France"], &selection, &SearchConfig::default());
//! let mut store = ForecastStore::new();
//! let keys = run_forecasts(&fits, &ForecastConfig::default().with_horizon_year(2040), &mut store);
//!
//! let key = keys["France"].as_ref().unwrap();
//! assert_eq!(store.get(key).unwrap().values().len(), 21);
//! ```

#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod core;
pub mod data;
pub mod error;
pub mod export;
pub mod forecast;
pub mod models;
pub mod pipeline;
pub mod plot;
pub mod utils;
pub mod validation;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::config::{
        ForecastConfig, OrderRange, SearchConfig, SeriesSelection, StationarityConfig,
    };
    pub use crate::core::{Forecast, Series};
    pub use crate::data::{read_csv, read_csv_path, Dataset};
    pub use crate::error::{ForecastError, Result};
    pub use crate::forecast::{
        correct, CorrectionMode, CorrectionRequest, ForecastKey, ForecastResult, ForecastStore,
        TailPolicy,
    };
    pub use crate::models::arima::{search, ModelFamily, ModelFit, ModelOrder};
    pub use crate::models::Forecaster;
    pub use crate::pipeline::{run_forecasts, run_search, run_stationarity};
    pub use crate::validation::{analyze, StationarityReport};
}
