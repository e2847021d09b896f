//! Core data structures: annual series and model forecasts.

mod forecast;
mod series;

pub use forecast::Forecast;
pub use series::Series;
