//! Error types for the country-forecast library.

use thiserror::Error;

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur during forecasting operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Forecast bounds are not usable (missing last year, horizon not after it).
    #[error("invalid forecast bounds: {0}")]
    InvalidBounds(String),

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// A single order combination could not be fitted.
    #[error("fit failed: {0}")]
    FitFailed(String),

    /// No combination of a grid search produced a usable model.
    #[error("model optimization failed: no order combination could be fitted")]
    OptimizationFailed,

    /// Entity is not present in the dataset.
    #[error("unknown entity: {0}")]
    UnknownEntity(String),

    /// No stored forecast matches the requested entity or key.
    #[error("no forecast found for {0}")]
    NoForecastFound(String),

    /// Year is not part of the forecast index.
    #[error("year {0} is not part of the forecast index")]
    YearNotInIndex(i32),

    /// Malformed CSV input or output.
    #[error("csv error: {0}")]
    Csv(String),

    /// Underlying I/O failure.
    #[error("io error: {0}")]
    Io(String),
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::Csv(err.to_string())
    }
}

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        ForecastError::Io(err.to_string())
    }
}
