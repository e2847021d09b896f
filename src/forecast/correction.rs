//! Post-hoc adjustment of point forecasts towards a target value.

use serde::{Deserialize, Serialize};

use crate::core::Series;
use crate::error::{ForecastError, Result};

/// What happens to years after the target year in linear mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TailPolicy {
    /// Leave them as forecast.
    #[default]
    Untouched,
    /// Keep following the correction ramp.
    Continuous,
    /// Hold the target value.
    Short,
}

/// Correction algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrectionMode {
    /// Every year from the start year through the target year becomes the
    /// target value.
    Start,
    /// Ramp linearly from the start year's value to the target value.
    Linear(TailPolicy),
}

impl CorrectionMode {
    /// Map the `start`, `continuous` and `short` option flags to a mode.
    ///
    /// `start` wins over the others; `continuous` together with `short` is
    /// ambiguous and rejected.
    pub fn from_flags(start: bool, continuous: bool, short: bool) -> Result<Self> {
        if start {
            return Ok(CorrectionMode::Start);
        }
        match (continuous, short) {
            (true, true) => Err(ForecastError::InvalidParameter(
                "continuous and short corrections are mutually exclusive".to_string(),
            )),
            (true, false) => Ok(CorrectionMode::Linear(TailPolicy::Continuous)),
            (false, true) => Ok(CorrectionMode::Linear(TailPolicy::Short)),
            (false, false) => Ok(CorrectionMode::Linear(TailPolicy::Untouched)),
        }
    }
}

/// A correction to apply to one forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRequest {
    pub target_year: i32,
    /// First corrected year; defaults to the first forecast year.
    pub start_year: Option<i32>,
    pub target_value: f64,
    pub mode: CorrectionMode,
}

impl CorrectionRequest {
    pub fn new(target_year: i32, target_value: f64, mode: CorrectionMode) -> Self {
        Self {
            target_year,
            start_year: None,
            target_value,
            mode,
        }
    }

    pub fn with_start_year(mut self, year: i32) -> Self {
        self.start_year = Some(year);
        self
    }
}

/// Apply `request` to the point forecasts in `values`, then floor every
/// value at zero.
///
/// The year index never changes. Nothing is modified when the request is
/// rejected.
///
/// # Errors
/// * `EmptyData` for an empty series
/// * `YearNotInIndex` when the target or start year is not a forecast year
/// * `InvalidParameter` for a non-finite target, or a linear correction
///   whose start year is not before the target year
///
/// # Example
/// ```
/// use country_forecast::core::Series;
/// use country_forecast::forecast::{correct, CorrectionMode, CorrectionRequest, TailPolicy};
///
/// let mut values = Series::from_consecutive(2024, &[5.0, 6.0, 7.0, 8.0]);
/// let request = CorrectionRequest::new(2026, 10.0, CorrectionMode::Linear(TailPolicy::Continuous));
/// correct(&mut values, &request).unwrap();
///
/// assert_eq!(values.values(), vec![5.0, 7.5, 10.0, 12.5]);
/// ```
pub fn correct(values: &mut Series, request: &CorrectionRequest) -> Result<()> {
    let first_year = values.first_year().ok_or(ForecastError::EmptyData)?;
    let target_year = request.target_year;
    let target = request.target_value;
    if !target.is_finite() {
        return Err(ForecastError::InvalidParameter(format!(
            "target value {target} is not finite"
        )));
    }
    if !values.contains_year(target_year) {
        return Err(ForecastError::YearNotInIndex(target_year));
    }
    let start_year = request.start_year.unwrap_or(first_year);
    let start_value = values
        .get(start_year)
        .ok_or(ForecastError::YearNotInIndex(start_year))?;

    match request.mode {
        CorrectionMode::Start => {
            for (year, value) in values.iter_mut() {
                if (start_year..=target_year).contains(&year) {
                    *value = target;
                }
            }
        }
        CorrectionMode::Linear(tail) => {
            if start_year >= target_year {
                return Err(ForecastError::InvalidParameter(format!(
                    "linear correction needs a start year before {target_year}, got {start_year}"
                )));
            }
            let slope = (target - start_value) / f64::from(target_year - start_year);
            for (year, value) in values.iter_mut() {
                if (start_year..=target_year).contains(&year) {
                    *value = start_value + slope * f64::from(year - start_year);
                } else if year > target_year {
                    match tail {
                        TailPolicy::Untouched => {}
                        TailPolicy::Continuous => {
                            *value = target + slope * f64::from(year - target_year);
                        }
                        TailPolicy::Short => *value = target,
                    }
                }
            }
        }
    }

    for (_, value) in values.iter_mut() {
        if *value < 0.0 {
            *value = 0.0;
        }
    }
    Ok(())
}
