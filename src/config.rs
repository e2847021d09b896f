//! Configuration for the stationarity, search and forecasting stages.
//!
//! Each stage takes a plain struct with `Default` and `with_*` builders.
//! The `parse_*` helpers turn free-text inputs (as typed into a form) into
//! values, falling back to the documented defaults on malformed input.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::models::arima::ModelFamily;

/// Seasonal period used when none (or an unusable one) is given.
pub const DEFAULT_SEASONAL_PERIOD: usize = 11;

/// Forecast horizon year used when none (or an unusable one) is given.
pub const DEFAULT_HORIZON_YEAR: i32 = 2100;

/// Coverage of the forecast prediction intervals.
pub const DEFAULT_INTERVAL_LEVEL: f64 = 0.95;

/// Half-open range of candidate orders, `start..end`.
///
/// # Example
/// ```
/// use country_forecast::config::OrderRange;
///
/// assert_eq!(OrderRange::parse("1,3"), OrderRange::new(1, 3));
/// assert_eq!(OrderRange::parse("oops"), OrderRange::default());
/// assert_eq!(OrderRange::default().values().collect::<Vec<_>>(), vec![0, 1]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderRange {
    start: usize,
    end: usize,
}

impl OrderRange {
    /// Create a range; `end <= start` gives an empty range.
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Range holding exactly one order.
    pub fn single(value: usize) -> Self {
        Self::new(value, value + 1)
    }

    /// Parse `"start,end"`, falling back to `0,2`.
    pub fn parse(text: &str) -> Self {
        Self::parse_or(text, Self::default())
    }

    /// Parse `"start,end"`, falling back to `default` when the text is not
    /// two non-negative integers with `start < end`.
    pub fn parse_or(text: &str, default: Self) -> Self {
        let mut parts = text.split(',').map(|p| p.trim().parse::<usize>());
        match (parts.next(), parts.next(), parts.next()) {
            (Some(Ok(start)), Some(Ok(end)), None) if start < end => Self::new(start, end),
            _ => default,
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Candidate orders in ascending order.
    pub fn values(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Largest candidate order, if any.
    pub fn max_value(&self) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            Some(self.end - 1)
        }
    }
}

impl Default for OrderRange {
    fn default() -> Self {
        Self::new(0, 2)
    }
}

impl fmt::Display for OrderRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.start, self.end)
    }
}

/// Seasonal component of the search.
///
/// Seasonal orders P, D and Q each range over `{0, 1}`; only the period is
/// configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalConfig {
    pub period: usize,
}

impl SeasonalConfig {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Parse a period, falling back to 11 when the text is not an integer
    /// of at least 2.
    pub fn parse(text: &str) -> Self {
        match text.trim().parse::<usize>() {
            Ok(period) if period >= 2 => Self::new(period),
            _ => Self::default(),
        }
    }
}

impl Default for SeasonalConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SEASONAL_PERIOD)
    }
}

/// Configuration for the order grid search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Non-seasonal AR orders.
    pub p: OrderRange,
    /// Non-seasonal differencing orders.
    pub d: OrderRange,
    /// Non-seasonal MA orders.
    pub q: OrderRange,
    /// Seasonal component; `None` searches plain ARIMA models.
    pub seasonal: Option<SeasonalConfig>,
    /// Estimate a constant (a drift once differenced) in every candidate.
    #[serde(default)]
    pub include_constant: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            p: OrderRange::default(),
            d: OrderRange::default(),
            q: OrderRange::default(),
            seasonal: None,
            include_constant: false,
        }
    }
}

impl SearchConfig {
    /// Set the non-seasonal order ranges.
    pub fn with_orders(mut self, p: OrderRange, d: OrderRange, q: OrderRange) -> Self {
        self.p = p;
        self.d = d;
        self.q = q;
        self
    }

    /// Search seasonal models with the given period.
    pub fn with_seasonal_period(mut self, period: usize) -> Self {
        self.seasonal = Some(SeasonalConfig::new(period));
        self
    }

    pub fn with_constant(mut self, include_constant: bool) -> Self {
        self.include_constant = include_constant;
        self
    }

    /// Model family the search produces.
    pub fn family(&self) -> ModelFamily {
        match self.seasonal {
            Some(_) => ModelFamily::Sarimax,
            None => ModelFamily::Arima,
        }
    }

    /// Shortest series accepted before any model is fitted:
    /// `max(p) + max(d) + max(q) + 1`.
    pub fn min_observations(&self) -> usize {
        [self.p, self.d, self.q]
            .iter()
            .map(|r| r.max_value().unwrap_or(0))
            .sum::<usize>()
            + 1
    }
}

/// Configuration for stationarity analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StationarityConfig {
    /// Maximum number of differencing steps; 0 runs the plain test.
    pub max_diff: usize,
}

impl StationarityConfig {
    pub fn with_max_diff(mut self, max_diff: usize) -> Self {
        self.max_diff = max_diff;
        self
    }
}

/// Configuration for forecast projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Last forecast year, inclusive.
    pub horizon_year: i32,
    /// Floor negative point forecasts at zero.
    pub clamp_negative: bool,
    /// Prediction interval coverage.
    pub level: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_year: DEFAULT_HORIZON_YEAR,
            clamp_negative: false,
            level: DEFAULT_INTERVAL_LEVEL,
        }
    }
}

impl ForecastConfig {
    pub fn with_horizon_year(mut self, year: i32) -> Self {
        self.horizon_year = year;
        self
    }

    pub fn with_clamp_negative(mut self, clamp: bool) -> Self {
        self.clamp_negative = clamp;
        self
    }

    /// Parse a horizon year, falling back to 2100.
    pub fn parse_horizon_year(text: &str) -> i32 {
        text.trim().parse().unwrap_or(DEFAULT_HORIZON_YEAR)
    }
}

/// Which series the batch stages read: one variable over an inclusive
/// year window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesSelection {
    pub variable: String,
    pub start_year: i32,
    pub end_year: i32,
}

impl SeriesSelection {
    pub fn new(variable: impl Into<String>, start_year: i32, end_year: i32) -> Self {
        Self {
            variable: variable.into(),
            start_year,
            end_year,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_range_parses_pairs() {
        assert_eq!(OrderRange::parse("0,3"), OrderRange::new(0, 3));
        assert_eq!(OrderRange::parse(" 1 , 2 "), OrderRange::new(1, 2));
    }

    #[test]
    fn order_range_falls_back_on_malformed_text() {
        for text in ["", "1", "1,2,3", "a,b", "-1,2", "3,1", "2,2"] {
            assert_eq!(OrderRange::parse(text), OrderRange::new(0, 2), "{text:?}");
        }
        let custom = OrderRange::new(1, 4);
        assert_eq!(OrderRange::parse_or("x", custom), custom);
    }

    #[test]
    fn order_range_values_and_max() {
        let range = OrderRange::new(1, 4);
        assert_eq!(range.values().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(range.max_value(), Some(3));
        assert_eq!(range.to_string(), "1,4");

        let empty = OrderRange::new(3, 1);
        assert!(empty.is_empty());
        assert_eq!(empty.max_value(), None);
    }

    #[test]
    fn seasonal_period_defaults() {
        assert_eq!(SeasonalConfig::parse("4").period, 4);
        assert_eq!(SeasonalConfig::parse("").period, 11);
        assert_eq!(SeasonalConfig::parse("1").period, 11);
    }

    #[test]
    fn search_config_minimum_length() {
        let config = SearchConfig::default();
        assert_eq!(config.min_observations(), 4);
        assert_eq!(config.family(), ModelFamily::Arima);

        let config = SearchConfig::default()
            .with_orders(OrderRange::new(0, 3), OrderRange::single(1), OrderRange::new(0, 2))
            .with_seasonal_period(11);
        assert_eq!(config.min_observations(), 5);
        assert_eq!(config.family(), ModelFamily::Sarimax);
    }

    #[test]
    fn horizon_year_defaults() {
        assert_eq!(ForecastConfig::parse_horizon_year("2050"), 2050);
        assert_eq!(ForecastConfig::parse_horizon_year("soon"), 2100);
        assert_eq!(ForecastConfig::default().horizon_year, 2100);
        assert!(!ForecastConfig::default().clamp_negative);
    }
}
