//! Data preparation for line and stacked-bar charts.
//!
//! Nothing here draws; the functions assemble the series and axis limits
//! a rendering layer needs.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::core::Series;
use crate::data::Dataset;
use crate::error::{ForecastError, Result};
use crate::forecast::{ForecastKey, ForecastStore};

/// Headroom added above the largest plotted value.
const Y_MARGIN: f64 = 1.01;

/// Which part of the data a chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlotKind {
    Historical,
    Forecast,
    #[default]
    Both,
}

/// Lower and upper interval bounds over the forecast years.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalBand {
    pub lower: Series,
    pub upper: Series,
}

/// One line of a forecast chart.
#[derive(Debug, Clone, PartialEq)]
pub struct LineData {
    pub key: ForecastKey,
    /// Values up to the last historical year.
    pub historical: Series,
    /// Values after the last historical year.
    pub forecast: Series,
    pub band: Option<IntervalBand>,
    pub max_value: Option<f64>,
}

impl LineData {
    /// The part of the line drawn for `kind`.
    pub fn visible(&self, kind: PlotKind) -> Series {
        match kind {
            PlotKind::Historical => self.historical.clone(),
            PlotKind::Forecast => self.forecast.clone(),
            PlotKind::Both => {
                let mut joined = self.historical.clone();
                for (year, value) in self.forecast.iter() {
                    joined.insert(year, value);
                }
                joined
            }
        }
    }
}

/// Line data for each key, in the given order.
///
/// Forecast values override history on shared years. The history/forecast
/// split is the entity's last observed year. The interval band is attached
/// only when `show_interval` is set and `kind` includes the forecast.
///
/// # Errors
/// * `InvalidParameter` when `keys` is empty, or when intervals are
///   requested for more than one forecast
/// * `NoForecastFound` for a key missing from the store
pub fn line_data(
    dataset: &Dataset,
    store: &ForecastStore,
    keys: &[ForecastKey],
    variable: &str,
    kind: PlotKind,
    show_interval: bool,
) -> Result<Vec<LineData>> {
    if keys.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "select at least one forecast to plot".to_string(),
        ));
    }
    if show_interval && keys.len() > 1 {
        return Err(ForecastError::InvalidParameter(
            "intervals can only be shown for a single forecast".to_string(),
        ));
    }

    keys.iter()
        .map(|key| -> Result<LineData> {
            let result = store
                .get(key)
                .ok_or_else(|| ForecastError::NoForecastFound(key.to_string()))?;
            let history = dataset
                .series(result.entity(), variable)
                .cloned()
                .unwrap_or_default();
            let split = history.last_year();

            let mut combined = history;
            for (year, value) in result.values().iter() {
                combined.insert(year, value);
            }
            let (historical, forecast) = match split {
                Some(last) => (
                    combined.iter().filter(|(y, _)| *y <= last).collect::<Series>(),
                    combined.iter().filter(|(y, _)| *y > last).collect::<Series>(),
                ),
                None => (Series::new(), combined),
            };

            let max_value = [historical.max_value(), forecast.max_value()]
                .into_iter()
                .flatten()
                .reduce(f64::max);
            let band = (show_interval && kind != PlotKind::Historical).then(|| IntervalBand {
                lower: result.lower().clone(),
                upper: result.upper().clone(),
            });

            Ok(LineData {
                key: key.clone(),
                historical,
                forecast,
                band,
                max_value,
            })
        })
        .collect()
}

/// History of plain entities within `start..=end`, in the given order.
///
/// Entities without data in the window get an empty series.
pub fn historical_lines<S: AsRef<str>>(
    dataset: &Dataset,
    entities: &[S],
    variable: &str,
    start: i32,
    end: i32,
) -> Vec<(String, Series)> {
    entities
        .iter()
        .map(|entity| {
            let entity = entity.as_ref();
            let series = dataset.extract(entity, variable, start, end);
            if series.is_empty() {
                warn!("{entity} has no {variable} data in {start}..={end}");
            }
            (entity.to_string(), series)
        })
        .collect()
}

/// One layer of a stacked-bar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct StackLayer {
    pub key: ForecastKey,
    /// One value per year of [`StackedData::years`]; zero where missing.
    pub values: Vec<f64>,
}

/// Stacked-bar data over a contiguous year range.
#[derive(Debug, Clone, PartialEq)]
pub struct StackedData {
    pub years: Vec<i32>,
    pub layers: Vec<StackLayer>,
    /// Largest per-year total.
    pub max_total: Option<f64>,
}

/// Stack history followed by forecast for every key, bottom layer first.
///
/// # Errors
/// `NoForecastFound` for a key missing from the store.
pub fn stacked_data(
    dataset: &Dataset,
    store: &ForecastStore,
    keys: &[ForecastKey],
    variable: &str,
) -> Result<StackedData> {
    let mut combined = Vec::with_capacity(keys.len());
    for key in keys {
        let result = store
            .get(key)
            .ok_or_else(|| ForecastError::NoForecastFound(key.to_string()))?;
        let mut series = dataset
            .series(result.entity(), variable)
            .cloned()
            .unwrap_or_default();
        for (year, value) in result.values().iter() {
            series.insert(year, value);
        }
        combined.push((key.clone(), series));
    }

    let first = combined.iter().filter_map(|(_, s)| s.first_year()).min();
    let last = combined.iter().filter_map(|(_, s)| s.last_year()).max();
    let years: Vec<i32> = match (first, last) {
        (Some(first), Some(last)) => (first..=last).collect(),
        _ => Vec::new(),
    };

    let layers: Vec<StackLayer> = combined
        .into_iter()
        .map(|(key, series)| StackLayer {
            key,
            values: years.iter().map(|&y| series.get(y).unwrap_or(0.0)).collect(),
        })
        .collect();

    let max_total = (0..years.len())
        .map(|i| layers.iter().map(|l| l.values[i]).sum::<f64>())
        .reduce(f64::max);

    Ok(StackedData {
        years,
        layers,
        max_total,
    })
}

/// X-axis limits for `kind`, given the selected history window and the
/// forecast horizon.
pub fn x_limits(kind: PlotKind, start_year: i32, end_year: i32, horizon_year: i32) -> (i32, i32) {
    match kind {
        PlotKind::Historical => (start_year, end_year),
        PlotKind::Forecast => (end_year, horizon_year),
        PlotKind::Both => (start_year, horizon_year),
    }
}

/// Y-axis limits from zero to just above `max_value`.
pub fn y_limits(max_value: f64) -> (f64, f64) {
    (0.0, max_value * Y_MARGIN)
}
