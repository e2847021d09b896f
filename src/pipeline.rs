//! Batch stages over many entities.
//!
//! Each stage handles entities independently: an error for one entity is
//! recorded under its name and never stops the others.

use std::collections::BTreeMap;

use log::{info, warn};

use crate::config::{ForecastConfig, SearchConfig, SeriesSelection, StationarityConfig};
use crate::core::Series;
use crate::data::Dataset;
use crate::error::{ForecastError, Result};
use crate::forecast::{forecast_fit, ForecastKey, ForecastStore};
use crate::models::arima::{search, ModelFit};
use crate::validation::{analyze, StationarityReport};

fn selected_series(dataset: &Dataset, entity: &str, selection: &SeriesSelection) -> Result<Series> {
    if !dataset.contains_entity(entity) {
        return Err(ForecastError::UnknownEntity(entity.to_string()));
    }
    Ok(dataset.extract(
        entity,
        &selection.variable,
        selection.start_year,
        selection.end_year,
    ))
}

/// Stationarity report for each entity with data in the selection window.
///
/// Entities missing from the dataset are recorded as `UnknownEntity`;
/// known entities without observations in the window are skipped.
pub fn run_stationarity<S: AsRef<str>>(
    dataset: &Dataset,
    entities: &[S],
    selection: &SeriesSelection,
    config: &StationarityConfig,
) -> BTreeMap<String, Result<StationarityReport>> {
    let mut reports = BTreeMap::new();
    for entity in entities {
        let entity = entity.as_ref();
        let report = match selected_series(dataset, entity, selection) {
            Ok(series) if series.is_empty() => {
                warn!(
                    "skipping {entity}: no {} data in {}..={}",
                    selection.variable, selection.start_year, selection.end_year
                );
                continue;
            }
            Ok(series) => Ok(analyze(&series.values(), config.max_diff)),
            Err(e) => {
                warn!("stationarity for {entity} failed: {e}");
                Err(e)
            }
        };
        reports.insert(entity.to_string(), report);
    }
    reports
}

/// Order search for each entity.
pub fn run_search<S: AsRef<str>>(
    dataset: &Dataset,
    entities: &[S],
    selection: &SeriesSelection,
    config: &SearchConfig,
) -> BTreeMap<String, Result<ModelFit>> {
    entities
        .iter()
        .map(|entity| {
            let entity = entity.as_ref();
            let fit = selected_series(dataset, entity, selection)
                .and_then(|series| search(&series, config))
                .inspect_err(|e| warn!("search for {entity} failed: {e}"));
            (entity.to_string(), fit)
        })
        .collect()
}

/// Project every successful fit and store the result.
///
/// Entities whose search failed get no entry.
pub fn run_forecasts(
    fits: &BTreeMap<String, Result<ModelFit>>,
    config: &ForecastConfig,
    store: &mut ForecastStore,
) -> BTreeMap<String, Result<ForecastKey>> {
    let mut outcomes = BTreeMap::new();
    for (entity, fit) in fits {
        let Ok(fit) = fit else {
            continue;
        };
        let outcome = forecast_fit(entity, fit, config).map(|result| {
            let key = result.key().clone();
            store.insert(result);
            key
        });
        if let Err(e) = &outcome {
            warn!("forecast for {entity} failed: {e}");
        }
        outcomes.insert(entity.clone(), outcome);
    }
    info!(
        "{} of {} forecast(s) stored",
        outcomes.values().filter(|o| o.is_ok()).count(),
        outcomes.len()
    );
    outcomes
}
