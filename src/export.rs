//! Tabular export of historical data and stored forecasts.
//!
//! Two layouts are produced: a long table of `(entity, year, value)` rows
//! and a wide table with one row per year and one column per entity,
//! preceded by a `Variable` marker column.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use csv::Writer;
use log::info;
use serde::{Deserialize, Serialize};

use crate::data::{Dataset, DATE_COLUMN, ENTITY_COLUMN, VARIABLE_COLUMN};
use crate::error::{ForecastError, Result};
use crate::forecast::{ForecastKey, ForecastStore};

/// Which part of each selected forecast is exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SaveMode {
    Historical,
    Forecast,
    #[default]
    Both,
}

impl SaveMode {
    fn includes_history(self) -> bool {
        matches!(self, SaveMode::Historical | SaveMode::Both)
    }

    fn includes_forecast(self) -> bool {
        matches!(self, SaveMode::Forecast | SaveMode::Both)
    }
}

/// One cell of the long table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    pub entity: String,
    pub year: i32,
    pub value: f64,
}

/// Rows for every key in `keys`, in the given order.
///
/// For each key the entity's full history of `variable` comes first
/// (when `mode` includes it), then the forecast values.
///
/// # Errors
/// `NoForecastFound` when a key is not in the store.
pub fn long_table(
    dataset: &Dataset,
    store: &ForecastStore,
    keys: &[ForecastKey],
    variable: &str,
    mode: SaveMode,
) -> Result<Vec<ExportRow>> {
    let mut rows = Vec::new();
    for key in keys {
        let result = store
            .get(key)
            .ok_or_else(|| ForecastError::NoForecastFound(key.to_string()))?;
        let entity = result.entity();

        if mode.includes_history() {
            if let Some(history) = dataset.series(entity, variable) {
                rows.extend(history.iter().map(|(year, value)| ExportRow {
                    entity: entity.to_string(),
                    year,
                    value,
                }));
            }
        }
        if mode.includes_forecast() {
            rows.extend(result.values().iter().map(|(year, value)| ExportRow {
                entity: entity.to_string(),
                year,
                value,
            }));
        }
    }
    Ok(rows)
}

/// Years × entities pivot of a long table.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    /// Written into the `Variable` marker column of every row.
    pub variable: String,
    /// Column order, sorted by name.
    pub entities: Vec<String>,
    /// One cell per entity, `None` where the entity has no value that year.
    pub rows: BTreeMap<i32, Vec<Option<f64>>>,
}

impl WideTable {
    pub fn get(&self, year: i32, entity: &str) -> Option<f64> {
        let column = self.entities.iter().position(|e| e == entity)?;
        self.rows.get(&year)?.get(column).copied().flatten()
    }
}

/// Pivot `rows` into a [`WideTable`].
///
/// # Errors
/// `InvalidParameter` when the same (entity, year) cell appears twice.
pub fn wide_table(rows: &[ExportRow], variable: &str) -> Result<WideTable> {
    let entities: Vec<String> = rows
        .iter()
        .map(|r| r.entity.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut table: BTreeMap<i32, Vec<Option<f64>>> = BTreeMap::new();
    for row in rows {
        let column = entities
            .binary_search(&row.entity)
            .map_err(|_| ForecastError::UnknownEntity(row.entity.clone()))?;
        let cells = table
            .entry(row.year)
            .or_insert_with(|| vec![None; entities.len()]);
        if cells[column].replace(row.value).is_some() {
            return Err(ForecastError::InvalidParameter(format!(
                "duplicate value for {} in {}",
                row.entity, row.year
            )));
        }
    }

    Ok(WideTable {
        variable: variable.to_string(),
        entities,
        rows: table,
    })
}

/// Write `Country,Date,<variable>` rows.
pub fn write_long_csv<W: Write>(writer: W, rows: &[ExportRow], variable: &str) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record([ENTITY_COLUMN, DATE_COLUMN, variable])?;
    for row in rows {
        wtr.write_record([row.entity.clone(), row.year.to_string(), row.value.to_string()])?;
    }
    wtr.flush()?;
    info!("wrote {} long row(s) for {variable}", rows.len());
    Ok(())
}

/// Write `Date,Variable,<entity>...` rows; missing cells are empty.
pub fn write_wide_csv<W: Write>(writer: W, table: &WideTable) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);
    let header = [DATE_COLUMN, VARIABLE_COLUMN]
        .into_iter()
        .chain(table.entities.iter().map(String::as_str));
    wtr.write_record(header)?;

    for (year, cells) in &table.rows {
        let mut record = vec![year.to_string(), table.variable.clone()];
        record.extend(cells.iter().map(|c| c.map(|v| v.to_string()).unwrap_or_default()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    info!(
        "wrote {} wide row(s) for {} entities",
        table.rows.len(),
        table.entities.len()
    );
    Ok(())
}
