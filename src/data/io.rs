//! CSV ingestion.
//!
//! Two layouts are understood:
//! - long: `Country,Date,<variable>...`, one row per entity and year;
//! - wide: `Date,Variable,<entity>...`, one row per year for a single
//!   variable, melted into the long form on load.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use csv::{Reader, ReaderBuilder, StringRecord};
use log::info;

use crate::data::Dataset;
use crate::error::{ForecastError, Result};

pub const ENTITY_COLUMN: &str = "Country";
pub const DATE_COLUMN: &str = "Date";
pub const VARIABLE_COLUMN: &str = "Variable";

/// Table layout of an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvLayout {
    Long,
    Wide,
}

impl CsvLayout {
    /// Long when the header has an entity column, wide otherwise.
    pub fn detect(headers: &StringRecord) -> Self {
        if headers.iter().any(|h| h == ENTITY_COLUMN) {
            CsvLayout::Long
        } else {
            CsvLayout::Wide
        }
    }
}

/// Read a dataset, detecting the layout from the header.
pub fn read_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers()?.clone();
    match CsvLayout::detect(&headers) {
        CsvLayout::Long => load_long(&mut rdr, &headers),
        CsvLayout::Wide => load_wide(&mut rdr, &headers),
    }
}

/// Read a dataset from a file, detecting the layout from the header.
pub fn read_csv_path<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| ForecastError::Io(format!("failed to open {}: {e}", path.display())))?;
    let dataset = read_csv(file)?;
    info!(
        "loaded {} entities and {} variable(s) from {}",
        dataset.len(),
        dataset.variables().len(),
        path.display()
    );
    Ok(dataset)
}

/// Read a long-layout table.
pub fn read_long_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers()?.clone();
    load_long(&mut rdr, &headers)
}

/// Read a wide-layout table.
pub fn read_wide_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers()?.clone();
    load_wide(&mut rdr, &headers)
}

fn csv_reader<R: Read>(reader: R) -> Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| ForecastError::InvalidParameter(format!("missing {name} column")))
}

fn load_long<R: Read>(rdr: &mut Reader<R>, headers: &StringRecord) -> Result<Dataset> {
    let entity_idx = column(headers, ENTITY_COLUMN)?;
    let date_idx = column(headers, DATE_COLUMN)?;
    let variables: Vec<(usize, &str)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != entity_idx && *i != date_idx)
        .collect();

    let mut dataset = Dataset::new();
    for (_, name) in &variables {
        dataset.add_variable(name);
    }

    for record in rdr.records() {
        let record = record?;
        let line = line_of(&record);
        let entity = record.get(entity_idx).unwrap_or_default();
        if entity.is_empty() {
            return Err(ForecastError::InvalidParameter(format!(
                "line {line}: empty {ENTITY_COLUMN}"
            )));
        }
        let year = year_at(&record, date_idx, line)?;

        dataset.add_entity(entity);
        for (idx, name) in &variables {
            let value = record.get(*idx).and_then(parse_value);
            dataset.insert_observation(entity, name, year, value);
        }
    }
    Ok(dataset)
}

fn load_wide<R: Read>(rdr: &mut Reader<R>, headers: &StringRecord) -> Result<Dataset> {
    let date_idx = column(headers, DATE_COLUMN)?;
    let variable_idx = column(headers, VARIABLE_COLUMN)?;
    let entities: Vec<(usize, &str)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != date_idx && *i != variable_idx)
        .collect();

    let mut dataset = Dataset::new();
    for (_, entity) in &entities {
        dataset.add_entity(entity);
    }

    // Every row is labelled with the variable named on the first row.
    let mut variable: Option<String> = None;
    for record in rdr.records() {
        let record = record?;
        let line = line_of(&record);
        let name = variable
            .get_or_insert_with(|| record.get(variable_idx).unwrap_or_default().to_string())
            .clone();
        if name.is_empty() {
            return Err(ForecastError::InvalidParameter(format!(
                "line {line}: empty {VARIABLE_COLUMN}"
            )));
        }
        let year = year_at(&record, date_idx, line)?;

        for (idx, entity) in &entities {
            let value = record.get(*idx).and_then(parse_value);
            dataset.insert_observation(entity, &name, year, value);
        }
    }
    Ok(dataset)
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}

fn year_at(record: &StringRecord, idx: usize, line: u64) -> Result<i32> {
    let text = record.get(idx).unwrap_or_default();
    parse_year(text).ok_or_else(|| {
        ForecastError::InvalidParameter(format!("line {line}: invalid {DATE_COLUMN} {text:?}"))
    })
}

/// Calendar year of a `Date` cell.
///
/// Accepts a plain year (`2020`, `2020.0`), an ISO date (`2020-01-01`) or an
/// ISO date-time (`2020-01-01 00:00:00`).
///
/// # Example
/// ```
/// use country_forecast::data::parse_year;
///
/// assert_eq!(parse_year("1999"), Some(1999));
/// assert_eq!(parse_year("2021-01-01"), Some(2021));
/// assert_eq!(parse_year("soon"), None);
/// ```
pub fn parse_year(text: &str) -> Option<i32> {
    let text = text.trim();
    if let Ok(year) = text.parse::<i32>() {
        return Some(year);
    }
    if let Ok(value) = text.parse::<f64>() {
        if value.is_finite() && value.fract() == 0.0 && value.abs() <= i32::MAX as f64 {
            return Some(value as i32);
        }
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date.year());
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.year())
}

/// Numeric cell value; empty, unparsable and non-finite cells are missing.
fn parse_value(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
