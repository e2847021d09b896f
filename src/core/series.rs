//! Annual series keyed by calendar year.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An ordered mapping from calendar year to value.
///
/// Years are unique and iterate in increasing order. A missing year is an
/// absent key; non-finite values are never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    points: BTreeMap<i32, f64>,
}

impl Series {
    /// Create an empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from `(year, value)` pairs.
    ///
    /// Non-finite values are treated as missing and dropped. A year that
    /// appears twice is rejected.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (i32, f64)>,
    {
        let mut points = BTreeMap::new();
        for (year, value) in pairs {
            if !value.is_finite() {
                continue;
            }
            if points.insert(year, value).is_some() {
                return Err(ForecastError::InvalidParameter(format!(
                    "duplicate year {} in series",
                    year
                )));
            }
        }
        Ok(Self { points })
    }

    /// Build a series from consecutive values starting at `first_year`.
    pub fn from_consecutive(first_year: i32, values: &[f64]) -> Self {
        let points = values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, &v)| (first_year + i as i32, v))
            .collect();
        Self { points }
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Insert or overwrite a value. Non-finite values remove the year.
    pub fn insert(&mut self, year: i32, value: f64) {
        if value.is_finite() {
            self.points.insert(year, value);
        } else {
            self.points.remove(&year);
        }
    }

    /// Value at `year`, if observed.
    pub fn get(&self, year: i32) -> Option<f64> {
        self.points.get(&year).copied()
    }

    /// Mutable access to an existing observation. The index never grows
    /// through this accessor.
    pub fn get_mut(&mut self, year: i32) -> Option<&mut f64> {
        self.points.get_mut(&year)
    }

    /// Check whether `year` is observed.
    pub fn contains_year(&self, year: i32) -> bool {
        self.points.contains_key(&year)
    }

    /// First (minimum) year.
    pub fn first_year(&self) -> Option<i32> {
        self.points.keys().next().copied()
    }

    /// Last (maximum) year.
    pub fn last_year(&self) -> Option<i32> {
        self.points.keys().next_back().copied()
    }

    /// Years in increasing order.
    pub fn years(&self) -> Vec<i32> {
        self.points.keys().copied().collect()
    }

    /// Values in year order.
    pub fn values(&self) -> Vec<f64> {
        self.points.values().copied().collect()
    }

    /// Iterate `(year, value)` pairs in year order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.points.iter().map(|(&y, &v)| (y, v))
    }

    /// Mutable iteration over values in year order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (i32, &mut f64)> + '_ {
        self.points.iter_mut().map(|(&y, v)| (y, v))
    }

    /// Observations with `start <= year <= end`.
    pub fn between(&self, start: i32, end: i32) -> Series {
        if start > end {
            return Series::new();
        }
        Self {
            points: self
                .points
                .range(start..=end)
                .map(|(&y, &v)| (y, v))
                .collect(),
        }
    }

    /// Largest value, if any.
    pub fn max_value(&self) -> Option<f64> {
        self.points.values().copied().reduce(f64::max)
    }

    /// True when the series holds exactly one distinct value.
    pub fn is_constant(&self) -> bool {
        crate::utils::stats::is_constant(&self.values())
    }

    /// Add `other` into `self` year by year; years present in only one side
    /// keep that side's value.
    pub fn add_assign_union(&mut self, other: &Series) {
        for (year, value) in other.iter() {
            *self.points.entry(year).or_insert(0.0) += value;
        }
    }
}

impl FromIterator<(i32, f64)> for Series {
    /// Collects pairs, later duplicates overwriting earlier ones.
    fn from_iter<T: IntoIterator<Item = (i32, f64)>>(iter: T) -> Self {
        let mut series = Series::new();
        for (year, value) in iter {
            series.insert(year, value);
        }
        series
    }
}
