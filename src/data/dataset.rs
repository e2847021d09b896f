//! Entity × variable collection of annual series.

use std::collections::{BTreeMap, HashMap};

use log::info;

use crate::core::Series;
use crate::error::{ForecastError, Result};

/// Annual observations per entity (country or group) and variable.
///
/// Entities and variables keep their insertion order. An entity may exist
/// without observations, for instance when every cell of its rows was empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    entities: Vec<String>,
    variables: Vec<String>,
    records: HashMap<String, HashMap<String, Series>>,
}

impl Dataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity; existing entities are left alone.
    pub fn add_entity(&mut self, entity: &str) {
        if !self.records.contains_key(entity) {
            self.entities.push(entity.to_string());
            self.records.insert(entity.to_string(), HashMap::new());
        }
    }

    /// Register a variable name; existing names are left alone.
    pub fn add_variable(&mut self, variable: &str) {
        if !self.variables.iter().any(|v| v == variable) {
            self.variables.push(variable.to_string());
        }
    }

    /// Record one cell. `None` (or a non-finite value) registers the entity
    /// and variable without storing a value.
    pub fn insert_observation(&mut self, entity: &str, variable: &str, year: i32, value: Option<f64>) {
        self.add_entity(entity);
        self.add_variable(variable);
        if let Some(value) = value.filter(|v| v.is_finite()) {
            self.records
                .entry(entity.to_string())
                .or_default()
                .entry(variable.to_string())
                .or_default()
                .insert(year, value);
        }
    }

    /// Replace the whole series of `entity` for `variable`.
    pub fn insert_series(&mut self, entity: &str, variable: &str, series: Series) {
        self.add_entity(entity);
        self.add_variable(variable);
        self.records
            .entry(entity.to_string())
            .or_default()
            .insert(variable.to_string(), series);
    }

    /// Entities in insertion order.
    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    /// Variable names in insertion order.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn contains_entity(&self, entity: &str) -> bool {
        self.records.contains_key(entity)
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Full series of `entity` for `variable`.
    pub fn series(&self, entity: &str, variable: &str) -> Option<&Series> {
        self.records.get(entity)?.get(variable)
    }

    /// Smallest and largest observed year across the whole dataset.
    pub fn year_range(&self) -> Option<(i32, i32)> {
        self.records
            .values()
            .flat_map(|vars| vars.values())
            .filter_map(|s| Some((s.first_year()?, s.last_year()?)))
            .reduce(|(lo, hi), (first, last)| (lo.min(first), hi.max(last)))
    }

    /// Observations of `entity` for `variable` with `start <= year <= end`.
    ///
    /// Unknown entities or variables give an empty series.
    pub fn extract(&self, entity: &str, variable: &str, start: i32, end: i32) -> Series {
        self.series(entity, variable)
            .map(|s| s.between(start, end))
            .unwrap_or_default()
    }

    /// Create `new_name` as the year-by-year sum of `members` within
    /// `start..=end`, for every variable.
    ///
    /// A year present in any member is produced; members missing that year
    /// contribute zero. Years absent from every member stay absent. Existing
    /// entities are not modified.
    ///
    /// # Errors
    /// * `InvalidParameter` for an empty member list or an empty or taken name
    /// * `UnknownEntity` for a member that is not in the dataset
    pub fn aggregate<S: AsRef<str>>(
        &mut self,
        members: &[S],
        start: i32,
        end: i32,
        new_name: &str,
    ) -> Result<BTreeMap<String, Series>> {
        if members.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "group needs at least one member".to_string(),
            ));
        }
        if new_name.trim().is_empty() {
            return Err(ForecastError::InvalidParameter(
                "group name must not be empty".to_string(),
            ));
        }
        if self.contains_entity(new_name) {
            return Err(ForecastError::InvalidParameter(format!(
                "entity name {new_name:?} is already in use"
            )));
        }
        if let Some(unknown) = members.iter().find(|m| !self.contains_entity(m.as_ref())) {
            let name: &str = unknown.as_ref();
            return Err(ForecastError::UnknownEntity(name.to_string()));
        }

        let mut bundle = BTreeMap::new();
        for variable in &self.variables {
            let mut total = Series::new();
            for member in members {
                total.add_assign_union(&self.extract(member.as_ref(), variable, start, end));
            }
            if !total.is_empty() {
                bundle.insert(variable.clone(), total);
            }
        }

        self.add_entity(new_name);
        for (variable, series) in &bundle {
            self.insert_series(new_name, variable, series.clone());
        }
        info!(
            "created group {new_name:?} from {} member(s) over {start}..={end}",
            members.len()
        );
        Ok(bundle)
    }

    /// Merge `other` into `self`. Observations of `other` win on conflict.
    pub fn merge(&mut self, other: Dataset) {
        for variable in &other.variables {
            self.add_variable(variable);
        }
        let Dataset {
            entities,
            mut records,
            ..
        } = other;
        for entity in entities {
            self.add_entity(&entity);
            let Some(vars) = records.remove(&entity) else {
                continue;
            };
            for (variable, series) in vars {
                let target = self
                    .records
                    .entry(entity.clone())
                    .or_default()
                    .entry(variable)
                    .or_default();
                for (year, value) in series.iter() {
                    target.insert(year, value);
                }
            }
        }
    }
}
