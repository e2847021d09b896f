//! Collection of forecasts keyed by [`ForecastKey`].

use std::collections::BTreeMap;

use log::{info, warn};

use crate::error::{ForecastError, Result};
use crate::forecast::correction::{correct, CorrectionRequest};
use crate::forecast::project::{ForecastKey, ForecastResult};

/// Forecasts kept until explicitly discarded.
///
/// Keys iterate in their natural order (entity, horizon, family, order).
#[derive(Debug, Clone, Default)]
pub struct ForecastStore {
    entries: BTreeMap<ForecastKey, ForecastResult>,
}

impl ForecastStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a forecast, replacing any entry with the same key.
    pub fn insert(&mut self, result: ForecastResult) -> Option<ForecastResult> {
        let key = result.key().clone();
        let previous = self.entries.insert(key.clone(), result);
        if previous.is_some() {
            info!("replaced forecast {key}");
        } else {
            info!("stored forecast {key}");
        }
        previous
    }

    pub fn get(&self, key: &ForecastKey) -> Option<&ForecastResult> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &ForecastKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ForecastKey> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ForecastKey, &ForecastResult)> {
        self.entries.iter()
    }

    /// Keys whose entity is exactly `entity`.
    pub fn keys_for_entity<'a>(&'a self, entity: &'a str) -> impl Iterator<Item = &'a ForecastKey> {
        self.entries.keys().filter(move |k| k.entity() == entity)
    }

    /// First forecast of `entity` in key order.
    pub fn find_for_entity(&self, entity: &str) -> Option<&ForecastKey> {
        self.entries.keys().find(|k| k.entity() == entity)
    }

    pub fn remove(&mut self, key: &ForecastKey) -> Option<ForecastResult> {
        self.entries.remove(key)
    }

    /// Drop the given keys; returns how many were present.
    pub fn discard<'a, I>(&mut self, keys: I) -> usize
    where
        I: IntoIterator<Item = &'a ForecastKey>,
    {
        keys.into_iter()
            .filter(|k| self.entries.remove(*k).is_some())
            .count()
    }

    /// Correct the forecast stored under `key`.
    pub fn correct(&mut self, key: &ForecastKey, request: &CorrectionRequest) -> Result<()> {
        let result = self
            .entries
            .get_mut(key)
            .ok_or_else(|| ForecastError::NoForecastFound(key.to_string()))?;
        correct(result.values_mut(), request).inspect_err(|e| {
            warn!("correction of {key} rejected: {e}");
        })
    }

    /// Correct the first forecast of `entity`; returns its key.
    pub fn correct_entity(
        &mut self,
        entity: &str,
        request: &CorrectionRequest,
    ) -> Result<ForecastKey> {
        let Some(key) = self.find_for_entity(entity).cloned() else {
            warn!("no forecast found for {entity}");
            return Err(ForecastError::NoForecastFound(entity.to_string()));
        };
        self.correct(&key, request)?;
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Series;
    use crate::forecast::correction::{CorrectionMode, TailPolicy};
    use crate::forecast::project::Projection;
    use crate::models::arima::{ModelFamily, ModelOrder};

    fn result(entity: &str, horizon: i32, values: &[f64]) -> ForecastResult {
        let key = ForecastKey::new(entity, horizon, ModelFamily::Arima, ModelOrder::arima(0, 1, 0));
        let first = horizon - values.len() as i32 + 1;
        let series = Series::from_consecutive(first, values);
        ForecastResult::new(
            key,
            Projection {
                values: series.clone(),
                lower: series.clone(),
                upper: series,
            },
        )
    }

    #[test]
    fn insert_overwrites_same_key() {
        let mut store = ForecastStore::new();
        assert!(store.insert(result("France", 2027, &[1.0, 2.0])).is_none());
        assert!(store.insert(result("France", 2027, &[3.0, 4.0])).is_some());

        assert_eq!(store.len(), 1);
        let key = store.find_for_entity("France").cloned().unwrap();
        assert_eq!(store.get(&key).unwrap().values().values(), vec![3.0, 4.0]);
    }

    #[test]
    fn entity_lookup_is_exact() {
        let mut store = ForecastStore::new();
        store.insert(result("Niger", 2030, &[1.0]));
        store.insert(result("Nigeria", 2030, &[2.0]));

        let key = store.find_for_entity("Niger").unwrap();
        assert_eq!(key.entity(), "Niger");
        assert_eq!(store.keys_for_entity("Nigeria").count(), 1);
        assert!(store.find_for_entity("Nig").is_none());
    }

    #[test]
    fn discard_removes_listed_keys() {
        let mut store = ForecastStore::new();
        store.insert(result("A", 2030, &[1.0]));
        store.insert(result("B", 2030, &[1.0]));
        let keys: Vec<ForecastKey> = store.keys_for_entity("A").cloned().collect();

        assert_eq!(store.discard(&keys), 1);
        assert_eq!(store.discard(&keys), 0);
        assert_eq!(store.keys().map(|k| k.entity()).collect::<Vec<_>>(), vec!["B"]);
    }

    #[test]
    fn correct_entity_mutates_values_only() {
        let mut store = ForecastStore::new();
        store.insert(result("Spain", 2027, &[5.0, 6.0, 7.0, 8.0]));
        let request = CorrectionRequest::new(2026, 10.0, CorrectionMode::Linear(TailPolicy::Short));

        let key = store.correct_entity("Spain", &request).unwrap();
        let stored = store.get(&key).unwrap();
        assert_eq!(stored.values().values(), vec![5.0, 7.5, 10.0, 10.0]);
        assert_eq!(stored.lower().values(), vec![5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn correcting_unknown_entity_fails() {
        let mut store = ForecastStore::new();
        let request = CorrectionRequest::new(2026, 1.0, CorrectionMode::Start);
        assert_eq!(
            store.correct_entity("Chile", &request).unwrap_err(),
            ForecastError::NoForecastFound("Chile".to_string())
        );
    }
}
