//! In-memory [`AnalysisStore`] implementation.
//!
//! Records live in a `HashMap` behind `std::sync::RwLock`. Each record also
//! carries an insertion sequence number, used to order records with equal
//! analysis dates. Nothing survives a restart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use leafcare_types::{InsertPlantAnalysis, PlantAnalysis};

use crate::error::Result;
use crate::store::AnalysisStore;

struct StoredAnalysis {
    seq: u64,
    analysis: PlantAnalysis,
}

/// Volatile store, the default backend.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, StoredAnalysis>>,
    next_seq: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert with an explicit date, bypassing the clock.
    pub(crate) fn insert_at(
        &self,
        analysis: InsertPlantAnalysis,
        analysis_date: OffsetDateTime,
    ) -> PlantAnalysis {
        let record = PlantAnalysis::from_insert(Uuid::new_v4().to_string(), analysis_date, analysis);
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);

        self.records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                record.id.clone(),
                StoredAnalysis {
                    seq,
                    analysis: record.clone(),
                },
            );
        debug!("Stored analysis {} in memory", record.id);
        record
    }
}

impl AnalysisStore for MemoryStore {
    fn create(&self, analysis: InsertPlantAnalysis) -> Result<PlantAnalysis> {
        Ok(self.insert_at(analysis, OffsetDateTime::now_utc()))
    }

    fn get_by_id(&self, id: &str) -> Result<Option<PlantAnalysis>> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(id).map(|r| r.analysis.clone()))
    }

    fn list_all(&self) -> Result<Vec<PlantAnalysis>> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let mut sorted: Vec<&StoredAnalysis> = records.values().collect();
        sorted.sort_by(|a, b| {
            b.analysis
                .analysis_date
                .cmp(&a.analysis.analysis_date)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(sorted.into_iter().map(|r| r.analysis.clone()).collect())
    }

    fn delete_by_id(&self, id: &str) -> Result<bool> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        Ok(records.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leafcare_types::HealthStatus;
    use time::Duration;

    fn named(name: &str) -> InsertPlantAnalysis {
        let mut insert = InsertPlantAnalysis::new("data:image/jpeg;base64,AAAA");
        insert.common_name = Some(name.to_string());
        insert
    }

    #[test]
    fn test_create_and_get() {
        let store = MemoryStore::new();
        let mut insert = named("Monstera");
        insert.health_status = Some(HealthStatus::Healthy);

        let created = store.create(insert.clone()).unwrap();
        assert!(Uuid::parse_str(&created.id).is_ok());
        assert_eq!(created.to_insert(), insert);

        let fetched = store.get_by_id(&created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let store = MemoryStore::new();
        assert!(store.get_by_id("nope").unwrap().is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let store = MemoryStore::new();
        let a = store.create(named("a")).unwrap();
        let b = store.create(named("a")).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_list_newest_first() {
        let store = MemoryStore::new();
        let now = OffsetDateTime::now_utc();
        store.insert_at(named("old"), now - Duration::hours(2));
        store.insert_at(named("new"), now);
        store.insert_at(named("middle"), now - Duration::hours(1));

        let names: Vec<_> = store
            .list_all()
            .unwrap()
            .into_iter()
            .filter_map(|a| a.common_name)
            .collect();
        assert_eq!(names, ["new", "middle", "old"]);
    }

    #[test]
    fn test_equal_dates_ordered_by_insertion() {
        let store = MemoryStore::new();
        let now = OffsetDateTime::now_utc();
        store.insert_at(named("first"), now);
        store.insert_at(named("second"), now);

        let list = store.list_all().unwrap();
        assert_eq!(list[0].common_name.as_deref(), Some("second"));
        assert_eq!(list[1].common_name.as_deref(), Some("first"));
    }

    #[test]
    fn test_delete() {
        let store = MemoryStore::new();
        let a = store.create(named("a")).unwrap();

        assert!(store.delete_by_id(&a.id).unwrap());
        assert!(!store.delete_by_id(&a.id).unwrap());
        assert!(store.get_by_id(&a.id).unwrap().is_none());
    }

    #[test]
    fn test_clear() {
        let store = MemoryStore::new();
        for name in ["a", "b", "c"] {
            store.create(named(name)).unwrap();
        }

        assert_eq!(store.clear().unwrap(), 3);
        assert!(store.is_empty());
        assert_eq!(store.clear().unwrap(), 0);
    }

    #[test]
    fn test_search() {
        let store = MemoryStore::new();
        let mut insert = named("Swiss cheese plant");
        insert.scientific_name = Some("Monstera deliciosa".to_string());
        store.create(insert).unwrap();
        store.create(named("Fiddle leaf fig")).unwrap();

        assert_eq!(store.search("MONSTERA").unwrap().len(), 1);
        assert_eq!(store.search("fig").unwrap().len(), 1);
        assert_eq!(store.search("").unwrap().len(), 2);
        assert!(store.search("cactus").unwrap().is_empty());
    }
}
