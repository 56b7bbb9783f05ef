//! The record store abstraction.

use tracing::debug;

use leafcare_types::{InsertPlantAnalysis, PlantAnalysis};

use crate::error::Result;

/// Persistent collection of plant analyses.
///
/// Records are append-only: there is no update path. Every backend assigns a
/// fresh UUID v4 `id` and the current time as `analysis_date` on
/// [`create`](AnalysisStore::create).
///
/// Implementations must be `Send + Sync` so one instance can be shared by
/// every request handler.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`create`](AnalysisStore::create) | Persist a new record |
/// | [`get_by_id`](AnalysisStore::get_by_id) | Fetch one record |
/// | [`list_all`](AnalysisStore::list_all) | Every record, newest first |
/// | [`delete_by_id`](AnalysisStore::delete_by_id) | Remove one record |
/// | [`clear`](AnalysisStore::clear) | Remove every record |
/// | [`search`](AnalysisStore::search) | Filter by common or scientific name |
pub trait AnalysisStore: Send + Sync {
    /// Persist a new record and return it with its assigned identity.
    fn create(&self, analysis: InsertPlantAnalysis) -> Result<PlantAnalysis>;

    /// Fetch a record; `None` if no record has that id.
    fn get_by_id(&self, id: &str) -> Result<Option<PlantAnalysis>>;

    /// Every record, ordered by `analysis_date` descending.
    ///
    /// Records with equal dates are ordered most recently inserted first.
    fn list_all(&self) -> Result<Vec<PlantAnalysis>>;

    /// Remove a record. Returns whether it existed.
    fn delete_by_id(&self, id: &str) -> Result<bool>;

    /// Remove every record currently listed, returning how many were removed.
    ///
    /// Records deleted concurrently are skipped rather than reported as
    /// errors. The operation is not atomic.
    fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for analysis in self.list_all()? {
            if self.delete_by_id(&analysis.id)? {
                removed += 1;
            }
        }
        debug!("Cleared {} analyses", removed);
        Ok(removed)
    }

    /// Records whose common or scientific name contains `term`, ignoring case.
    ///
    /// Ordering follows [`list_all`](AnalysisStore::list_all); an empty term
    /// returns every record.
    fn search(&self, term: &str) -> Result<Vec<PlantAnalysis>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|a| a.matches_name(term))
            .collect())
    }
}
