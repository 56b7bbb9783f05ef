//! Analysis record storage for Leafcare.
//!
//! This crate persists [`PlantAnalysis`](leafcare_types::PlantAnalysis)
//! records behind the [`AnalysisStore`] trait, with two backends:
//!
//! - [`MemoryStore`]: volatile, the default
//! - [`SqliteStore`]: a single SQLite file, nested values stored as JSON
//!
//! Both assign a UUID v4 id and the current time on create, list newest
//! first, and never update a record after it is written.
//!
//! # Example
//!
//! ```
//! use leafcare_store::{AnalysisStore, MemoryStore};
//! use leafcare_types::InsertPlantAnalysis;
//!
//! let store = MemoryStore::new();
//! let created = store.create(InsertPlantAnalysis::new("data:image/jpeg;base64,"))?;
//!
//! assert_eq!(store.get_by_id(&created.id)?, Some(created.clone()));
//! assert!(store.delete_by_id(&created.id)?);
//! assert_eq!(store.clear()?, 0);
//! # Ok::<(), leafcare_store::Error>(())
//! ```

mod error;
mod memory;
mod schema;
mod sqlite;
mod store;

pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::AnalysisStore;

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/leafcare/analyses.db`
/// - macOS: `~/Library/Application Support/leafcare/analyses.db`
/// - Windows: `C:\Users\<user>\AppData\Local\leafcare\analyses.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("leafcare")
        .join("analyses.db")
}
