//! SQLite-backed [`AnalysisStore`] implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{Connection, OptionalExtension, Row, params};
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use leafcare_types::{HealthStatus, InsertPlantAnalysis, PlantAnalysis};

use crate::error::{Error, Result};
use crate::schema;
use crate::store::AnalysisStore;

const SELECT_COLUMNS: &str = "SELECT id, image_url, common_name, scientific_name, confidence,
        health_status, health_issues, treatment_recommendations, weather_data,
        analysis_date, user_id
     FROM plant_analyses";

/// Durable store in a single SQLite database file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        schema::initialize(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn insert_at(
        &self,
        analysis: InsertPlantAnalysis,
        analysis_date: OffsetDateTime,
    ) -> Result<PlantAnalysis> {
        let record = PlantAnalysis::from_insert(Uuid::new_v4().to_string(), analysis_date, analysis);

        let health_issues = record
            .health_issues
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let treatment = record
            .treatment_recommendations
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let weather = record
            .weather_data
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.conn().execute(
            "INSERT INTO plant_analyses (
                id, image_url, common_name, scientific_name, confidence, health_status,
                health_issues, treatment_recommendations, weather_data, analysis_date, user_id
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                record.id,
                record.image_url,
                record.common_name,
                record.scientific_name,
                record.confidence,
                record.health_status.map(|s| s.as_str()),
                health_issues,
                treatment,
                weather,
                to_nanos(record.analysis_date)?,
                record.user_id,
            ],
        )?;

        debug!("Stored analysis {}", record.id);
        Ok(record)
    }
}

impl AnalysisStore for SqliteStore {
    fn create(&self, analysis: InsertPlantAnalysis) -> Result<PlantAnalysis> {
        self.insert_at(analysis, OffsetDateTime::now_utc())
    }

    fn get_by_id(&self, id: &str) -> Result<Option<PlantAnalysis>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?"))?;
        let raw = stmt.query_row([id], RawAnalysis::from_row).optional()?;
        raw.map(RawAnalysis::into_analysis).transpose()
    }

    fn list_all(&self) -> Result<Vec<PlantAnalysis>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS} ORDER BY analysis_date DESC, rowid DESC"
        ))?;
        let rows = stmt
            .query_map([], RawAnalysis::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(RawAnalysis::into_analysis).collect()
    }

    fn delete_by_id(&self, id: &str) -> Result<bool> {
        let deleted = self
            .conn()
            .execute("DELETE FROM plant_analyses WHERE id = ?", [id])?;
        Ok(deleted > 0)
    }
}

fn to_nanos(date: OffsetDateTime) -> Result<i64> {
    i64::try_from(date.unix_timestamp_nanos())
        .map_err(|_| Error::InvalidTimestamp(date.to_string()))
}

fn from_nanos(nanos: i64) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(nanos))
        .map_err(|e| Error::InvalidTimestamp(e.to_string()))
}

/// A row as stored, before JSON columns are decoded.
struct RawAnalysis {
    id: String,
    image_url: String,
    common_name: Option<String>,
    scientific_name: Option<String>,
    confidence: Option<f64>,
    health_status: Option<String>,
    health_issues: Option<String>,
    treatment_recommendations: Option<String>,
    weather_data: Option<String>,
    analysis_date: i64,
    user_id: Option<String>,
}

impl RawAnalysis {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            image_url: row.get(1)?,
            common_name: row.get(2)?,
            scientific_name: row.get(3)?,
            confidence: row.get(4)?,
            health_status: row.get(5)?,
            health_issues: row.get(6)?,
            treatment_recommendations: row.get(7)?,
            weather_data: row.get(8)?,
            analysis_date: row.get(9)?,
            user_id: row.get(10)?,
        })
    }

    fn into_analysis(self) -> Result<PlantAnalysis> {
        Ok(PlantAnalysis {
            id: self.id,
            image_url: self.image_url,
            common_name: self.common_name,
            scientific_name: self.scientific_name,
            confidence: self.confidence,
            health_status: self
                .health_status
                .as_deref()
                .map(str::parse::<HealthStatus>)
                .transpose()?,
            health_issues: self
                .health_issues
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            treatment_recommendations: self
                .treatment_recommendations
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            weather_data: self
                .weather_data
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            analysis_date: from_nanos(self.analysis_date)?,
            user_id: self.user_id,
        })
    }
}
