//! Application state shared across handlers.
//!
//! The record store is the only mutable state. It is shared as an
//! `Arc<dyn AnalysisStore>`; each backend does its own locking, so handlers
//! call it directly without an outer lock.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{info, warn};

use leafcare_core::{
    Analyzer, CareGuide, ImageNormalizer, OpenWeatherClient, PlantIdClient, WeatherProvider,
};
use leafcare_store::{AnalysisStore, MemoryStore, SqliteStore};

use crate::config::{Config, StorageBackend};

/// Shared application state.
pub struct AppState {
    /// Analysis record store.
    pub store: Arc<dyn AnalysisStore>,
    /// Configuration as loaded at startup.
    pub config: Config,
    /// Analysis pipeline; `None` when no Plant.id key is configured.
    pub analyzer: Option<Analyzer>,
    /// Weather provider; `None` when no OpenWeatherMap key is configured.
    pub weather: Option<Arc<dyn WeatherProvider>>,
    /// When the service started.
    pub started_at: OffsetDateTime,
}

impl AppState {
    /// Create state from already-built collaborators.
    pub fn new(
        store: Arc<dyn AnalysisStore>,
        config: Config,
        analyzer: Option<Analyzer>,
        weather: Option<Arc<dyn WeatherProvider>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            config,
            analyzer,
            weather,
            started_at: OffsetDateTime::now_utc(),
        })
    }

    /// Build the API clients and analyzer described by `config`.
    ///
    /// Missing API keys disable the corresponding feature rather than
    /// failing startup.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured client cannot be built (for example
    /// an invalid base URL).
    pub fn from_config(
        store: Arc<dyn AnalysisStore>,
        config: Config,
    ) -> leafcare_core::Result<Arc<Self>> {
        let weather: Option<Arc<dyn WeatherProvider>> = match non_empty(&config.weather.api_key) {
            Some(key) => Some(Arc::new(OpenWeatherClient::with_base_url(
                key,
                &config.weather.base_url,
                config.weather.timeout(),
            )?)),
            None => {
                warn!("No OpenWeatherMap API key configured; weather is disabled");
                None
            }
        };

        let analyzer = match non_empty(&config.plant_id.api_key) {
            Some(key) => {
                let client = PlantIdClient::with_base_url(
                    key,
                    &config.plant_id.base_url,
                    config.plant_id.timeout(),
                )?;
                let mut analyzer = Analyzer::new(Arc::new(client))
                    .with_normalizer(ImageNormalizer::default())
                    .with_care_guide(CareGuide::with_templates(config.care.species.clone()));
                if let Some(weather) = &weather {
                    analyzer = analyzer.with_weather(Arc::clone(weather));
                }
                Some(analyzer)
            }
            None => {
                warn!("No Plant.id API key configured; analysis requests will fail");
                None
            }
        };

        Ok(Self::new(store, config, analyzer, weather))
    }
}

fn non_empty(key: &Option<String>) -> Option<&str> {
    key.as_deref().filter(|k| !k.is_empty())
}

/// Open the record store selected by `config`.
pub fn open_store(config: &Config) -> leafcare_store::Result<Arc<dyn AnalysisStore>> {
    match config.storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory analysis store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Sqlite => Ok(Arc::new(SqliteStore::open(&config.storage.path)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_without_keys() {
        let state = AppState::from_config(Arc::new(MemoryStore::new()), Config::default()).unwrap();
        assert!(state.analyzer.is_none());
        assert!(state.weather.is_none());
    }

    #[test]
    fn test_from_config_with_keys() {
        let mut config = Config::default();
        config.plant_id.api_key = Some("pid".to_string());
        config.weather.api_key = Some("ow".to_string());

        let state = AppState::from_config(Arc::new(MemoryStore::new()), config).unwrap();
        let analyzer = state.analyzer.as_ref().unwrap();
        assert!(analyzer.has_weather());
        assert!(state.weather.is_some());
    }

    #[test]
    fn test_empty_key_is_missing() {
        let mut config = Config::default();
        config.plant_id.api_key = Some(String::new());

        let state = AppState::from_config(Arc::new(MemoryStore::new()), config).unwrap();
        assert!(state.analyzer.is_none());
    }

    #[test]
    fn test_from_config_invalid_url() {
        let mut config = Config::default();
        config.plant_id.api_key = Some("pid".to_string());
        config.plant_id.base_url = "not-a-url".to_string();

        let result = AppState::from_config(Arc::new(MemoryStore::new()), config);
        assert!(matches!(result, Err(leafcare_core::Error::InvalidUrl(_))));
    }

    #[test]
    fn test_open_store_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Sqlite;
        config.storage.path = dir.path().join("analyses.db");

        let store = open_store(&config).unwrap();
        assert!(store.list_all().unwrap().is_empty());
        assert!(config.storage.path.exists());
    }
}
