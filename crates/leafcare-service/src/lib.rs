//! HTTP REST API for plant photo analysis.
//!
//! This crate provides a service that:
//! - Accepts plant photo uploads and analyzes them with Plant.id
//! - Attaches current weather when the client sends its location
//! - Synthesizes a treatment plan for the identified plant
//! - Stores analysis records in memory or in SQLite
//!
//! # REST API Endpoints
//!
//! - `GET /api/health` - Service health check
//! - `GET /api/plant-analyses` - List analyses, newest first (`?search=` filters by name)
//! - `DELETE /api/plant-analyses` - Delete all analyses
//! - `GET /api/plant-analyses/{id}` - Get one analysis
//! - `DELETE /api/plant-analyses/{id}` - Delete one analysis
//! - `POST /api/analyze-plant` - Analyze an uploaded photo (multipart `image`, optional `latitude`/`longitude`)
//! - `GET /api/weather?lat=..&lon=..` - Current weather and care advice
//!
//! # Configuration
//!
//! The service reads configuration from `~/.config/leafcare/server.toml`:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:5000"
//! max_upload_bytes = 5242880
//!
//! [storage]
//! backend = "sqlite"
//! path = "~/.local/share/leafcare/analyses.db"
//!
//! [plant_id]
//! api_key = "..."
//!
//! [weather]
//! api_key = "..."
//!
//! [[care.species]]
//! keywords = ["ficus"]
//! immediate = ["Keep away from drafts"]
//! organic = ["Wipe leaves with diluted soap"]
//! chemical = []
//! ```
//!
//! API keys may also come from `PLANT_ID_API_KEY` and `OPENWEATHER_API_KEY`,
//! which take precedence over the file.

pub mod api;
pub mod config;
pub mod state;

pub use config::{
    CareConfig, Config, ConfigError, PlantIdConfig, ServerConfig, StorageBackend, StorageConfig,
    ValidationError, WeatherConfig,
};
pub use state::{AppState, open_store};
