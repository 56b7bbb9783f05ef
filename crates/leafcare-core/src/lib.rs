//! Plant analysis pipeline for Leafcare.
//!
//! This crate turns an uploaded plant photo into an unsaved analysis record:
//! the image is normalized, sent to a plant identification service, optionally
//! paired with current weather, and merged with a synthesized treatment plan.
//!
//! # Features
//!
//! - **Treatment plans**: rule-table synthesis keyed on the identified species
//!   plus disease-specific augmentation ([`recommendations`])
//! - **Record assembly**: one place where identification defaults are applied
//!   ([`assembly`])
//! - **Image normalization**: JPEG/PNG/WEBP in, bounded JPEG data URL out
//!   ([`photo`])
//! - **External clients**: Plant.id v3 and OpenWeatherMap over HTTP, behind
//!   the [`PlantIdentifier`] and [`WeatherProvider`] traits
//! - **Weather advice**: one line of care advice for the current conditions
//! - **Mocks**: in-process stand-ins with failure injection for testing
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use leafcare_core::{Analyzer, Coordinates, OpenWeatherClient, PlantIdClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let analyzer = Analyzer::new(Arc::new(PlantIdClient::new("plant-id-key")?))
//!         .with_weather(Arc::new(OpenWeatherClient::new("openweather-key")?));
//!
//!     let photo = std::fs::read("monstera.jpg")?;
//!     let record = analyzer
//!         .analyze(&photo, Some(Coordinates::new(45.52, -122.68)))
//!         .await?;
//!
//!     println!("{:?}: {:?}", record.common_name, record.health_status);
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod assembly;
pub mod error;
pub mod mock;
pub mod photo;
pub mod plant_id;
pub mod recommendations;
pub mod traits;
pub mod util;
pub mod weather;

// Re-export types
pub use leafcare_types as types;

pub use analyzer::{Analyzer, Coordinates};
pub use assembly::{assemble, assemble_with};
pub use error::{Error, Result};
pub use mock::{MockIdentifier, MockWeather};
pub use photo::{ImageNormalizer, NormalizedImage, validate_upload};
pub use plant_id::PlantIdClient;
pub use recommendations::{CareGuide, SpeciesTemplate, synthesize};
pub use traits::{PlantIdentifier, WeatherProvider};
pub use weather::{CurrentConditions, OpenWeatherClient, care_advice};
