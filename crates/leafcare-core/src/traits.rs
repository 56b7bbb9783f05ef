//! Trait abstractions for the external services an analysis depends on.
//!
//! [`PlantIdentifier`] and [`WeatherProvider`] abstract over the real HTTP
//! clients ([`PlantIdClient`](crate::plant_id::PlantIdClient),
//! [`OpenWeatherClient`](crate::weather::OpenWeatherClient)) and the mocks in
//! [`crate::mock`].
//!
//! # Example
//!
//! ```ignore
//! use leafcare_core::{PlantIdentifier, Result};
//!
//! async fn common_name<I: PlantIdentifier>(id: &I, image: &NormalizedImage) -> Result<String> {
//!     let identification = id.identify(image).await?;
//!     Ok(identification.top_suggestion.map(|s| s.name).unwrap_or_default())
//! }
//! ```

use async_trait::async_trait;

use leafcare_types::Identification;

use crate::error::Result;
use crate::photo::NormalizedImage;

/// Species identification and health assessment for a single image.
#[async_trait]
pub trait PlantIdentifier: Send + Sync {
    /// Identify the plant in `image` and assess its health.
    ///
    /// Any error is fatal to the analysis that requested it.
    async fn identify(&self, image: &NormalizedImage) -> Result<Identification>;
}

/// Current weather at a location.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Fetch current conditions, returning the provider's response body verbatim.
    async fn current_weather(&self, latitude: f64, longitude: f64) -> Result<serde_json::Value>;
}
