//! The analysis pipeline.
//!
//! [`Analyzer::analyze`] runs one upload through every stage:
//!
//! 1. Normalize the image (fatal on failure)
//! 2. Identify species and health (fatal on failure)
//! 3. Fetch weather when coordinates and a provider are available (failure is
//!    logged and the analysis continues without weather)
//! 4. Assemble the unsaved record
//!
//! Persisting the record is left to the caller.

use std::sync::Arc;

use tracing::{debug, info, warn};

use leafcare_types::InsertPlantAnalysis;

use crate::assembly::assemble_with;
use crate::error::Result;
use crate::photo::ImageNormalizer;
use crate::recommendations::CareGuide;
use crate::traits::{PlantIdentifier, WeatherProvider};

/// A latitude / longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Runs uploads through normalization, identification, weather and assembly.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use leafcare_core::{Analyzer, MockIdentifier};
///
/// let analyzer = Analyzer::new(Arc::new(MockIdentifier::default()));
/// assert!(!analyzer.has_weather());
/// ```
#[derive(Clone)]
pub struct Analyzer {
    normalizer: ImageNormalizer,
    identifier: Arc<dyn PlantIdentifier>,
    weather: Option<Arc<dyn WeatherProvider>>,
    care_guide: Arc<CareGuide>,
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("normalizer", &self.normalizer)
            .field("has_weather", &self.weather.is_some())
            .field("templates", &self.care_guide.templates().len())
            .finish()
    }
}

impl Analyzer {
    /// Create an analyzer with default normalization, no weather provider and
    /// the built-in care guide.
    pub fn new(identifier: Arc<dyn PlantIdentifier>) -> Self {
        Self {
            normalizer: ImageNormalizer::default(),
            identifier,
            weather: None,
            care_guide: Arc::new(CareGuide::default()),
        }
    }

    #[must_use]
    pub fn with_weather(mut self, weather: Arc<dyn WeatherProvider>) -> Self {
        self.weather = Some(weather);
        self
    }

    #[must_use]
    pub fn with_normalizer(mut self, normalizer: ImageNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    #[must_use]
    pub fn with_care_guide(mut self, care_guide: CareGuide) -> Self {
        self.care_guide = Arc::new(care_guide);
        self
    }

    pub fn has_weather(&self) -> bool {
        self.weather.is_some()
    }

    pub fn care_guide(&self) -> &CareGuide {
        &self.care_guide
    }

    /// Analyze an uploaded image.
    ///
    /// # Errors
    ///
    /// Fails if the image cannot be normalized or identification fails.
    /// Weather problems never fail the analysis.
    pub async fn analyze(
        &self,
        data: &[u8],
        location: Option<Coordinates>,
    ) -> Result<InsertPlantAnalysis> {
        let image = self.normalizer.normalize(data)?;
        let identification = self.identifier.identify(&image).await?;
        debug!(
            "Identified {:?} with {} issue(s)",
            identification.top_suggestion.as_ref().map(|s| &s.name),
            identification.issues.len()
        );

        let weather = match (&self.weather, location) {
            (Some(provider), Some(at)) => {
                match provider.current_weather(at.latitude, at.longitude).await {
                    Ok(body) => Some(body),
                    Err(e) => {
                        warn!("Weather lookup failed, continuing without it: {}", e);
                        None
                    }
                }
            }
            _ => None,
        };

        let record = assemble_with(&self.care_guide, image.data_url(), &identification, weather);
        info!(
            "Analysis complete: {} ({})",
            record.common_name.as_deref().unwrap_or_default(),
            record
                .health_status
                .map(|s| s.as_str())
                .unwrap_or_default()
        );
        Ok(record)
    }
}
