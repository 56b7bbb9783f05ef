//! Mock external services for testing.
//!
//! [`MockIdentifier`] and [`MockWeather`] implement [`PlantIdentifier`] and
//! [`WeatherProvider`] without any network access, so the analysis pipeline
//! and the HTTP service can be exercised in tests.
//!
//! # Features
//!
//! - **Canned responses**: set the identification or weather body returned
//! - **Failure injection**: fail every call, or only the next `n` calls
//! - **Latency simulation**: delay each call by a fixed duration
//! - **Call counting**: check how often the service was hit

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use leafcare_types::Identification;

use crate::error::{Error, Result};
use crate::photo::NormalizedImage;
use crate::traits::{PlantIdentifier, WeatherProvider};

/// Status code reported by injected failures.
pub const MOCK_FAILURE_STATUS: u16 = 503;

/// Shared failure / latency / counter state for the mocks.
#[derive(Debug)]
struct Behavior {
    service: &'static str,
    call_count: AtomicU32,
    should_fail: AtomicBool,
    fail_message: RwLock<String>,
    remaining_failures: AtomicU32,
    latency_ms: AtomicU64,
}

impl Behavior {
    fn new(service: &'static str) -> Self {
        Self {
            service,
            call_count: AtomicU32::new(0),
            should_fail: AtomicBool::new(false),
            fail_message: RwLock::new("Mock failure".to_string()),
            remaining_failures: AtomicU32::new(0),
            latency_ms: AtomicU64::new(0),
        }
    }

    async fn begin_call(&self) -> Result<()> {
        self.call_count.fetch_add(1, Ordering::Relaxed);

        let latency = self.latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        let transient = self
            .remaining_failures
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok();

        if transient || self.should_fail.load(Ordering::Relaxed) {
            return Err(Error::Api {
                service: self.service,
                status: MOCK_FAILURE_STATUS,
                body: self.fail_message.read().await.clone(),
            });
        }
        Ok(())
    }

    async fn set_should_fail(&self, fail: bool, message: Option<&str>) {
        self.should_fail.store(fail, Ordering::Relaxed);
        if let Some(msg) = message {
            *self.fail_message.write().await = msg.to_string();
        }
    }
}

/// A mock plant identifier.
///
/// # Example
///
/// ```
/// use leafcare_core::{MockIdentifier, NormalizedImage, PlantIdentifier};
/// use leafcare_types::{Identification, Suggestion};
///
/// #[tokio::main]
/// async fn main() {
///     let mock = MockIdentifier::new(Identification {
///         top_suggestion: Some(Suggestion::new("Monstera deliciosa", 0.9)),
///         ..Default::default()
///     });
///     let image = NormalizedImage { mime_type: "image/jpeg", bytes: vec![] };
///
///     let result = mock.identify(&image).await.unwrap();
///     assert_eq!(result.top_suggestion.unwrap().name, "Monstera deliciosa");
///     assert_eq!(mock.call_count(), 1);
/// }
/// ```
#[derive(Debug)]
pub struct MockIdentifier {
    identification: RwLock<Identification>,
    behavior: Behavior,
}

impl Default for MockIdentifier {
    fn default() -> Self {
        Self::new(Identification::default())
    }
}

impl MockIdentifier {
    /// Create a mock that returns `identification` for every image.
    pub fn new(identification: Identification) -> Self {
        Self {
            identification: RwLock::new(identification),
            behavior: Behavior::new("Plant.id"),
        }
    }

    /// Replace the canned identification.
    pub async fn set_identification(&self, identification: Identification) {
        *self.identification.write().await = identification;
    }

    /// Make every subsequent call fail (or succeed again with `false`).
    pub async fn set_should_fail(&self, fail: bool, message: Option<&str>) {
        self.behavior.set_should_fail(fail, message).await;
    }

    /// Fail the next `count` calls, then succeed.
    pub fn set_transient_failures(&self, count: u32) {
        self.behavior.remaining_failures.store(count, Ordering::Relaxed);
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.behavior
            .latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Number of `identify` calls made, including failed ones.
    pub fn call_count(&self) -> u32 {
        self.behavior.call_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PlantIdentifier for MockIdentifier {
    async fn identify(&self, _image: &NormalizedImage) -> Result<Identification> {
        self.behavior.begin_call().await?;
        Ok(self.identification.read().await.clone())
    }
}

/// A mock weather provider.
#[derive(Debug)]
pub struct MockWeather {
    body: RwLock<Value>,
    last_location: RwLock<Option<(f64, f64)>>,
    behavior: Behavior,
}

impl Default for MockWeather {
    fn default() -> Self {
        Self::new(serde_json::json!({
            "weather": [{"main": "Clear", "description": "clear sky"}],
            "main": {"temp": 72.0, "humidity": 55},
            "name": "Mockville"
        }))
    }
}

impl MockWeather {
    /// Create a mock that returns `body` for every location.
    pub fn new(body: Value) -> Self {
        Self {
            body: RwLock::new(body),
            last_location: RwLock::new(None),
            behavior: Behavior::new("OpenWeather"),
        }
    }

    pub async fn set_body(&self, body: Value) {
        *self.body.write().await = body;
    }

    pub async fn set_should_fail(&self, fail: bool, message: Option<&str>) {
        self.behavior.set_should_fail(fail, message).await;
    }

    pub fn set_transient_failures(&self, count: u32) {
        self.behavior.remaining_failures.store(count, Ordering::Relaxed);
    }

    pub fn call_count(&self) -> u32 {
        self.behavior.call_count.load(Ordering::Relaxed)
    }

    /// Coordinates of the most recent call.
    pub async fn last_location(&self) -> Option<(f64, f64)> {
        *self.last_location.read().await
    }
}

#[async_trait]
impl WeatherProvider for MockWeather {
    async fn current_weather(&self, latitude: f64, longitude: f64) -> Result<Value> {
        *self.last_location.write().await = Some((latitude, longitude));
        self.behavior.begin_call().await?;
        Ok(self.body.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leafcare_types::Suggestion;

    fn image() -> NormalizedImage {
        NormalizedImage {
            mime_type: "image/jpeg",
            bytes: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_identifier_returns_canned_result() {
        let mock = MockIdentifier::default();
        mock.set_identification(Identification {
            top_suggestion: Some(Suggestion::new("Ficus", 0.5)),
            ..Default::default()
        })
        .await;

        let result = mock.identify(&image()).await.unwrap();
        assert_eq!(result.top_suggestion.unwrap().name, "Ficus");
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_identifier_fail() {
        let mock = MockIdentifier::default();
        mock.set_should_fail(true, Some("quota exceeded")).await;

        let err = mock.identify(&image()).await.unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
        assert!(matches!(err, Error::Api { status: 503, .. }));

        mock.set_should_fail(false, None).await;
        assert!(mock.identify(&image()).await.is_ok());
    }

    #[tokio::test]
    async fn test_transient_failures() {
        let mock = MockWeather::default();
        mock.set_transient_failures(2);

        assert!(mock.current_weather(1.0, 2.0).await.is_err());
        assert!(mock.current_weather(1.0, 2.0).await.is_err());
        assert!(mock.current_weather(1.0, 2.0).await.is_ok());
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_weather_records_location() {
        let mock = MockWeather::default();
        let body = mock.current_weather(45.5, -122.6).await.unwrap();
        assert_eq!(body["main"]["temp"], 72.0);
        assert_eq!(mock.last_location().await, Some((45.5, -122.6)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_simulation() {
        let mock = MockIdentifier::default();
        mock.set_latency(Duration::from_millis(200));

        let start = tokio::time::Instant::now();
        mock.identify(&image()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(200));
    }
}
