//! OpenWeatherMap current-conditions client and weather-based care advice.
//!
//! The provider's JSON body is kept verbatim so it can be stored alongside an
//! analysis. [`CurrentConditions`] pulls out the handful of values the care
//! advice needs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::traits::WeatherProvider;
use crate::util::{DEFAULT_TIMEOUT, api_error, build_http_client, normalize_base_url};

/// Production OpenWeatherMap API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

const SERVICE: &str = "OpenWeather";

/// Temperatures are requested in Fahrenheit.
pub const UNITS: &str = "imperial";

/// HTTP client for the OpenWeatherMap current weather endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    /// Create a client against the production API.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredentials`] if `api_key` is empty.
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    pub fn with_base_url(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::MissingCredentials(SERVICE));
        }

        Ok(Self {
            client: build_http_client(timeout)?,
            base_url: normalize_base_url(base_url)?,
            api_key: api_key.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current_weather(&self, latitude: f64, longitude: f64) -> Result<Value> {
        let url = format!("{}/weather", self.base_url);
        debug!("Fetching weather for ({}, {})", latitude, longitude);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", UNITS.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(SERVICE, response).await);
        }

        Ok(response.json().await?)
    }
}

/// The values care advice is derived from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentConditions {
    /// Degrees Fahrenheit.
    pub temperature: Option<f64>,
    /// Relative humidity, percent.
    pub humidity: Option<f64>,
    /// Main condition label, e.g. "Rain" or "Clear".
    pub condition: Option<String>,
}

impl CurrentConditions {
    /// Extract conditions from an OpenWeatherMap response body.
    ///
    /// Missing or mistyped fields are left as `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use leafcare_core::weather::CurrentConditions;
    /// use serde_json::json;
    ///
    /// let body = json!({"main": {"temp": 72.5, "humidity": 40}, "weather": [{"main": "Clouds"}]});
    /// let conditions = CurrentConditions::from_response(&body);
    /// assert_eq!(conditions.temperature, Some(72.5));
    /// assert_eq!(conditions.condition.as_deref(), Some("Clouds"));
    /// ```
    pub fn from_response(body: &Value) -> Self {
        Self {
            temperature: body.pointer("/main/temp").and_then(Value::as_f64),
            humidity: body.pointer("/main/humidity").and_then(Value::as_f64),
            condition: body
                .pointer("/weather/0/main")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

pub const RAIN_ADVICE: &str =
    "Rainy conditions mean reduced watering needs. Check soil moisture before next watering.";
pub const HEAT_ADVICE: &str =
    "High temperatures detected. Increase watering frequency and provide shade during peak hours.";
pub const COLD_ADVICE: &str =
    "Cool weather slows plant growth. Reduce watering and bring sensitive plants indoors.";
pub const DRY_AIR_ADVICE: &str =
    "Low humidity can stress plants. Consider grouping plants together or using a humidifier.";
pub const HUMID_AIR_ADVICE: &str = "High humidity is great for tropical plants but ensure good air circulation to prevent fungal issues.";
pub const FAVORABLE_ADVICE: &str =
    "Current weather conditions are favorable for plant growth. Maintain regular care routine.";

/// One line of care advice for the current conditions.
///
/// Checks run in order: rain, heat (above 85°F), cold (below 50°F), dry air
/// (below 30%), humid air (above 80%). The first match wins.
pub fn care_advice(conditions: &CurrentConditions) -> &'static str {
    let raining = conditions
        .condition
        .as_deref()
        .is_some_and(|c| c.to_lowercase().contains("rain"));

    if raining {
        return RAIN_ADVICE;
    }
    match conditions.temperature {
        Some(t) if t > 85.0 => return HEAT_ADVICE,
        Some(t) if t < 50.0 => return COLD_ADVICE,
        _ => {}
    }
    match conditions.humidity {
        Some(h) if h < 30.0 => DRY_AIR_ADVICE,
        Some(h) if h > 80.0 => HUMID_AIR_ADVICE,
        _ => FAVORABLE_ADVICE,
    }
}
