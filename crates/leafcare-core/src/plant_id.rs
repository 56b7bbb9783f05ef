//! Plant.id v3 client.
//!
//! A single `POST /identification` request returns both the species
//! classification and the health assessment. The wire response is mapped onto
//! [`Identification`]; optional fields stay optional and defaults are applied
//! later, during record assembly.
//!
//! # Example
//!
//! ```no_run
//! use leafcare_core::plant_id::PlantIdClient;
//! use leafcare_core::{ImageNormalizer, PlantIdentifier};
//!
//! # async fn example(photo: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let client = PlantIdClient::new("my-api-key")?;
//! let image = ImageNormalizer::default().normalize(photo)?;
//! let identification = client.identify(&image).await?;
//! println!("{:?}", identification.top_suggestion);
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use leafcare_types::{HealthIssue, Identification, Suggestion};

use crate::error::{Error, Result};
use crate::photo::NormalizedImage;
use crate::traits::PlantIdentifier;
use crate::util::{DEFAULT_TIMEOUT, api_error, build_http_client, normalize_base_url};

/// Production Plant.id API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.plant.id/v3";

const SERVICE: &str = "Plant.id";

/// Identification request body.
#[derive(Debug, Clone, Serialize)]
pub struct IdentificationRequest {
    /// Images as data URLs.
    pub images: Vec<String>,
    pub similar_images: bool,
    /// Health assessment mode (`"all"` requests classification and health).
    pub health: &'static str,
    pub classification_level: &'static str,
}

impl IdentificationRequest {
    pub fn for_image(image: &NormalizedImage) -> Self {
        Self {
            images: vec![image.data_url()],
            similar_images: true,
            health: "all",
            classification_level: "species",
        }
    }
}

/// Identification response body (only the fields Leafcare reads).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentificationResponse {
    #[serde(default)]
    pub result: Option<ResultBody>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultBody {
    #[serde(default)]
    pub classification: Option<Classification>,
    #[serde(default)]
    pub disease: Option<Disease>,
    #[serde(default)]
    pub is_healthy: Option<IsHealthy>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Classification {
    #[serde(default)]
    pub suggestions: Vec<WireSuggestion>,
}

/// A species suggestion as sent by Plant.id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireSuggestion {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub probability: f64,
    #[serde(default)]
    pub details: Option<SuggestionDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestionDetails {
    #[serde(default)]
    pub name_authority: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Disease {
    /// Issues as received, most likely first.
    ///
    /// Kept raw so that one unreadable entry cannot fail the whole response.
    #[serde(default)]
    pub suggestions: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IsHealthy {
    #[serde(default)]
    pub binary: bool,
    #[serde(default)]
    pub probability: f64,
}

impl From<IdentificationResponse> for Identification {
    fn from(response: IdentificationResponse) -> Self {
        let result = response.result.unwrap_or_default();

        let top_suggestion = result
            .classification
            .and_then(|c| c.suggestions.into_iter().next())
            .map(|s| Suggestion {
                name: s.name,
                authority_name: s.details.and_then(|d| d.name_authority),
                probability: s.probability,
            });

        Identification {
            top_suggestion,
            is_healthy: result.is_healthy.is_some_and(|h| h.binary),
            issues: result
                .disease
                .map(|d| d.suggestions.into_iter().filter_map(read_issue).collect())
                .unwrap_or_default(),
        }
    }
}

/// Read one disease suggestion; entries without a usable name and
/// probability are skipped.
fn read_issue(value: Value) -> Option<HealthIssue> {
    match serde_json::from_value(value) {
        Ok(issue) => Some(issue),
        Err(e) => {
            warn!("Skipping unreadable health issue: {}", e);
            None
        }
    }
}

/// HTTP client for the Plant.id identification API.
#[derive(Debug, Clone)]
pub struct PlantIdClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PlantIdClient {
    /// Create a client against the production API.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCredentials`] if `api_key` is empty.
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Create a client against a custom base URL (e.g. a local stub).
    pub fn with_base_url(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::MissingCredentials(SERVICE));
        }
        let base_url = normalize_base_url(base_url)?;
        let client = build_http_client(timeout)?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl PlantIdentifier for PlantIdClient {
    async fn identify(&self, image: &NormalizedImage) -> Result<Identification> {
        let url = format!("{}/identification", self.base_url);
        info!("Requesting identification for {} byte image", image.bytes.len());

        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&IdentificationRequest::for_image(image))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(SERVICE, response).await);
        }

        let body: IdentificationResponse = response.json().await?;
        let identification = Identification::from(body);
        debug!(
            "Identification: top={:?}, healthy={}, issues={}",
            identification.top_suggestion.as_ref().map(|s| &s.name),
            identification.is_healthy,
            identification.issues.len()
        );

        Ok(identification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RESPONSE: &str = r#"{
        "access_token": "abc",
        "result": {
            "is_plant": {"probability": 0.99, "binary": true},
            "classification": {
                "suggestions": [
                    {
                        "id": "1",
                        "name": "Monstera deliciosa",
                        "probability": 0.93,
                        "details": {"name_authority": "Monstera deliciosa Liebm."}
                    },
                    {"id": "2", "name": "Monstera adansonii", "probability": 0.04}
                ]
            },
            "is_healthy": {"probability": 0.21, "binary": false},
            "disease": {
                "suggestions": [
                    {
                        "id": "d1",
                        "name": "leaf spot",
                        "probability": 0.8,
                        "details": {
                            "description": "Fungal spots",
                            "treatment": {
                                "biological": ["neem"],
                                "chemical": ["copper fungicide"],
                                "prevention": ["improve airflow", "reduce leaf wetness"]
                            }
                        }
                    },
                    {"id": "d2", "name": "water deficiency", "probability": 0.3}
                ]
            }
        }
    }"#;

    #[test]
    fn test_response_maps_to_identification() {
        let response: IdentificationResponse = serde_json::from_str(SAMPLE_RESPONSE).unwrap();
        let identification = Identification::from(response);

        let top = identification.top_suggestion.unwrap();
        assert_eq!(top.name, "Monstera deliciosa");
        assert_eq!(top.authority_name.as_deref(), Some("Monstera deliciosa Liebm."));
        assert_eq!(top.probability, 0.93);

        assert!(!identification.is_healthy);
        assert_eq!(identification.issues.len(), 2);
        assert_eq!(identification.issues[0].name, "leaf spot");
        assert_eq!(identification.issues[1].name, "water deficiency");
        assert_eq!(
            identification.issues[0].treatment().unwrap().chemical,
            ["copper fungicide"]
        );
        assert!(identification.issues[1].treatment().is_none());
    }

    #[test]
    fn test_malformed_treatment_does_not_fail_response() {
        let json = r#"{"result": {"disease": {"suggestions": [
            {"name": "blight", "probability": 0.6,
             "details": {"treatment": {"biological": "spray neem"}}}
        ]}}}"#;
        let response: IdentificationResponse = serde_json::from_str(json).unwrap();
        let identification = Identification::from(response);

        assert_eq!(identification.issues.len(), 1);
        let issue = &identification.issues[0];
        assert!(issue.treatment().unwrap().biological.is_empty());
        assert_eq!(
            issue.details.as_ref().unwrap().treatment.as_ref().unwrap()["biological"],
            "spray neem"
        );
    }

    #[test]
    fn test_issue_fields_are_kept_verbatim() {
        let response: IdentificationResponse = serde_json::from_str(SAMPLE_RESPONSE).unwrap();
        let identification = Identification::from(response);

        let issue = serde_json::to_value(&identification.issues[0]).unwrap();
        let raw: Value = serde_json::from_str(SAMPLE_RESPONSE).unwrap();
        assert_eq!(issue, raw["result"]["disease"]["suggestions"][0]);
        assert_eq!(identification.issues[1].extra["id"], "d2");
    }

    #[test]
    fn test_unreadable_issue_is_skipped() {
        let json = r#"{"result": {"disease": {"suggestions": [
            {"name": 42},
            {"name": "root rot", "probability": 0.4}
        ]}}}"#;
        let response: IdentificationResponse = serde_json::from_str(json).unwrap();
        let identification = Identification::from(response);

        assert_eq!(identification.issues.len(), 1);
        assert_eq!(identification.issues[0].name, "root rot");
    }

    #[test]
    fn test_empty_response_maps_to_empty_identification() {
        let response: IdentificationResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(Identification::from(response), Identification::default());
    }

    #[test]
    fn test_suggestion_without_details() {
        let json = r#"{"result": {"classification": {"suggestions": [{"name": "Ficus"}]}}}"#;
        let response: IdentificationResponse = serde_json::from_str(json).unwrap();
        let top = Identification::from(response).top_suggestion.unwrap();
        assert_eq!(top.name, "Ficus");
        assert_eq!(top.authority_name, None);
        assert_eq!(top.probability, 0.0);
    }

    #[test]
    fn test_request_body_shape() {
        let image = NormalizedImage {
            mime_type: "image/jpeg",
            bytes: vec![1, 2, 3],
        };
        let body = serde_json::to_value(IdentificationRequest::for_image(&image)).unwrap();
        assert_eq!(body["images"][0], "data:image/jpeg;base64,AQID");
        assert_eq!(body["similar_images"], true);
        assert_eq!(body["health"], "all");
        assert_eq!(body["classification_level"], "species");
    }

    #[test]
    fn test_client_requires_api_key() {
        let result = PlantIdClient::new("");
        assert!(matches!(result, Err(Error::MissingCredentials("Plant.id"))));
    }

    #[test]
    fn test_client_normalizes_url() {
        let client =
            PlantIdClient::with_base_url("key", "http://localhost:8080/v3/", DEFAULT_TIMEOUT)
                .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/v3");
    }

    #[test]
    fn test_client_invalid_url() {
        let result = PlantIdClient::with_base_url("key", "api.plant.id", DEFAULT_TIMEOUT);
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }
}
