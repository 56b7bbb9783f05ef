//! Core types for Leafcare plant analyses.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::error::ParseError;

/// Overall health verdict for an analysed plant.
///
/// Serialized with the human-readable labels used by the HTTP API
/// (`"Healthy"`, `"Issues Detected"`, `"Unknown"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    /// The identification service flagged the plant as healthy.
    #[serde(rename = "Healthy")]
    Healthy,
    /// At least one disease or disorder was reported.
    #[serde(rename = "Issues Detected")]
    IssuesDetected,
    /// Neither a healthy verdict nor any issue was reported.
    #[serde(rename = "Unknown")]
    Unknown,
}

impl HealthStatus {
    /// The label used on the wire and in storage.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "Healthy",
            HealthStatus::IssuesDetected => "Issues Detected",
            HealthStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthStatus {
    type Err = ParseError;

    /// Parse a health status label.
    ///
    /// # Examples
    ///
    /// ```
    /// use leafcare_types::HealthStatus;
    ///
    /// assert_eq!("Healthy".parse(), Ok(HealthStatus::Healthy));
    /// assert_eq!("Issues Detected".parse(), Ok(HealthStatus::IssuesDetected));
    /// assert!("sick".parse::<HealthStatus>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Healthy" => Ok(HealthStatus::Healthy),
            "Issues Detected" => Ok(HealthStatus::IssuesDetected),
            "Unknown" => Ok(HealthStatus::Unknown),
            other => Err(ParseError::UnknownHealthStatus(other.to_string())),
        }
    }
}

/// Treatment guidance attached to a detected issue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treatment {
    /// Organic / biological measures.
    #[serde(default)]
    pub biological: Vec<String>,
    /// Chemical measures.
    #[serde(default)]
    pub chemical: Vec<String>,
    /// Preventive measures, most important first.
    #[serde(default)]
    pub prevention: Vec<String>,
}

impl Treatment {
    /// Read treatment lists from a raw payload.
    ///
    /// A list that is missing or is not an array of strings reads as empty,
    /// so a malformed payload never fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use leafcare_types::Treatment;
    ///
    /// let raw = serde_json::json!({"biological": "spray neem", "chemical": ["copper"]});
    /// let treatment = Treatment::from_value(&raw);
    /// assert!(treatment.biological.is_empty());
    /// assert_eq!(treatment.chemical, ["copper"]);
    /// ```
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let list = |key: &str| {
            value
                .get(key)
                .and_then(|v| Vec::<String>::deserialize(v).ok())
                .unwrap_or_default()
        };
        Self {
            biological: list("biological"),
            chemical: list("chemical"),
            prevention: list("prevention"),
        }
    }

    /// The payload form of these lists.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "biological": self.biological,
            "chemical": self.chemical,
            "prevention": self.prevention,
        })
    }
}

/// Extra detail the identification service returns for an issue.
///
/// The treatment payload is kept as received; fields Leafcare does not read
/// are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A disease or disorder reported by the health assessment.
///
/// `probability` is kept exactly as reported; it is not clamped to `[0, 1]`.
/// Unrecognised fields (`id`, `similar_images`, ...) are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthIssue {
    /// Issue name (e.g. "leaf spot").
    pub name: String,
    /// Likelihood reported by the identification service.
    pub probability: f64,
    /// Description and treatment, when the service supplied them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<IssueDetails>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HealthIssue {
    /// Create an issue without details.
    pub fn new(name: impl Into<String>, probability: f64) -> Self {
        Self {
            name: name.into(),
            probability,
            details: None,
            extra: Map::new(),
        }
    }

    /// Attach treatment guidance, keeping any existing description.
    #[must_use]
    pub fn with_treatment(mut self, treatment: Treatment) -> Self {
        self.details.get_or_insert_with(IssueDetails::default).treatment =
            Some(treatment.to_value());
        self
    }

    /// Attach a description, keeping any existing treatment.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.details.get_or_insert_with(IssueDetails::default).description =
            Some(description.into());
        self
    }

    /// Treatment guidance read from the raw payload, if any was supplied.
    ///
    /// See [`Treatment::from_value`] for how malformed lists are read.
    pub fn treatment(&self) -> Option<Treatment> {
        self.details
            .as_ref()
            .and_then(|d| d.treatment.as_ref())
            .map(Treatment::from_value)
    }
}

/// Best species match from the identification service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Plain species name.
    pub name: String,
    /// Species name with naming authority (e.g. "Monstera deliciosa Liebm.").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority_name: Option<String>,
    /// Probability of a correct match, as reported.
    pub probability: f64,
}

impl Suggestion {
    pub fn new(name: impl Into<String>, probability: f64) -> Self {
        Self {
            name: name.into(),
            authority_name: None,
            probability,
        }
    }

    #[must_use]
    pub fn with_authority(mut self, authority_name: impl Into<String>) -> Self {
        self.authority_name = Some(authority_name.into());
        self
    }
}

/// Normalized result of one identification + health assessment call.
///
/// Fields mirror what the service may or may not return; defaults for
/// absent values are applied during record assembly, not here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identification {
    /// Top species suggestion, if any.
    pub top_suggestion: Option<Suggestion>,
    /// The service's binary "is healthy" flag.
    pub is_healthy: bool,
    /// Detected issues, most likely first.
    pub issues: Vec<HealthIssue>,
}

/// One track (organic or chemical) of a treatment plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentTrack {
    pub description: String,
    pub steps: Vec<String>,
    pub timeline: String,
}

/// Derived three-part care plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentPlan {
    /// Care steps to take now, in display order.
    pub immediate: Vec<String>,
    pub organic: TreatmentTrack,
    pub chemical: TreatmentTrack,
}

/// A plant analysis before it has been persisted.
///
/// Identical to [`PlantAnalysis`] minus the store-assigned `id` and
/// `analysis_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertPlantAnalysis {
    pub image_url: String,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(default)]
    pub scientific_name: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub health_status: Option<HealthStatus>,
    #[serde(default)]
    pub health_issues: Option<Vec<HealthIssue>>,
    #[serde(default)]
    pub treatment_recommendations: Option<TreatmentPlan>,
    /// Weather API response captured at analysis time, stored verbatim.
    #[serde(default)]
    pub weather_data: Option<serde_json::Value>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl InsertPlantAnalysis {
    /// A record carrying only the image; every other field is unknown.
    pub fn new(image_url: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            common_name: None,
            scientific_name: None,
            confidence: None,
            health_status: None,
            health_issues: None,
            treatment_recommendations: None,
            weather_data: None,
            user_id: None,
        }
    }
}

/// A persisted plant analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantAnalysis {
    /// Store-assigned identifier, unique for the store's lifetime.
    pub id: String,
    pub image_url: String,
    pub common_name: Option<String>,
    pub scientific_name: Option<String>,
    pub confidence: Option<f64>,
    pub health_status: Option<HealthStatus>,
    pub health_issues: Option<Vec<HealthIssue>>,
    pub treatment_recommendations: Option<TreatmentPlan>,
    pub weather_data: Option<serde_json::Value>,
    /// When the analysis was stored.
    #[serde(with = "time::serde::rfc3339")]
    pub analysis_date: OffsetDateTime,
    pub user_id: Option<String>,
}

impl PlantAnalysis {
    /// Combine an unsaved record with its store-assigned identity.
    pub fn from_insert(
        id: impl Into<String>,
        analysis_date: OffsetDateTime,
        insert: InsertPlantAnalysis,
    ) -> Self {
        Self {
            id: id.into(),
            image_url: insert.image_url,
            common_name: insert.common_name,
            scientific_name: insert.scientific_name,
            confidence: insert.confidence,
            health_status: insert.health_status,
            health_issues: insert.health_issues,
            treatment_recommendations: insert.treatment_recommendations,
            weather_data: insert.weather_data,
            analysis_date,
            user_id: insert.user_id,
        }
    }

    /// The record's content without `id` and `analysis_date`.
    pub fn to_insert(&self) -> InsertPlantAnalysis {
        InsertPlantAnalysis {
            image_url: self.image_url.clone(),
            common_name: self.common_name.clone(),
            scientific_name: self.scientific_name.clone(),
            confidence: self.confidence,
            health_status: self.health_status,
            health_issues: self.health_issues.clone(),
            treatment_recommendations: self.treatment_recommendations.clone(),
            weather_data: self.weather_data.clone(),
            user_id: self.user_id.clone(),
        }
    }

    /// Case-insensitive substring match on the common or scientific name.
    ///
    /// An empty term matches every record.
    ///
    /// # Examples
    ///
    /// ```
    /// use leafcare_types::{InsertPlantAnalysis, PlantAnalysis};
    /// use time::OffsetDateTime;
    ///
    /// let mut insert = InsertPlantAnalysis::new("data:image/jpeg;base64,");
    /// insert.common_name = Some("Swiss cheese plant".to_string());
    /// insert.scientific_name = Some("Monstera deliciosa".to_string());
    /// let record = PlantAnalysis::from_insert("id-1", OffsetDateTime::UNIX_EPOCH, insert);
    ///
    /// assert!(record.matches_name("CHEESE"));
    /// assert!(record.matches_name("monstera"));
    /// assert!(!record.matches_name("ficus"));
    /// ```
    #[must_use]
    pub fn matches_name(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        if term.is_empty() {
            return true;
        }
        [&self.common_name, &self.scientific_name]
            .into_iter()
            .flatten()
            .any(|name| name.to_lowercase().contains(&term))
    }
}
