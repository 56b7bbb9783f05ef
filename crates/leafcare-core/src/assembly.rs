//! Record assembly.
//!
//! Turns an [`Identification`] and an optional weather snapshot into an
//! [`InsertPlantAnalysis`]. This is the only place defaults for absent
//! identification fields are applied.

use serde_json::Value;

use leafcare_types::{HealthStatus, Identification, InsertPlantAnalysis, TreatmentPlan};

use crate::recommendations::{self, CareGuide};

/// Common name used when the identifier returns no usable name.
pub const UNKNOWN_PLANT: &str = "Unknown Plant";

/// Derive the overall health verdict.
///
/// The healthy flag takes precedence over any reported issues.
pub fn health_status(identification: &Identification) -> HealthStatus {
    if identification.is_healthy {
        HealthStatus::Healthy
    } else if !identification.issues.is_empty() {
        HealthStatus::IssuesDetected
    } else {
        HealthStatus::Unknown
    }
}

/// Assemble a record using the built-in care guide.
///
/// # Example
///
/// ```
/// use leafcare_core::assembly::assemble;
/// use leafcare_types::{HealthStatus, Identification};
///
/// let record = assemble("data:image/jpeg;base64,", &Identification::default(), None);
/// assert_eq!(record.common_name.as_deref(), Some("Unknown Plant"));
/// assert_eq!(record.scientific_name.as_deref(), Some(""));
/// assert_eq!(record.health_status, Some(HealthStatus::Unknown));
/// ```
pub fn assemble(
    image_url: impl Into<String>,
    identification: &Identification,
    weather: Option<Value>,
) -> InsertPlantAnalysis {
    let plan = recommendations::synthesize(
        identification.top_suggestion.as_ref(),
        &identification.issues,
    );
    build(image_url.into(), identification, weather, plan)
}

/// Assemble a record, synthesizing the plan with `guide`.
pub fn assemble_with(
    guide: &CareGuide,
    image_url: impl Into<String>,
    identification: &Identification,
    weather: Option<Value>,
) -> InsertPlantAnalysis {
    let plan = guide.synthesize(identification.top_suggestion.as_ref(), &identification.issues);
    build(image_url.into(), identification, weather, plan)
}

fn build(
    image_url: String,
    identification: &Identification,
    weather: Option<Value>,
    plan: TreatmentPlan,
) -> InsertPlantAnalysis {
    let top = identification.top_suggestion.as_ref();
    let name = top.map(|s| s.name.as_str()).filter(|n| !n.is_empty());
    let authority = top
        .and_then(|s| s.authority_name.as_deref())
        .filter(|n| !n.is_empty());

    InsertPlantAnalysis {
        image_url,
        common_name: Some(name.unwrap_or(UNKNOWN_PLANT).to_string()),
        scientific_name: Some(authority.or(name).unwrap_or_default().to_string()),
        confidence: Some(top.map_or(0.0, |s| s.probability)),
        health_status: Some(health_status(identification)),
        health_issues: Some(identification.issues.clone()),
        treatment_recommendations: Some(plan),
        weather_data: weather,
        user_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leafcare_types::{HealthIssue, Suggestion, Treatment};
    use serde_json::json;

    use crate::recommendations::{SpeciesTemplate, generic_template};

    const IMAGE: &str = "data:image/jpeg;base64,AAAA";

    #[test]
    fn test_full_identification() {
        let identification = Identification {
            top_suggestion: Some(
                Suggestion::new("Monstera deliciosa", 0.93).with_authority("Monstera deliciosa Liebm."),
            ),
            is_healthy: false,
            issues: vec![HealthIssue::new("leaf spot", 0.8)],
        };
        let weather = json!({"main": {"temp": 70}});

        let record = assemble(IMAGE, &identification, Some(weather.clone()));

        assert_eq!(record.image_url, IMAGE);
        assert_eq!(record.common_name.as_deref(), Some("Monstera deliciosa"));
        assert_eq!(
            record.scientific_name.as_deref(),
            Some("Monstera deliciosa Liebm.")
        );
        assert_eq!(record.confidence, Some(0.93));
        assert_eq!(record.health_status, Some(HealthStatus::IssuesDetected));
        assert_eq!(record.health_issues, Some(identification.issues.clone()));
        assert_eq!(record.weather_data, Some(weather));
        assert_eq!(record.user_id, None);
    }

    #[test]
    fn test_defaults_without_suggestion() {
        let record = assemble(IMAGE, &Identification::default(), None);

        assert_eq!(record.common_name.as_deref(), Some(UNKNOWN_PLANT));
        assert_eq!(record.scientific_name.as_deref(), Some(""));
        assert_eq!(record.confidence, Some(0.0));
        assert_eq!(record.health_status, Some(HealthStatus::Unknown));
        assert_eq!(record.health_issues, Some(Vec::new()));
        assert_eq!(record.weather_data, None);

        let plan = record.treatment_recommendations.unwrap();
        assert_eq!(plan.immediate, generic_template().immediate);
    }

    #[test]
    fn test_scientific_name_falls_back_to_name() {
        let identification = Identification {
            top_suggestion: Some(Suggestion::new("Ficus lyrata", 0.7).with_authority("")),
            ..Default::default()
        };
        let record = assemble(IMAGE, &identification, None);
        assert_eq!(record.scientific_name.as_deref(), Some("Ficus lyrata"));
    }

    #[test]
    fn test_empty_name_is_unknown_plant() {
        let identification = Identification {
            top_suggestion: Some(Suggestion::new("", 0.4)),
            ..Default::default()
        };
        let record = assemble(IMAGE, &identification, None);
        assert_eq!(record.common_name.as_deref(), Some(UNKNOWN_PLANT));
        assert_eq!(record.scientific_name.as_deref(), Some(""));
        assert_eq!(record.confidence, Some(0.4));
    }

    #[test]
    fn test_healthy_flag_wins_over_issues() {
        let identification = Identification {
            top_suggestion: None,
            is_healthy: true,
            issues: vec![HealthIssue::new("mild chlorosis", 0.05)],
        };
        assert_eq!(health_status(&identification), HealthStatus::Healthy);
    }

    #[test]
    fn test_confidence_not_clamped() {
        let identification = Identification {
            top_suggestion: Some(Suggestion::new("Ficus", 1.7)),
            ..Default::default()
        };
        assert_eq!(assemble(IMAGE, &identification, None).confidence, Some(1.7));
    }

    #[test]
    fn test_issue_treatments_reach_plan() {
        let identification = Identification {
            top_suggestion: Some(Suggestion::new("Basil", 0.9)),
            is_healthy: false,
            issues: vec![HealthIssue::new("aphids", 0.6).with_treatment(Treatment {
                biological: vec!["ladybugs".to_string()],
                chemical: vec!["pyrethrin".to_string()],
                prevention: vec![],
            })],
        };
        let plan = assemble(IMAGE, &identification, None)
            .treatment_recommendations
            .unwrap();
        assert_eq!(plan.organic.steps.last().map(String::as_str), Some("ladybugs"));
        assert_eq!(plan.chemical.steps.last().map(String::as_str), Some("pyrethrin"));
    }

    #[test]
    fn test_assemble_with_custom_guide() {
        let guide = CareGuide::with_templates([SpeciesTemplate {
            keywords: vec!["basil".to_string()],
            immediate: vec!["Pinch off flower buds".to_string()],
            organic: Vec::new(),
            chemical: Vec::new(),
        }]);
        let identification = Identification {
            top_suggestion: Some(Suggestion::new("Sweet Basil", 0.9)),
            ..Default::default()
        };
        let plan = assemble_with(&guide, IMAGE, &identification, None)
            .treatment_recommendations
            .unwrap();
        assert_eq!(plan.immediate, ["Pinch off flower buds"]);
    }
}
