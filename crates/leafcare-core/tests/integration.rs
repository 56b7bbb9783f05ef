//! Integration tests for leafcare-core
//!
//! These run the full analysis pipeline against the in-process mocks, so no
//! network access or API keys are needed.

use std::io::Cursor;
use std::sync::Arc;

use leafcare_core::recommendations::{CHEMICAL_DESCRIPTION, ORGANIC_DESCRIPTION};
use leafcare_core::{
    Analyzer, CareGuide, Coordinates, CurrentConditions, ImageNormalizer, MockIdentifier,
    MockWeather, SpeciesTemplate, care_advice, validate_upload,
};
use leafcare_types::{HealthIssue, HealthStatus, Identification, Suggestion, Treatment};
use tracing_subscriber::EnvFilter;

/// Route pipeline logs to the test harness; `RUST_LOG=debug` shows them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn photo(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([30, 140, 50]));
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn sick_monstera() -> Identification {
    Identification {
        top_suggestion: Some(
            Suggestion::new("Monstera deliciosa", 0.95).with_authority("Monstera deliciosa Liebm."),
        ),
        is_healthy: false,
        issues: vec![
            HealthIssue::new("Leaf spot", 0.8)
                .with_description("Fungal or bacterial spotting")
                .with_treatment(Treatment {
                    biological: vec!["Remove affected leaves".to_string()],
                    chemical: vec!["Copper fungicide".to_string()],
                    prevention: vec![
                        "Avoid overhead watering".to_string(),
                        "Improve air circulation".to_string(),
                        "Sterilize tools".to_string(),
                    ],
                }),
            HealthIssue::new("Nutrient deficiency", 0.2),
        ],
    }
}

#[tokio::test]
async fn test_pipeline_sick_monstera_with_weather() {
    init_tracing();
    let weather = Arc::new(MockWeather::new(serde_json::json!({
        "weather": [{"main": "Rain"}],
        "main": {"temp": 64.0, "humidity": 90}
    })));
    let analyzer = Analyzer::new(Arc::new(MockIdentifier::new(sick_monstera())))
        .with_weather(weather.clone());

    let record = analyzer
        .analyze(&photo(2048, 1024), Some(Coordinates::new(51.5, -0.12)))
        .await
        .unwrap();

    assert_eq!(record.common_name.as_deref(), Some("Monstera deliciosa"));
    assert_eq!(
        record.scientific_name.as_deref(),
        Some("Monstera deliciosa Liebm.")
    );
    assert_eq!(record.confidence, Some(0.95));
    assert_eq!(record.health_status, Some(HealthStatus::IssuesDetected));

    let issues = record.health_issues.as_ref().unwrap();
    assert_eq!(issues[0].name, "Leaf spot");
    assert_eq!(issues[1].name, "Nutrient deficiency");

    let plan = record.treatment_recommendations.as_ref().unwrap();
    assert_eq!(plan.immediate.len(), 6);
    assert_eq!(&plan.immediate[4..], ["Avoid overhead watering", "Improve air circulation"]);
    assert_eq!(plan.organic.steps.len(), 4);
    assert_eq!(plan.organic.steps[3], "Remove affected leaves");
    assert_eq!(plan.organic.description, ORGANIC_DESCRIPTION);
    assert_eq!(plan.chemical.steps.len(), 3);
    assert_eq!(plan.chemical.steps[2], "Copper fungicide");
    assert_eq!(plan.chemical.description, CHEMICAL_DESCRIPTION);

    let weather_data = record.weather_data.as_ref().unwrap();
    let advice = care_advice(&CurrentConditions::from_response(weather_data));
    assert!(advice.starts_with("Rainy conditions"));
    assert_eq!(weather.call_count(), 1);

    // The stored image is the normalized JPEG, bounded to 1024px
    let encoded = record.image_url.strip_prefix("data:image/jpeg;base64,").unwrap();
    use base64::Engine;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .unwrap();
    let decoded = image::load_from_memory(&bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1024, 512));
}

#[tokio::test]
async fn test_pipeline_unknown_plant() {
    init_tracing();
    let analyzer = Analyzer::new(Arc::new(MockIdentifier::default()));

    let record = analyzer.analyze(&photo(16, 16), None).await.unwrap();

    assert_eq!(record.common_name.as_deref(), Some("Unknown Plant"));
    assert_eq!(record.scientific_name.as_deref(), Some(""));
    assert_eq!(record.confidence, Some(0.0));
    assert_eq!(record.health_status, Some(HealthStatus::Unknown));
    assert_eq!(record.health_issues, Some(Vec::new()));

    let plan = record.treatment_recommendations.unwrap();
    assert_eq!(plan.immediate.len(), 4);
    assert_eq!(plan.organic.steps.len(), 4);
    assert_eq!(plan.chemical.steps.len(), 3);
}

#[tokio::test]
async fn test_pipeline_with_configured_species() {
    let guide = CareGuide::with_templates([SpeciesTemplate {
        keywords: vec!["ficus".to_string()],
        immediate: vec!["Keep away from drafts".to_string()],
        organic: vec!["Wipe leaves with diluted soap".to_string()],
        chemical: vec![],
    }]);
    let analyzer = Analyzer::new(Arc::new(MockIdentifier::new(Identification {
        top_suggestion: Some(Suggestion::new("Ficus lyrata", 0.88)),
        is_healthy: true,
        issues: Vec::new(),
    })))
    .with_care_guide(guide)
    .with_normalizer(ImageNormalizer::new(256, 70));

    let record = analyzer.analyze(&photo(32, 32), None).await.unwrap();
    let plan = record.treatment_recommendations.unwrap();

    assert_eq!(record.health_status, Some(HealthStatus::Healthy));
    assert_eq!(plan.immediate, ["Keep away from drafts"]);
    assert_eq!(plan.organic.steps, ["Wipe leaves with diluted soap"]);
    assert!(plan.chemical.steps.is_empty());
}

#[tokio::test]
async fn test_pipeline_survives_weather_outage() {
    init_tracing();
    let weather = Arc::new(MockWeather::default());
    weather.set_should_fail(true, Some("service unavailable")).await;
    let analyzer = Analyzer::new(Arc::new(MockIdentifier::new(sick_monstera())))
        .with_weather(weather.clone());

    let record = analyzer
        .analyze(&photo(16, 16), Some(Coordinates::new(51.5, -0.12)))
        .await
        .unwrap();

    assert_eq!(weather.call_count(), 1);
    assert!(record.weather_data.is_none());
    assert_eq!(record.health_status, Some(HealthStatus::IssuesDetected));
}

#[tokio::test]
async fn test_pipeline_keeps_malformed_treatment_payload() {
    init_tracing();
    let issue: HealthIssue = serde_json::from_value(serde_json::json!({
        "id": "d9",
        "name": "Powdery mildew",
        "probability": 0.9856906946328695,
        "details": {"cause": "fungi", "treatment": {"biological": "spray neem"}}
    }))
    .unwrap();
    let analyzer = Analyzer::new(Arc::new(MockIdentifier::new(Identification {
        top_suggestion: Some(Suggestion::new("Rosa", 0.7)),
        is_healthy: false,
        issues: vec![issue.clone()],
    })));

    let record = analyzer.analyze(&photo(16, 16), None).await.unwrap();

    assert_eq!(record.health_issues, Some(vec![issue]));
    let plan = record.treatment_recommendations.unwrap();
    assert_eq!(plan.organic.steps.len(), 4);
}

#[test]
fn test_upload_validation() {
    assert!(validate_upload("image/png", 1024, 5 * 1024 * 1024).is_ok());
    assert!(validate_upload("image/gif", 1024, 5 * 1024 * 1024).is_err());
    assert!(validate_upload("image/jpeg", 6 * 1024 * 1024, 5 * 1024 * 1024).is_err());
}
