//! REST API endpoints for the leafcare-service.
//!
//! # Routes
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | `GET` | `/api/health` | Service health check |
//! | `GET` | `/api/plant-analyses` | List analyses, newest first (`?search=` filters by name) |
//! | `DELETE` | `/api/plant-analyses` | Delete every analysis |
//! | `GET` | `/api/plant-analyses/{id}` | One analysis |
//! | `DELETE` | `/api/plant-analyses/{id}` | Delete one analysis |
//! | `POST` | `/api/analyze-plant` | Analyze an uploaded image and store the result |
//! | `GET` | `/api/weather` | Current weather plus care advice |
//!
//! ## Error Handling
//!
//! All endpoints return structured JSON errors via [`AppError`]. Unknown ids
//! return 404, bad uploads and queries 400, oversized uploads 413, and
//! identification, weather or store failures 500.
//!
//! # Example
//!
//! ```ignore
//! use axum::Router;
//! use leafcare_service::api;
//!
//! let app = api::router().with_state(state);
//! ```

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State, multipart::Field},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{error, info, warn};

use leafcare_core::{Coordinates, CurrentConditions, care_advice, validate_upload};
use leafcare_types::PlantAnalysis;

use crate::state::AppState;

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

/// Size cap for the non-file multipart fields.
const MAX_TEXT_FIELD_BYTES: usize = 256;

/// Create the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(health))
        .route(
            "/api/plant-analyses",
            get(list_analyses).delete(clear_analyses),
        )
        .route(
            "/api/plant-analyses/{id}",
            get(get_analysis).delete(delete_analysis),
        )
        // Upload size is enforced while reading the image field
        .route(
            "/api/analyze-plant",
            post(analyze_plant).layer(DefaultBodyLimit::disable()),
        )
        .route("/api/weather", get(get_weather))
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub uptime_secs: i64,
    /// Whether a Plant.id key is configured.
    pub analysis_enabled: bool,
    /// Whether an OpenWeatherMap key is configured.
    pub weather_enabled: bool,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let now = OffsetDateTime::now_utc();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: now,
        uptime_secs: (now - state.started_at).whole_seconds(),
        analysis_enabled: state.analyzer.is_some(),
        weather_enabled: state.weather.is_some(),
    })
}

/// Query parameters for listing analyses.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Case-insensitive substring of the common or scientific name.
    pub search: Option<String>,
}

async fn list_analyses(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PlantAnalysis>>, AppError> {
    let analyses = match query.search.as_deref() {
        Some(term) => state.store.search(term)?,
        None => state.store.list_all()?,
    };
    Ok(Json(analyses))
}

async fn get_analysis(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PlantAnalysis>, AppError> {
    state
        .store
        .get_by_id(&id)?
        .map(Json)
        .ok_or_else(not_found)
}

/// Confirmation body for deletions.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: &'static str,
    /// Number of analyses removed.
    pub deleted: usize,
}

async fn delete_analysis(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    if !state.store.delete_by_id(&id)? {
        return Err(not_found());
    }
    info!("Deleted analysis {}", id);
    Ok(Json(DeleteResponse {
        message: "Plant analysis deleted successfully",
        deleted: 1,
    }))
}

async fn clear_analyses(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DeleteResponse>, AppError> {
    let deleted = state.store.clear()?;
    info!("Cleared {} analyses", deleted);
    Ok(Json(DeleteResponse {
        message: "All plant analyses cleared",
        deleted,
    }))
}

/// The parsed `analyze-plant` form.
#[derive(Debug, Default)]
struct AnalyzeForm {
    image: Option<Vec<u8>>,
    latitude: Option<String>,
    longitude: Option<String>,
}

/// Analyze an uploaded plant image.
///
/// Expects `multipart/form-data` with an `image` file (JPEG, PNG or WEBP)
/// and optional `latitude` / `longitude` text fields. Weather is only looked
/// up when both coordinates are present.
///
/// # Errors
///
/// - [`AppError::BadRequest`] if the image is missing, of an unsupported
///   type, or undecodable (coordinates that are not numbers only skip weather)
/// - [`AppError::PayloadTooLarge`] if the image exceeds `server.max_upload_bytes`
/// - [`AppError::Analysis`] if no Plant.id key is configured or identification fails
async fn analyze_plant(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<PlantAnalysis>, AppError> {
    let max_bytes = state.config.server.max_upload_bytes;
    let mut form = AnalyzeForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(IMAGE_FIELD) => {
                let mime_type = field.content_type().unwrap_or_default().to_string();
                validate_upload(&mime_type, 0, max_bytes)?;
                form.image = Some(read_field(field, max_bytes).await?);
            }
            Some("latitude") => form.latitude = Some(read_text(field).await?),
            Some("longitude") => form.longitude = Some(read_text(field).await?),
            _ => {}
        }
    }

    let image = form
        .image
        .ok_or_else(|| AppError::BadRequest("No image file provided".to_string()))?;
    // Unusable coordinates only cost the weather lookup
    let location = coordinates(form.latitude.as_deref(), form.longitude.as_deref())
        .unwrap_or_else(|e| {
            warn!("Ignoring location for analysis: {:?}", e);
            None
        });

    let analyzer = state
        .analyzer
        .as_ref()
        .ok_or(AppError::Analysis(leafcare_core::Error::MissingCredentials(
            "Plant.id",
        )))?;

    let record = analyzer.analyze(&image, location).await?;
    let saved = state.store.create(record)?;
    info!(
        "Saved analysis {} ({})",
        saved.id,
        saved.common_name.as_deref().unwrap_or_default()
    );

    Ok(Json(saved))
}

/// Read a field, failing once more than `max_bytes` have arrived.
async fn read_field(mut field: Field<'_>, max_bytes: usize) -> Result<Vec<u8>, AppError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if data.len() + chunk.len() > max_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "Image exceeds the {} byte upload limit",
                max_bytes
            )));
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    let bytes = read_field(field, MAX_TEXT_FIELD_BYTES)
        .await
        .map_err(|_| AppError::BadRequest("Form field too long".to_string()))?;
    String::from_utf8(bytes).map_err(|_| AppError::BadRequest("Form field is not UTF-8".to_string()))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(e.body_text())
}

/// Parse optional coordinates; both must be present to be used.
fn coordinates(
    latitude: Option<&str>,
    longitude: Option<&str>,
) -> Result<Option<Coordinates>, AppError> {
    match (
        latitude.filter(|s| !s.trim().is_empty()),
        longitude.filter(|s| !s.trim().is_empty()),
    ) {
        (Some(lat), Some(lon)) => {
            let parse = |s: &str| {
                s.trim().parse::<f64>().map_err(|_| {
                    AppError::BadRequest(format!("Invalid coordinate '{}'", s))
                })
            };
            Ok(Some(Coordinates::new(parse(lat)?, parse(lon)?)))
        }
        _ => Ok(None),
    }
}

/// Query parameters for the weather endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct WeatherQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
}

/// Weather endpoint response.
#[derive(Debug, Serialize)]
pub struct WeatherResponse {
    /// The provider's response body, verbatim.
    pub weather: serde_json::Value,
    /// Care advice for the current conditions.
    pub advice: &'static str,
}

async fn get_weather(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<WeatherResponse>, AppError> {
    let location = coordinates(query.lat.as_deref(), query.lon.as_deref())?.ok_or_else(|| {
        AppError::BadRequest("Latitude and longitude are required".to_string())
    })?;

    let provider = state
        .weather
        .as_ref()
        .ok_or(AppError::Analysis(leafcare_core::Error::MissingCredentials(
            "OpenWeather",
        )))?;

    let weather = provider
        .current_weather(location.latitude, location.longitude)
        .await?;
    let advice = care_advice(&CurrentConditions::from_response(&weather));

    Ok(Json(WeatherResponse { weather, advice }))
}

fn not_found() -> AppError {
    AppError::NotFound("Plant analysis not found".to_string())
}

/// API error type.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    PayloadTooLarge(String),
    /// Identification, weather or credential failure.
    Analysis(leafcare_core::Error),
    Store(leafcare_store::Error),
}

impl From<leafcare_store::Error> for AppError {
    fn from(e: leafcare_store::Error) -> Self {
        AppError::Store(e)
    }
}

impl From<leafcare_core::Error> for AppError {
    fn from(e: leafcare_core::Error) -> Self {
        use leafcare_core::Error;

        match e {
            Error::UnsupportedMediaType(_) | Error::Image(_) => AppError::BadRequest(e.to_string()),
            Error::ImageTooLarge { .. } => AppError::PayloadTooLarge(e.to_string()),
            other => AppError::Analysis(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Analysis(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            AppError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        if status.is_server_error() {
            error!("Request failed: {}", message);
        }

        let body = serde_json::json!({
            "error": message,
        });

        (status, Json(body)).into_response()
    }
}
