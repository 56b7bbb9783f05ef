//! Error types for leafcare-core.
//!
//! # Fatal vs degraded
//!
//! | Error | Effect on an analysis |
//! |-------|-----------------------|
//! | [`Error::UnsupportedMediaType`], [`Error::ImageTooLarge`], [`Error::Image`] | Fatal, rejected before any outbound call |
//! | [`Error::MissingCredentials`] | Fatal for identification, skipped for weather |
//! | [`Error::Api`], [`Error::Request`] | Fatal from the identifier, logged and dropped from the weather provider |
//! | [`Error::InvalidUrl`] | Configuration problem, raised when building a client |

use thiserror::Error;

/// Errors that can occur while analysing a plant image.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Upload is not a JPEG, PNG or WEBP image.
    #[error("Unsupported image type: {0}")]
    UnsupportedMediaType(String),

    /// Upload exceeds the configured size limit.
    #[error("Image too large: {size} bytes (maximum {max} bytes)")]
    ImageTooLarge { size: usize, max: usize },

    /// The bytes could not be decoded or re-encoded as an image.
    #[error("Invalid image: {0}")]
    Image(#[from] image::ImageError),

    /// No API key is configured for the named service.
    #[error("{0} API key not configured")]
    MissingCredentials(&'static str),

    /// The external service answered with a non-success status.
    #[error("{service} API error: {status} - {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// Transport or decoding failure talking to an external service.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Invalid base URL for an external service.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Result type for leafcare-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_includes_status_and_body() {
        let err = Error::Api {
            service: "Plant.id",
            status: 401,
            body: "invalid api key".to_string(),
        };
        assert_eq!(err.to_string(), "Plant.id API error: 401 - invalid api key");
    }

    #[test]
    fn test_missing_credentials_display() {
        let err = Error::MissingCredentials("Plant.id");
        assert_eq!(err.to_string(), "Plant.id API key not configured");
    }

    #[test]
    fn test_image_too_large_display() {
        let err = Error::ImageTooLarge { size: 10, max: 5 };
        assert!(err.to_string().contains("maximum 5 bytes"));
    }
}
