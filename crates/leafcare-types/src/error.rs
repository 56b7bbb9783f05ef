//! Error types for parsing in leafcare-types.

use thiserror::Error;

/// Errors that can occur when parsing Leafcare values from strings.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The string is not one of the known health status labels.
    #[error("Unknown health status: {0:?}")]
    UnknownHealthStatus(String),
}

/// Result type alias using leafcare-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
