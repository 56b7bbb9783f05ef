//! Shared data model for Leafcare plant analyses.
//!
//! This crate provides the types exchanged between the analysis pipeline
//! (leafcare-core), the record store (leafcare-store) and the HTTP service.
//!
//! # Features
//!
//! - [`PlantAnalysis`] / [`InsertPlantAnalysis`] records, serialized in camelCase
//! - [`TreatmentPlan`] with immediate, organic and chemical tracks
//! - [`Identification`] as returned by a plant identification client
//! - Error types for parsing
//!
//! # Example
//!
//! ```
//! use leafcare_types::{HealthIssue, HealthStatus, Treatment};
//!
//! let issue = HealthIssue::new("leaf spot", 0.8).with_treatment(Treatment {
//!     biological: vec!["neem".to_string()],
//!     ..Default::default()
//! });
//! assert_eq!(issue.treatment().unwrap().biological, ["neem"]);
//! assert_eq!(HealthStatus::IssuesDetected.to_string(), "Issues Detected");
//! ```

pub mod error;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{
    HealthIssue, HealthStatus, Identification, InsertPlantAnalysis, IssueDetails, PlantAnalysis,
    Suggestion, Treatment, TreatmentPlan, TreatmentTrack,
};
