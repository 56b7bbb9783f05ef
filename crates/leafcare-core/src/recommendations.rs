//! Treatment plan synthesis.
//!
//! A [`TreatmentPlan`] is derived in two passes:
//!
//! 1. **Species template**: the identified name is case-folded and matched
//!    against an ordered table of [`SpeciesTemplate`]s. The first template
//!    whose keyword appears in the name seeds the immediate, organic and
//!    chemical step lists. If nothing matches (or there is no name) the
//!    generic template seeds them instead. Templates are never combined.
//! 2. **Disease augmentation**: for every detected issue that carries
//!    treatment details, in order, its biological steps are appended to the
//!    organic track, its chemical steps to the chemical track, and its first
//!    two prevention tips to the immediate list.
//!
//! Track descriptions and timelines are fixed and never taken from a template.
//!
//! # Example
//!
//! ```
//! use leafcare_core::recommendations::synthesize;
//! use leafcare_types::{HealthIssue, Suggestion, Treatment};
//!
//! let top = Suggestion::new("Monstera deliciosa", 0.95);
//! let issues = vec![HealthIssue::new("leaf spot", 0.8).with_treatment(Treatment {
//!     biological: vec!["neem".to_string()],
//!     chemical: vec![],
//!     prevention: vec!["improve airflow".to_string()],
//! })];
//!
//! let plan = synthesize(Some(&top), &issues);
//! assert_eq!(plan.organic.steps.last().map(String::as_str), Some("neem"));
//! assert_eq!(plan.immediate.len(), 5);
//! ```

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use leafcare_types::{HealthIssue, Suggestion, TreatmentPlan, TreatmentTrack};

/// Description of the organic track.
pub const ORGANIC_DESCRIPTION: &str = "Natural, eco-friendly treatment options";
/// Expected time to results for the organic track.
pub const ORGANIC_TIMELINE: &str = "2-4 weeks for visible improvement";
/// Description of the chemical track.
pub const CHEMICAL_DESCRIPTION: &str = "Fast-acting treatment for severe cases";
/// Expected time to results for the chemical track.
pub const CHEMICAL_TIMELINE: &str = "1-2 weeks for visible improvement";

/// Maximum prevention tips taken from each issue into the immediate list.
pub const PREVENTION_TIPS_PER_ISSUE: usize = 2;

const MONSTERA_KEYWORDS: &[&str] = &["monstera"];

const MONSTERA_IMMEDIATE: &[&str] = &[
    "Water when top inch of soil is dry",
    "Provide bright, indirect light",
    "Maintain 60-70% humidity",
    "Clean leaves weekly for optimal photosynthesis",
];

const MONSTERA_ORGANIC: &[&str] = &[
    "Use neem oil spray for pest prevention",
    "Apply compost-based fertilizer monthly",
    "Mist leaves regularly for humidity",
];

const MONSTERA_CHEMICAL: &[&str] = &[
    "Balanced liquid fertilizer (20-20-20) bi-weekly",
    "Systemic insecticide if pests detected",
];

const GENERIC_IMMEDIATE: &[&str] = &[
    "Check soil moisture regularly",
    "Ensure proper drainage",
    "Monitor for pests and diseases",
    "Provide appropriate lighting for your plant species",
];

const GENERIC_ORGANIC: &[&str] = &[
    "Use organic compost for fertilization",
    "Apply neem oil for natural pest control",
    "Maintain proper humidity levels",
    "Prune dead or damaged parts",
];

const GENERIC_CHEMICAL: &[&str] = &[
    "Use balanced NPK fertilizer as needed",
    "Apply fungicide if disease symptoms appear",
    "Use appropriate pesticides for specific pest problems",
];

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Species-specific seed steps for a treatment plan.
///
/// Also the shape of a `[[care.species]]` entry in the service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesTemplate {
    /// Substrings matched (case-insensitively) against the identified name.
    pub keywords: Vec<String>,
    #[serde(default)]
    pub immediate: Vec<String>,
    #[serde(default)]
    pub organic: Vec<String>,
    #[serde(default)]
    pub chemical: Vec<String>,
}

impl SpeciesTemplate {
    /// Whether any keyword occurs in an already lowercased name.
    fn matches(&self, name_lower: &str) -> bool {
        self.keywords
            .iter()
            .filter(|k| !k.is_empty())
            .any(|k| name_lower.contains(&k.to_lowercase()))
    }
}

/// The generic template, used when no species template matches.
pub fn generic_template() -> SpeciesTemplate {
    SpeciesTemplate {
        keywords: Vec::new(),
        immediate: owned(GENERIC_IMMEDIATE),
        organic: owned(GENERIC_ORGANIC),
        chemical: owned(GENERIC_CHEMICAL),
    }
}

/// The built-in species templates, in match order.
pub fn builtin_templates() -> Vec<SpeciesTemplate> {
    vec![SpeciesTemplate {
        keywords: owned(MONSTERA_KEYWORDS),
        immediate: owned(MONSTERA_IMMEDIATE),
        organic: owned(MONSTERA_ORGANIC),
        chemical: owned(MONSTERA_CHEMICAL),
    }]
}

static BUILTIN: LazyLock<CareGuide> = LazyLock::new(CareGuide::default);

/// Ordered species table plus the generic fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CareGuide {
    templates: Vec<SpeciesTemplate>,
    generic: SpeciesTemplate,
}

impl Default for CareGuide {
    fn default() -> Self {
        Self {
            templates: builtin_templates(),
            generic: generic_template(),
        }
    }
}

impl CareGuide {
    /// A guide that checks `extra` templates before the built-in ones.
    pub fn with_templates(extra: impl IntoIterator<Item = SpeciesTemplate>) -> Self {
        let mut templates: Vec<SpeciesTemplate> = extra.into_iter().collect();
        templates.extend(builtin_templates());
        Self {
            templates,
            generic: generic_template(),
        }
    }

    /// Species templates in match order.
    pub fn templates(&self) -> &[SpeciesTemplate] {
        &self.templates
    }

    /// Select the single template that seeds a plan for `name`.
    ///
    /// First match wins; a missing or empty name selects the generic template.
    pub fn template_for(&self, name: Option<&str>) -> &SpeciesTemplate {
        let Some(name) = name.filter(|n| !n.is_empty()) else {
            return &self.generic;
        };
        let name_lower = name.to_lowercase();
        self.templates
            .iter()
            .find(|t| t.matches(&name_lower))
            .unwrap_or(&self.generic)
    }

    /// Build a treatment plan from the top suggestion and detected issues.
    pub fn synthesize(&self, top: Option<&Suggestion>, issues: &[HealthIssue]) -> TreatmentPlan {
        let template = self.template_for(top.map(|s| s.name.as_str()));

        let mut plan = TreatmentPlan {
            immediate: template.immediate.clone(),
            organic: TreatmentTrack {
                description: ORGANIC_DESCRIPTION.to_string(),
                steps: template.organic.clone(),
                timeline: ORGANIC_TIMELINE.to_string(),
            },
            chemical: TreatmentTrack {
                description: CHEMICAL_DESCRIPTION.to_string(),
                steps: template.chemical.clone(),
                timeline: CHEMICAL_TIMELINE.to_string(),
            },
        };

        for treatment in issues.iter().filter_map(HealthIssue::treatment) {
            plan.organic.steps.extend(treatment.biological);
            plan.chemical.steps.extend(treatment.chemical);
            plan.immediate.extend(
                treatment
                    .prevention
                    .into_iter()
                    .take(PREVENTION_TIPS_PER_ISSUE),
            );
        }

        plan
    }
}

/// Build a treatment plan using the built-in species table.
pub fn synthesize(top: Option<&Suggestion>, issues: &[HealthIssue]) -> TreatmentPlan {
    BUILTIN.synthesize(top, issues)
}
