//! Validation verdicts handed to storage and reporting.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::props::ExtractedProperties;

/// Outcome of one validation run.
///
/// `is_valid` is derived from `validations`, which in turn is a pure
/// function of the extracted properties and the specification; it is
/// never an independently stored fact.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ValidationResult {
    pub id: String,
    pub document_name: String,
    pub file_format: String,
    pub spec_name: String,
    pub validations: BTreeMap<String, bool>,
    pub is_valid: bool,
    pub raw_props: ExtractedProperties,
    pub created_at: DateTime<Utc>,
}

impl ValidationResult {
    pub fn new(
        document_name: impl Into<String>,
        file_format: impl Into<String>,
        spec_name: impl Into<String>,
        validations: BTreeMap<String, bool>,
        is_valid: bool,
        raw_props: ExtractedProperties,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            document_name: document_name.into(),
            file_format: file_format.into(),
            spec_name: spec_name.into(),
            validations,
            is_valid,
            raw_props,
            created_at: Utc::now(),
        }
    }
}

/// Rendering options for the external report generator.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct ReportOptions {
    pub include_charts: bool,
    pub include_detailed_analysis: bool,
    pub include_recommendations: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            include_charts: true,
            include_detailed_analysis: true,
            include_recommendations: true,
        }
    }
}
