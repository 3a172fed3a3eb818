//! End-to-end validation pipeline.
//!
//! detect → normalize → extract → consistency → validate. Each run is
//! self-contained: blocking I/O on its own temp files, no shared
//! mutable state, no internal retries.

use tracing::info;

use shared_types::{ExtractedProperties, Services, Specification, ValidationResult};

use crate::convert::{self, Converter, LibreOfficeConverter};
use crate::detect::detect_format;
use crate::error::EngineError;
use crate::{consistency, extract, validator};

pub struct PreflightEngine {
    converter: Box<dyn Converter>,
}

impl PreflightEngine {
    pub fn new() -> Self {
        Self::with_converter(Box::new(LibreOfficeConverter::new()))
    }

    /// Inject a converter so tests can substitute a deterministic fake.
    pub fn with_converter(converter: Box<dyn Converter>) -> Self {
        Self { converter }
    }

    /// Validate a document against a specification.
    pub fn validate(
        &self,
        bytes: &[u8],
        file_name: &str,
        spec: &Specification,
    ) -> Result<ValidationResult, EngineError> {
        self.validate_with_services(bytes, file_name, spec, &Services::default())
    }

    /// Validate, honoring purchased services (layout service waives the
    /// geometry checks).
    pub fn validate_with_services(
        &self,
        bytes: &[u8],
        file_name: &str,
        spec: &Specification,
        services: &Services,
    ) -> Result<ValidationResult, EngineError> {
        let format = detect_format(file_name, bytes)?;
        info!(
            file = file_name,
            format = format.as_str(),
            spec = %spec.name,
            "validating document"
        );

        let pdf = convert::normalize_to_pdf(self.converter.as_ref(), bytes, format)?;
        let (mut props, geometries) = extract::extract_properties(&pdf)?;
        consistency::annotate(&mut props, &geometries);

        let outcome = validator::validate_document(&props, spec, services);
        info!(is_valid = outcome.is_valid, "validation finished");

        Ok(ValidationResult::new(
            file_name,
            format.as_str(),
            spec.name.as_str(),
            outcome.validations,
            outcome.is_valid,
            props,
        ))
    }

    /// Extraction without judgment, for inspection endpoints.
    pub fn analyze(
        &self,
        bytes: &[u8],
        file_name: &str,
    ) -> Result<ExtractedProperties, EngineError> {
        let format = detect_format(file_name, bytes)?;
        let pdf = convert::normalize_to_pdf(self.converter.as_ref(), bytes, format)?;
        let (mut props, geometries) = extract::extract_properties(&pdf)?;
        consistency::annotate(&mut props, &geometries);
        Ok(props)
    }
}

impl Default for PreflightEngine {
    fn default() -> Self {
        Self::new()
    }
}
