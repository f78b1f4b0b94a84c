//! FHIR R4 wire/boundary support for the OpenMRS FHIR2 module (`/ws/fhir2/R4`).
//!
//! This crate provides **wire models** and **parsing helpers** for the FHIR resources the
//! pharmacy and patient dashboards read and write:
//! - `MedicationRequest` (prescriptions awaiting dispensing)
//! - `MedicationDispense` (what the pharmacy handed over)
//! - `Condition` (active problems shown next to a prescription)
//! - `Encounter` (visit history)
//!
//! Only the elements the clinic uses are modelled; everything else in a resource is ignored on
//! read. Parsing checks `resourceType` so a server answering with an `OperationOutcome` is
//! reported as such rather than as a confusing missing-field error.

pub mod bundle;
pub mod common;
pub mod condition;
pub mod encounter;
pub mod medication_dispense;
pub mod medication_request;

pub use bundle::{Bundle, BundleEntry};
pub use common::{CodeableConcept, Coding, Dosage, Period, Quantity, Reference};
pub use condition::Condition;
pub use encounter::Encounter;
pub use medication_dispense::{DispensePerformer, MedicationDispense};
pub use medication_request::{DispenseRequest, MedicationRequest};

use serde::de::DeserializeOwned;

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("expected resourceType {expected}, got {found}")]
    UnexpectedResourceType { expected: String, found: String },
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;

/// A FHIR resource type the crate knows how to parse.
pub trait Resource: DeserializeOwned {
    const RESOURCE_TYPE: &'static str;
}

/// Parse a single FHIR resource from JSON text.
///
/// # Errors
///
/// Returns [`FhirError`] if:
/// - the text is not JSON,
/// - `resourceType` is missing or not `R::RESOURCE_TYPE`,
/// - a modelled element has an unexpected type (the error names the JSON path).
pub fn parse_resource<R: Resource>(json_text: &str) -> FhirResult<R> {
    let value: serde_json::Value = serde_json::from_str(json_text)?;
    check_resource_type(&value, R::RESOURCE_TYPE)?;
    from_value_with_path(value, R::RESOURCE_TYPE)
}

/// Parse a search-set `Bundle` whose entries are all of resource type `R`.
///
/// Entries of a different resource type (for example an `OperationOutcome` carrying search
/// warnings) are skipped.
pub fn parse_bundle<R: Resource>(json_text: &str) -> FhirResult<Bundle<R>> {
    let mut value: serde_json::Value = serde_json::from_str(json_text)?;
    check_resource_type(&value, "Bundle")?;

    if let Some(entries) = value.get_mut("entry").and_then(|e| e.as_array_mut()) {
        entries.retain(|entry| {
            entry
                .get("resource")
                .and_then(|r| r.get("resourceType"))
                .and_then(|t| t.as_str())
                == Some(R::RESOURCE_TYPE)
        });
    }

    from_value_with_path(value, "Bundle")
}

fn check_resource_type(value: &serde_json::Value, expected: &str) -> FhirResult<()> {
    let found = value
        .get("resourceType")
        .and_then(|t| t.as_str())
        .unwrap_or("<missing>");
    if found != expected {
        return Err(FhirError::UnexpectedResourceType {
            expected: expected.to_string(),
            found: found.to_string(),
        });
    }
    Ok(())
}

fn from_value_with_path<T: DeserializeOwned>(value: serde_json::Value, what: &str) -> FhirResult<T> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(|err| {
        let path = err.path().to_string();
        let source = err.into_inner();
        let path = if path.is_empty() || path == "." {
            "<root>"
        } else {
            path.as_str()
        };
        FhirError::Translation(format!("{what} schema mismatch at {path}: {source}"))
    })
}
