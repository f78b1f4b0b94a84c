//! OpenMRS REST wire/boundary support.
//!
//! This crate holds the JSON shapes exchanged with the OpenMRS REST web services
//! (`/ws/rest/v1`) and the helpers that parse them. It performs no I/O; the HTTP client lives in
//! `clinic-core`.
//!
//! Wire structs keep identifiers as plain strings, exactly as the server sends them. Validation
//! into typed identifiers happens at the edges that accept user input.
//!
//! Unknown keys are ignored: OpenMRS representations carry `links`, `resourceVersion` and
//! audit fields that the clinic never reads.

pub mod concept;
pub mod encounter;
pub mod location;
pub mod obs;
pub mod order;
pub mod patient;
pub mod session;
pub mod stock;

pub use concept::Concept;
pub use encounter::Encounter;
pub use location::Location;
pub use obs::{NewObs, Obs, ObsValue};
pub use order::{FulfillerDetails, FulfillerStatus, Order};
pub use patient::{Patient, PatientIdentifier, Person};
pub use session::{Session, SessionLocationUpdate, User};
pub use stock::{
    NewStockOperation, NewStockOperationItem, StockInventory, StockItem, StockOperation,
    StockOperationItem, StockOperationStatus, StockOperationType,
};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Errors returned by the `openmrs` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum OpenMrsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with an [`OpenMrsError`].
pub type OpenMrsResult<T> = Result<T, OpenMrsError>;

/// A reference to another OpenMRS object, as embedded in most representations.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ref {
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Ref {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            display: None,
        }
    }

    /// Display text, or an empty string when the server omitted it.
    pub fn display_or_empty(&self) -> &str {
        self.display.as_deref().unwrap_or("")
    }
}

/// The `{ "results": [...] }` envelope returned by list and search endpoints.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Results<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Parse an OpenMRS JSON payload into `T`.
///
/// This uses `serde_path_to_error` to surface the path (e.g. `results[2].concept.uuid`) of the
/// field that did not match the expected shape.
///
/// # Arguments
///
/// * `json_text` - Response body.
/// * `what` - Human-readable name of the payload, used in error messages.
///
/// # Errors
///
/// Returns [`OpenMrsError::Translation`] if the payload does not match `T`.
pub fn parse<T: DeserializeOwned>(json_text: &str, what: &str) -> OpenMrsResult<T> {
    let mut deserializer = serde_json::Deserializer::from_str(json_text);

    let parsed = match serde_path_to_error::deserialize::<_, T>(&mut deserializer) {
        Ok(parsed) => parsed,
        Err(err) => {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() || path == "." {
                "<root>"
            } else {
                path.as_str()
            };
            return Err(OpenMrsError::Translation(format!(
                "{what} schema mismatch at {path}: {source}"
            )));
        }
    };

    deserializer.end()?;
    Ok(parsed)
}

/// Extract the human-readable message from an OpenMRS error body
/// (`{ "error": { "message": "..." } }`), if the body has that shape.
pub fn error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        message: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.message)
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
}

/// Render a number the way the clinic displays lab values: integers without a trailing `.0`.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reports_failing_path() {
        let body = r#"{"results":[{"uuid":"a","concept":{"uuid":"c"}},{"uuid":"b","concept":{}}]}"#;
        let err = parse::<Results<Obs>>(body, "observations").expect_err("missing uuid");
        match err {
            OpenMrsError::Translation(msg) => {
                assert!(msg.starts_with("observations schema mismatch"));
                assert!(msg.contains("results[1].concept"), "{msg}");
            }
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn parse_rejects_trailing_garbage() {
        let err = parse::<Ref>(r#"{"uuid":"a"} extra"#, "ref").expect_err("trailing data");
        assert!(matches!(err, OpenMrsError::InvalidJson(_)));
    }

    #[test]
    fn results_envelope_defaults_to_empty() {
        let parsed: Results<Ref> = parse("{}", "refs").expect("empty envelope");
        assert!(parsed.results.is_empty());
    }

    #[test]
    fn error_message_reads_openmrs_error_body() {
        let body = r#"{"error":{"message":"[Object with given uuid doesn't exist]","code":"x"}}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("[Object with given uuid doesn't exist]")
        );
        assert_eq!(error_message("<html>oops</html>"), None);
    }

    #[test]
    fn format_number_drops_integral_fraction() {
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(12.5), "12.5");
        assert_eq!(format_number(-0.25), "-0.25");
    }
}
