//! Action results.
//!
//! Every user-facing operation answers with the same envelope: `{ success, data, message }`,
//! plus a `redirect` when the EMR no longer accepts the caller's credentials. Failures are
//! logged where they are converted, so front ends only forward the envelope.

use crate::constants::LOGIN_PATH;
use crate::error::{ClinicResult, ErrorKind};
use serde::Serialize;

const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActionResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    /// Classification of the failure, for front ends that map it to a status code.
    #[serde(skip)]
    pub error_kind: Option<ErrorKind>,
}

impl<T> ActionResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            redirect: None,
            error_kind: None,
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok(data)
        }
    }

    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        let redirect = (kind == ErrorKind::Unauthorized).then(|| LOGIN_PATH.to_string());
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            redirect,
            error_kind: Some(kind),
        }
    }

    /// Convert a service result, logging the failure under `context`.
    pub fn from_result(context: &str, result: ClinicResult<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => {
                tracing::error!("{} failed: {}", context, err);
                let kind = err.kind();
                let message = match kind {
                    ErrorKind::Unauthorized => SESSION_EXPIRED.to_string(),
                    _ => format!("{context} failed: {err}"),
                };
                Self::failure(kind, message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClinicError;
    use serde_json::json;

    #[test]
    fn success_serialises_without_failure_fields() {
        let body = serde_json::to_value(ActionResult::ok(vec![1, 2])).expect("serialize");
        assert_eq!(body, json!({"success": true, "data": [1, 2]}));

        let body = serde_json::to_value(ActionResult::ok_with_message((), "Saved"))
            .expect("serialize");
        assert_eq!(body, json!({"success": true, "data": null, "message": "Saved"}));
    }

    #[test]
    fn failures_carry_message_and_kind() {
        let result: ActionResult<()> = ActionResult::from_result(
            "Fetching order",
            Err(ClinicError::NotFound("order abc".into())),
        );
        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::NotFound));
        assert_eq!(
            result.message.as_deref(),
            Some("Fetching order failed: not found: order abc")
        );
        assert!(result.redirect.is_none());
    }

    #[test]
    fn auth_failures_redirect_to_login() {
        let result: ActionResult<()> =
            ActionResult::from_result("Loading stock", Err(ClinicError::Unauthorized));
        assert_eq!(result.redirect.as_deref(), Some(LOGIN_PATH));
        assert_eq!(result.message.as_deref(), Some(SESSION_EXPIRED));

        let body = serde_json::to_value(&result).expect("serialize");
        assert!(body.get("error_kind").is_none());
    }
}
