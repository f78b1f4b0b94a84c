//! Turning action results into HTTP responses.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use clinic_core::export::export_filename;
use clinic_core::{ActionResult, ClinicResult, ErrorKind};
use serde::Serialize;

/// HTTP status for a failed action. Successful actions answer 200.
pub fn status_for(kind: Option<ErrorKind>) -> StatusCode {
    match kind {
        None => StatusCode::OK,
        Some(ErrorKind::InvalidInput) => StatusCode::BAD_REQUEST,
        Some(ErrorKind::Unauthorized) => StatusCode::UNAUTHORIZED,
        Some(ErrorKind::NotFound) => StatusCode::NOT_FOUND,
        Some(ErrorKind::Upstream) => StatusCode::BAD_GATEWAY,
        Some(ErrorKind::Internal) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn respond<T: Serialize>(result: ActionResult<T>) -> Response {
    (status_for(result.error_kind), Json(result)).into_response()
}

/// Convert a service result under `context` and answer with it.
pub fn action<T: Serialize>(context: &str, result: ClinicResult<T>) -> Response {
    respond(ActionResult::from_result(context, result))
}

/// Answer with a CSV attachment named `<prefix>-<today>.csv`, or with the failure envelope.
pub fn csv_attachment(context: &str, prefix: &str, result: ClinicResult<String>) -> Response {
    match result {
        Ok(body) => {
            let filename = export_filename(prefix, chrono::Utc::now().date_naive());
            (
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{filename}\""),
                    ),
                ],
                body,
            )
                .into_response()
        }
        Err(err) => action::<()>(context, Err(err)),
    }
}
