//! Request and response bodies of the REST API.
//!
//! Identifiers and dates are plain strings here; handlers validate them into core types.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Envelope every JSON endpoint answers with.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ActionRes {
    pub success: bool,
    #[schema(value_type = Object)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Set to the login path when the EMR rejected the credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginReq {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SetLocationReq {
    pub location_uuid: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PatientSearchParams {
    /// Name or identifier, at least two characters.
    pub q: String,
    pub limit: Option<usize>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LabOrdersParams {
    pub patient: Option<String>,
    /// `pending` or a fulfiller status such as `IN_PROGRESS`.
    pub status: Option<String>,
    /// `YYYY-MM-DD`
    pub activated_on_or_after: Option<String>,
    #[serde(default)]
    pub include_stopped: bool,
    /// Free-text filter over patient, test and order number.
    pub q: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatusReq {
    /// Fulfiller status, e.g. `IN_PROGRESS`.
    pub status: String,
    pub comment: Option<String>,
}

/// One entered result. Exactly one of `numeric`, `text` or `coded` must be set.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ResultEntryReq {
    pub concept_uuid: String,
    pub numeric: Option<f64>,
    pub text: Option<String>,
    /// Answer concept uuid.
    pub coded: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitResultsReq {
    pub results: Vec<ResultEntryReq>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DispenseReq {
    pub prescription_uuid: String,
    pub quantity: f64,
    pub unit: Option<String>,
    pub location_uuid: Option<String>,
    pub performer_uuid: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StockItemsParams {
    pub q: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StockOperationsParams {
    /// Operation status such as `NEW` or `COMPLETED`.
    pub status: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StockOperationItemReq {
    pub stock_item_uuid: String,
    pub stock_batch_uuid: Option<String>,
    pub batch_no: Option<String>,
    pub quantity: f64,
    pub packaging_uom_uuid: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct NewStockOperationReq {
    pub operation_type_uuid: String,
    pub at_location_uuid: Option<String>,
    pub source_uuid: Option<String>,
    pub destination_uuid: Option<String>,
    /// Defaults to now.
    pub operation_date: Option<String>,
    pub remarks: Option<String>,
    pub items: Vec<StockOperationItemReq>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PhysicalCountReq {
    pub stock_item_uuid: String,
    pub batch_no: Option<String>,
    pub quantity: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ReconciliationReq {
    /// Defaults to the configured clinic location.
    pub location_uuid: Option<String>,
    pub counts: Vec<PhysicalCountReq>,
    /// Only used when submitting.
    pub remarks: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn optional_fields_may_be_omitted() {
        let req: ReconciliationReq = serde_json::from_value(json!({
            "counts": [{"stock_item_uuid": "para", "quantity": 4}]
        }))
        .expect("request");
        assert!(req.location_uuid.is_none());
        assert_eq!(req.counts[0].quantity, 4.0);
    }

    #[test]
    fn action_envelope_skips_empty_fields() {
        let body = serde_json::to_value(ActionRes {
            success: false,
            data: None,
            message: Some("nope".into()),
            redirect: None,
        })
        .expect("serialize");
        assert_eq!(body, json!({"success": false, "message": "nope"}));
    }
}
