//! Route handlers.
//!
//! Each handler validates its inputs into core types, calls one service and answers with an
//! `ActionResult` envelope (or a CSV attachment). Failures are logged where they are converted.

use axum::{
    extract::{Path, Query, State},
    response::{Json, Response},
};
use chrono::{NaiveDate, Utc};
use std::str::FromStr;

use api_shared::dto::{
    ActionRes, DispenseReq, LabOrdersParams, LoginReq, NewStockOperationReq, PatientSearchParams,
    ReconciliationReq, ResultEntryReq, SetLocationReq, StockItemsParams, StockOperationsParams,
    SubmitResultsReq, UpdateStatusReq,
};
use api_shared::{HealthRes, HealthService};
use clinic_core::constants::{DEFAULT_PAGE_SIZE, OPENMRS_DATETIME_FORMAT};
use clinic_core::export::{
    to_csv, LAB_ORDER_HEADERS, LAB_RESULT_HEADERS, STOCK_ITEM_HEADERS,
};
use clinic_core::lab::{LabOrderQuery, LabOrderRow, OrderStatusFilter, ResultEntry, ResultValue};
use clinic_core::pharmacy::NewDispense;
use clinic_core::stock::PhysicalCount;
use clinic_core::{
    filter_text, paginate, ActionResult, ClinicError, ClinicResult, EmrUuid, NonEmptyText,
};
use openmrs::{FulfillerStatus, NewStockOperation, NewStockOperationItem, StockOperationStatus};

use crate::respond::{action, csv_attachment, respond};
use crate::AppState;

fn parse_id(value: &str) -> ClinicResult<EmrUuid> {
    Ok(EmrUuid::parse(value.trim())?)
}

/// Blank optional ids count as absent.
fn optional_id(value: Option<&str>) -> ClinicResult<Option<EmrUuid>> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(parse_id)
        .transpose()
}

fn location_or_default(state: &AppState, requested: Option<&str>) -> ClinicResult<EmrUuid> {
    optional_id(requested)?
        .or_else(|| state.location.clone())
        .ok_or_else(|| {
            ClinicError::InvalidInput(
                "no location given and no clinic location is configured".into(),
            )
        })
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint, used by monitoring and load balancers. Never requires an API key.
#[axum::debug_handler]
pub async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

// ---------------------------------------------------------------------------------------------
// Session

#[utoipa::path(
    get,
    path = "/session",
    tag = "session",
    responses(
        (status = 200, description = "Current EMR session", body = ActionRes),
        (status = 502, description = "EMR unavailable", body = ActionRes)
    )
)]
#[axum::debug_handler]
pub async fn get_session(State(state): State<AppState>) -> Response {
    action("Fetching session", state.services.session.current().await)
}

#[utoipa::path(
    post,
    path = "/session/login",
    tag = "session",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Authenticated session", body = ActionRes),
        (status = 401, description = "Credentials rejected", body = ActionRes)
    )
)]
/// Log in as another user; later requests run in the session the EMR opens for them.
#[axum::debug_handler]
pub async fn login(State(state): State<AppState>, Json(req): Json<LoginReq>) -> Response {
    let result = async {
        let username = NonEmptyText::new(&req.username)?;
        state.services.session.login(&username, &req.password).await
    }
    .await;
    action("Logging in", result)
}

#[utoipa::path(
    delete,
    path = "/session",
    tag = "session",
    responses(
        (status = 200, description = "Session closed", body = ActionRes)
    )
)]
#[axum::debug_handler]
pub async fn logout(State(state): State<AppState>) -> Response {
    match state.services.session.logout().await {
        Ok(()) => respond(ActionResult::ok_with_message((), "Logged out")),
        Err(err) => action::<()>("Logging out", Err(err)),
    }
}

#[utoipa::path(
    post,
    path = "/session/location",
    tag = "session",
    request_body = SetLocationReq,
    responses(
        (status = 200, description = "Session with the new location", body = ActionRes),
        (status = 400, description = "Malformed location uuid", body = ActionRes)
    )
)]
#[axum::debug_handler]
pub async fn set_location(
    State(state): State<AppState>,
    Json(req): Json<SetLocationReq>,
) -> Response {
    let result = async {
        let location = parse_id(&req.location_uuid)?;
        state.services.session.set_location(&location).await
    }
    .await;
    action("Setting session location", result)
}

#[utoipa::path(
    get,
    path = "/session/profile",
    tag = "session",
    responses(
        (status = 200, description = "Logged-in user", body = ActionRes),
        (status = 401, description = "No authenticated user", body = ActionRes)
    )
)]
#[axum::debug_handler]
pub async fn profile(State(state): State<AppState>) -> Response {
    action("Loading profile", state.services.session.profile().await)
}

#[utoipa::path(
    get,
    path = "/locations/login",
    tag = "session",
    responses(
        (status = 200, description = "Locations a user may log in at", body = ActionRes)
    )
)]
#[axum::debug_handler]
pub async fn login_locations(State(state): State<AppState>) -> Response {
    action(
        "Loading login locations",
        state.services.session.login_locations().await,
    )
}

// ---------------------------------------------------------------------------------------------
// Patients

#[utoipa::path(
    get,
    path = "/patients",
    tag = "patients",
    params(PatientSearchParams),
    responses(
        (status = 200, description = "Matching patients", body = ActionRes),
        (status = 400, description = "Query too short", body = ActionRes)
    )
)]
#[axum::debug_handler]
pub async fn search_patients(
    State(state): State<AppState>,
    Query(params): Query<PatientSearchParams>,
) -> Response {
    action(
        "Searching patients",
        state.services.patients.search(&params.q, params.limit).await,
    )
}

// ---------------------------------------------------------------------------------------------
// Lab

fn order_query(params: &LabOrdersParams) -> ClinicResult<LabOrderQuery> {
    let status = params
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(OrderStatusFilter::from_str)
        .transpose()?;
    let activated_on_or_after = params
        .activated_on_or_after
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| {
            NaiveDate::parse_from_str(d, "%Y-%m-%d").map_err(|e| {
                ClinicError::InvalidInput(format!("activated_on_or_after {d:?} is not YYYY-MM-DD: {e}"))
            })
        })
        .transpose()?;
    Ok(LabOrderQuery {
        patient: optional_id(params.patient.as_deref())?,
        status,
        activated_on_or_after,
        include_stopped: params.include_stopped,
    })
}

/// The worklist narrowed by the free-text filter.
async fn worklist(state: &AppState, params: &LabOrdersParams) -> ClinicResult<Vec<LabOrderRow>> {
    let rows = state.services.lab.list_orders(&order_query(params)?).await?;
    Ok(filter_text(
        rows,
        params.q.as_deref().unwrap_or_default(),
        |row| format!("{} {} {}", row.order_number, row.patient_name, row.test_name),
    ))
}

#[utoipa::path(
    get,
    path = "/lab/orders",
    tag = "lab",
    params(LabOrdersParams),
    responses(
        (status = 200, description = "One page of the lab worklist", body = ActionRes),
        (status = 400, description = "Invalid filter", body = ActionRes)
    )
)]
/// Lab worklist, filtered and paginated.
#[axum::debug_handler]
pub async fn list_lab_orders(
    State(state): State<AppState>,
    Query(params): Query<LabOrdersParams>,
) -> Response {
    let result = async {
        let rows = worklist(&state, &params).await?;
        paginate(
            rows,
            params.page.unwrap_or(1),
            params.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
    .await;
    action("Loading lab orders", result)
}

#[utoipa::path(
    get,
    path = "/lab/orders/export",
    tag = "lab",
    params(LabOrdersParams),
    responses(
        (status = 200, description = "Filtered worklist as CSV", content_type = "text/csv", body = String)
    )
)]
/// The filtered worklist as CSV. Paging parameters are ignored.
#[axum::debug_handler]
pub async fn export_lab_orders(
    State(state): State<AppState>,
    Query(params): Query<LabOrdersParams>,
) -> Response {
    let result = async {
        let rows = worklist(&state, &params).await?;
        to_csv(&LAB_ORDER_HEADERS, &rows)
    }
    .await;
    csv_attachment("Exporting lab orders", "lab-orders", result)
}

#[utoipa::path(
    get,
    path = "/lab/orders/{uuid}",
    tag = "lab",
    params(("uuid" = String, Path, description = "Order uuid")),
    responses(
        (status = 200, description = "The order", body = ActionRes),
        (status = 404, description = "No such order", body = ActionRes)
    )
)]
#[axum::debug_handler]
pub async fn get_lab_order(State(state): State<AppState>, Path(uuid): Path<String>) -> Response {
    let result = async {
        let uuid = parse_id(&uuid)?;
        state.services.lab.get_order(&uuid).await
    }
    .await;
    action("Fetching lab order", result)
}

#[utoipa::path(
    post,
    path = "/lab/orders/{uuid}/status",
    tag = "lab",
    params(("uuid" = String, Path, description = "Order uuid")),
    request_body = UpdateStatusReq,
    responses(
        (status = 200, description = "Order row after the change", body = ActionRes),
        (status = 400, description = "Transition not allowed", body = ActionRes)
    )
)]
/// Move an order along the fulfiller workflow.
#[axum::debug_handler]
pub async fn update_lab_order_status(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    Json(req): Json<UpdateStatusReq>,
) -> Response {
    let result = async {
        let uuid = parse_id(&uuid)?;
        let next = FulfillerStatus::from_str(&req.status)
            .map_err(|e| ClinicError::InvalidInput(e.to_string()))?;
        state
            .services
            .lab
            .update_status(&uuid, next, req.comment)
            .await
    }
    .await;
    action("Updating order status", result)
}

#[utoipa::path(
    get,
    path = "/lab/orders/{uuid}/results",
    tag = "lab",
    params(("uuid" = String, Path, description = "Order uuid")),
    responses(
        (status = 200, description = "Result rows matched to the order", body = ActionRes),
        (status = 400, description = "Order has no encounter", body = ActionRes)
    )
)]
#[axum::debug_handler]
pub async fn get_order_results(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Response {
    let result = async {
        let uuid = parse_id(&uuid)?;
        state.services.lab.get_order_results(&uuid).await
    }
    .await;
    action("Loading order results", result)
}

#[utoipa::path(
    get,
    path = "/lab/orders/{uuid}/results/export",
    tag = "lab",
    params(("uuid" = String, Path, description = "Order uuid")),
    responses(
        (status = 200, description = "Result rows as CSV", content_type = "text/csv", body = String)
    )
)]
#[axum::debug_handler]
pub async fn export_order_results(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Response {
    let result = async {
        let uuid = parse_id(&uuid)?;
        let results = state.services.lab.get_order_results(&uuid).await?;
        to_csv(&LAB_RESULT_HEADERS, &results.rows)
    }
    .await;
    csv_attachment("Exporting order results", "lab-results", result)
}

fn result_entry(req: ResultEntryReq) -> ClinicResult<ResultEntry> {
    let concept_uuid = parse_id(&req.concept_uuid)?;
    let value = match (req.numeric, req.text, req.coded) {
        (Some(number), None, None) => ResultValue::Numeric(number),
        (None, Some(text), None) => ResultValue::Text(NonEmptyText::new(text)?),
        (None, None, Some(answer)) => ResultValue::Coded(parse_id(&answer)?),
        _ => {
            return Err(ClinicError::InvalidInput(format!(
                "result for {concept_uuid} needs exactly one of numeric, text or coded"
            )))
        }
    };
    Ok(ResultEntry {
        concept_uuid,
        value,
    })
}

#[utoipa::path(
    post,
    path = "/lab/orders/{uuid}/results",
    tag = "lab",
    params(("uuid" = String, Path, description = "Order uuid")),
    request_body = SubmitResultsReq,
    responses(
        (status = 200, description = "Saved observation; the order is completed", body = ActionRes),
        (status = 400, description = "Invalid results or order not in progress", body = ActionRes)
    )
)]
/// Record results for an in-progress order and complete it.
#[axum::debug_handler]
pub async fn submit_order_results(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    Json(req): Json<SubmitResultsReq>,
) -> Response {
    let result = async {
        let uuid = parse_id(&uuid)?;
        let entries = req
            .results
            .into_iter()
            .map(result_entry)
            .collect::<ClinicResult<Vec<_>>>()?;
        state.services.lab.submit_results(&uuid, &entries).await
    }
    .await;
    action("Submitting results", result)
}

// ---------------------------------------------------------------------------------------------
// Pharmacy

#[utoipa::path(
    get,
    path = "/pharmacy/patients/{uuid}/prescriptions",
    tag = "pharmacy",
    params(("uuid" = String, Path, description = "Patient uuid")),
    responses(
        (status = 200, description = "Active prescriptions", body = ActionRes)
    )
)]
#[axum::debug_handler]
pub async fn prescriptions(State(state): State<AppState>, Path(uuid): Path<String>) -> Response {
    let result = async {
        let patient = parse_id(&uuid)?;
        state.services.pharmacy.active_prescriptions(&patient).await
    }
    .await;
    action("Loading prescriptions", result)
}

#[utoipa::path(
    get,
    path = "/pharmacy/patients/{uuid}/conditions",
    tag = "pharmacy",
    params(("uuid" = String, Path, description = "Patient uuid")),
    responses(
        (status = 200, description = "Recorded conditions", body = ActionRes)
    )
)]
#[axum::debug_handler]
pub async fn conditions(State(state): State<AppState>, Path(uuid): Path<String>) -> Response {
    let result = async {
        let patient = parse_id(&uuid)?;
        state.services.pharmacy.conditions(&patient).await
    }
    .await;
    action("Loading conditions", result)
}

#[utoipa::path(
    get,
    path = "/pharmacy/patients/{uuid}/encounters",
    tag = "pharmacy",
    params(("uuid" = String, Path, description = "Patient uuid")),
    responses(
        (status = 200, description = "Encounters, newest first", body = ActionRes)
    )
)]
#[axum::debug_handler]
pub async fn encounters(State(state): State<AppState>, Path(uuid): Path<String>) -> Response {
    let result = async {
        let patient = parse_id(&uuid)?;
        state.services.pharmacy.encounters(&patient).await
    }
    .await;
    action("Loading encounters", result)
}

#[utoipa::path(
    post,
    path = "/pharmacy/dispense",
    tag = "pharmacy",
    request_body = DispenseReq,
    responses(
        (status = 200, description = "Recorded dispense", body = ActionRes),
        (status = 400, description = "Invalid quantity or inactive prescription", body = ActionRes)
    )
)]
#[axum::debug_handler]
pub async fn dispense(State(state): State<AppState>, Json(req): Json<DispenseReq>) -> Response {
    let result = async {
        let request = NewDispense {
            prescription: parse_id(&req.prescription_uuid)?,
            quantity: req.quantity,
            unit: req.unit,
            location: optional_id(req.location_uuid.as_deref())?,
            performer: optional_id(req.performer_uuid.as_deref())?,
        };
        state.services.pharmacy.dispense(&request).await
    }
    .await;
    action("Dispensing medication", result)
}

// ---------------------------------------------------------------------------------------------
// Stock

#[utoipa::path(
    get,
    path = "/stock/items",
    tag = "stock",
    params(StockItemsParams),
    responses(
        (status = 200, description = "One page of stock items", body = ActionRes)
    )
)]
#[axum::debug_handler]
pub async fn list_stock_items(
    State(state): State<AppState>,
    Query(params): Query<StockItemsParams>,
) -> Response {
    let result = async {
        let rows = state.services.stock.list_items(params.q.as_deref()).await?;
        paginate(
            rows,
            params.page.unwrap_or(1),
            params.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
    .await;
    action("Loading stock items", result)
}

#[utoipa::path(
    get,
    path = "/stock/items/export",
    tag = "stock",
    params(StockItemsParams),
    responses(
        (status = 200, description = "Stock items as CSV", content_type = "text/csv", body = String)
    )
)]
#[axum::debug_handler]
pub async fn export_stock_items(
    State(state): State<AppState>,
    Query(params): Query<StockItemsParams>,
) -> Response {
    let result = async {
        let rows = state.services.stock.list_items(params.q.as_deref()).await?;
        to_csv(&STOCK_ITEM_HEADERS, &rows)
    }
    .await;
    csv_attachment("Exporting stock items", "stock-items", result)
}

#[utoipa::path(
    get,
    path = "/stock/items/{uuid}",
    tag = "stock",
    params(("uuid" = String, Path, description = "Stock item uuid")),
    responses(
        (status = 200, description = "The stock item", body = ActionRes),
        (status = 404, description = "No such item", body = ActionRes)
    )
)]
#[axum::debug_handler]
pub async fn get_stock_item(State(state): State<AppState>, Path(uuid): Path<String>) -> Response {
    let result = async {
        let uuid = parse_id(&uuid)?;
        state.services.stock.get_item(&uuid).await
    }
    .await;
    action("Fetching stock item", result)
}

fn operation_status(value: &str) -> ClinicResult<StockOperationStatus> {
    let wire = serde_json::Value::String(value.trim().to_ascii_uppercase());
    match serde_json::from_value(wire) {
        Ok(StockOperationStatus::Unknown) | Err(_) => Err(ClinicError::InvalidInput(format!(
            "unknown stock operation status {value:?}"
        ))),
        Ok(status) => Ok(status),
    }
}

#[utoipa::path(
    get,
    path = "/stock/operations",
    tag = "stock",
    params(StockOperationsParams),
    responses(
        (status = 200, description = "Stock operations", body = ActionRes)
    )
)]
#[axum::debug_handler]
pub async fn list_stock_operations(
    State(state): State<AppState>,
    Query(params): Query<StockOperationsParams>,
) -> Response {
    let result = async {
        let status = params
            .status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(operation_status)
            .transpose()?;
        state.services.stock.list_operations(status).await
    }
    .await;
    action("Loading stock operations", result)
}

#[utoipa::path(
    post,
    path = "/stock/operations",
    tag = "stock",
    request_body = NewStockOperationReq,
    responses(
        (status = 200, description = "Created operation", body = ActionRes),
        (status = 400, description = "Invalid operation", body = ActionRes)
    )
)]
/// Create a stock operation. The location defaults to the clinic's and the date to now.
#[axum::debug_handler]
pub async fn create_stock_operation(
    State(state): State<AppState>,
    Json(req): Json<NewStockOperationReq>,
) -> Response {
    let result = async {
        let operation = NewStockOperation {
            operation_type_uuid: parse_id(&req.operation_type_uuid)?.to_string(),
            at_location_uuid: optional_id(req.at_location_uuid.as_deref())?
                .or_else(|| state.location.clone())
                .map(|uuid| uuid.to_string()),
            source_uuid: optional_id(req.source_uuid.as_deref())?.map(|uuid| uuid.to_string()),
            destination_uuid: optional_id(req.destination_uuid.as_deref())?
                .map(|uuid| uuid.to_string()),
            operation_date: req
                .operation_date
                .unwrap_or_else(|| Utc::now().format(OPENMRS_DATETIME_FORMAT).to_string()),
            remarks: req.remarks,
            stock_operation_items: req
                .items
                .into_iter()
                .map(|item| NewStockOperationItem {
                    stock_item_uuid: item.stock_item_uuid,
                    stock_batch_uuid: item.stock_batch_uuid,
                    batch_no: item.batch_no,
                    quantity: item.quantity,
                    packaging_uom_uuid: item.packaging_uom_uuid,
                })
                .collect(),
        };
        state.services.stock.create_operation(&operation).await
    }
    .await;
    action("Creating stock operation", result)
}

fn physical_counts(req: &ReconciliationReq) -> ClinicResult<Vec<PhysicalCount>> {
    req.counts
        .iter()
        .map(|count| {
            Ok(PhysicalCount {
                stock_item_uuid: parse_id(&count.stock_item_uuid)?,
                batch_no: count.batch_no.clone(),
                quantity: count.quantity,
            })
        })
        .collect()
}

#[utoipa::path(
    post,
    path = "/stock/reconciliation",
    tag = "stock",
    request_body = ReconciliationReq,
    responses(
        (status = 200, description = "Counts compared with the system inventory", body = ActionRes),
        (status = 400, description = "Invalid counts", body = ActionRes)
    )
)]
/// Compare physical counts with the inventory without changing anything.
#[axum::debug_handler]
pub async fn reconcile_stock(
    State(state): State<AppState>,
    Json(req): Json<ReconciliationReq>,
) -> Response {
    let result = async {
        let location = location_or_default(&state, req.location_uuid.as_deref())?;
        let counts = physical_counts(&req)?;
        state.services.stock.reconcile(&location, &counts).await
    }
    .await;
    action("Reconciling stock", result)
}

#[utoipa::path(
    post,
    path = "/stock/reconciliation/submit",
    tag = "stock",
    request_body = ReconciliationReq,
    responses(
        (status = 200, description = "Adjustment operation posting the variances", body = ActionRes),
        (status = 400, description = "Invalid counts or nothing to adjust", body = ActionRes)
    )
)]
/// Reconcile the counts and post the variances as an adjustment.
#[axum::debug_handler]
pub async fn submit_reconciliation(
    State(state): State<AppState>,
    Json(req): Json<ReconciliationReq>,
) -> Response {
    let result = async {
        let location = location_or_default(&state, req.location_uuid.as_deref())?;
        let counts = physical_counts(&req)?;
        let summary = state.services.stock.reconcile(&location, &counts).await?;
        state
            .services
            .stock
            .submit_reconciliation(&location, &summary, req.remarks.clone())
            .await
    }
    .await;
    action("Submitting reconciliation", result)
}
