//! # API REST
//!
//! REST API for the clinic front end.
//!
//! Handles:
//! - HTTP endpoints with axum, one per clinic action
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON envelopes, CSV attachments, CORS, the optional API key)
//!
//! Uses `api-shared` for request bodies and `clinic-core` for everything the endpoints do.

#![warn(rust_2018_idioms)]

pub mod handlers;
pub mod respond;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::dto::{
    ActionRes, DispenseReq, LoginReq, NewStockOperationReq, PhysicalCountReq, ReconciliationReq,
    ResultEntryReq, SetLocationReq, StockOperationItemReq, SubmitResultsReq, UpdateStatusReq,
};
use api_shared::{validate_api_key, HealthRes, API_KEY_HEADER};
use clinic_core::{ClinicResult, ClinicServices, EmrConfig, EmrUuid};

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub services: ClinicServices,
    /// Clinic location used when a request does not name one.
    pub location: Option<EmrUuid>,
    /// When set, every route except `/health` requires it in the `x-api-key` header.
    pub api_key: Option<Arc<str>>,
}

impl AppState {
    /// Build the state from the resolved EMR configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the EMR client cannot be built.
    pub fn new(config: EmrConfig, api_key: Option<String>) -> ClinicResult<Self> {
        let location = config.location_uuid().cloned();
        Ok(Self {
            services: ClinicServices::from_config(config)?,
            location,
            api_key: api_key
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty())
                .map(Arc::from),
        })
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::get_session,
        handlers::login,
        handlers::logout,
        handlers::set_location,
        handlers::profile,
        handlers::login_locations,
        handlers::search_patients,
        handlers::list_lab_orders,
        handlers::export_lab_orders,
        handlers::get_lab_order,
        handlers::update_lab_order_status,
        handlers::get_order_results,
        handlers::export_order_results,
        handlers::submit_order_results,
        handlers::prescriptions,
        handlers::conditions,
        handlers::encounters,
        handlers::dispense,
        handlers::list_stock_items,
        handlers::export_stock_items,
        handlers::get_stock_item,
        handlers::list_stock_operations,
        handlers::create_stock_operation,
        handlers::reconcile_stock,
        handlers::submit_reconciliation,
    ),
    components(schemas(
        HealthRes,
        ActionRes,
        LoginReq,
        SetLocationReq,
        UpdateStatusReq,
        ResultEntryReq,
        SubmitResultsReq,
        DispenseReq,
        StockOperationItemReq,
        NewStockOperationReq,
        PhysicalCountReq,
        ReconciliationReq,
    ))
)]
pub struct ApiDoc;

/// Reject requests without the configured API key. A no-op when no key is configured.
async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(expected) = state.api_key.as_deref() else {
        return next.run(request).await;
    };
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    match validate_api_key(provided, expected) {
        Ok(()) => next.run(request).await,
        Err(err) => {
            tracing::warn!("rejected {} {}: {}", request.method(), request.uri().path(), err);
            let body = ActionRes {
                success: false,
                data: None,
                message: Some(err.to_string()),
                redirect: None,
            };
            (StatusCode::UNAUTHORIZED, Json(body)).into_response()
        }
    }
}

/// The full REST application: clinic routes, Swagger UI and CORS.
pub fn router(state: AppState) -> Router {
    let actions = Router::new()
        .route(
            "/session",
            get(handlers::get_session).delete(handlers::logout),
        )
        .route("/session/login", post(handlers::login))
        .route("/session/location", post(handlers::set_location))
        .route("/session/profile", get(handlers::profile))
        .route("/locations/login", get(handlers::login_locations))
        .route("/patients", get(handlers::search_patients))
        .route("/lab/orders", get(handlers::list_lab_orders))
        .route("/lab/orders/export", get(handlers::export_lab_orders))
        .route("/lab/orders/:uuid", get(handlers::get_lab_order))
        .route(
            "/lab/orders/:uuid/status",
            post(handlers::update_lab_order_status),
        )
        .route(
            "/lab/orders/:uuid/results",
            get(handlers::get_order_results).post(handlers::submit_order_results),
        )
        .route(
            "/lab/orders/:uuid/results/export",
            get(handlers::export_order_results),
        )
        .route(
            "/pharmacy/patients/:uuid/prescriptions",
            get(handlers::prescriptions),
        )
        .route(
            "/pharmacy/patients/:uuid/conditions",
            get(handlers::conditions),
        )
        .route(
            "/pharmacy/patients/:uuid/encounters",
            get(handlers::encounters),
        )
        .route("/pharmacy/dispense", post(handlers::dispense))
        .route("/stock/items", get(handlers::list_stock_items))
        .route("/stock/items/export", get(handlers::export_stock_items))
        .route("/stock/items/:uuid", get(handlers::get_stock_item))
        .route(
            "/stock/operations",
            get(handlers::list_stock_operations).post(handlers::create_stock_operation),
        )
        .route("/stock/reconciliation", post(handlers::reconcile_stock))
        .route(
            "/stock/reconciliation/submit",
            post(handlers::submit_reconciliation),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(actions)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
