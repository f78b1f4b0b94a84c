use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use clinic_core::EmrConfig;

/// Main entry point for the clinic application
///
/// Serves the clinic REST API until interrupted.
///
/// # Environment Variables
/// - `CLINIC_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CLINIC_API_KEY`: API key required on every route except `/health`
/// - `EMR_REST_BASE_URL`, `EMR_FHIR_BASE_URL`: EMR endpoints (required)
/// - `EMR_LOCATION_UUID`, `EMR_USERNAME`, `EMR_PASSWORD`, `EMR_SESSION_ID`,
///   `EMR_LAB_ORDER_TYPE_UUID`: optional EMR settings
///
/// # Returns
/// * `Ok(())` - If the server starts and shuts down cleanly
/// * `Err(anyhow::Error)` - If configuration, startup or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic_run=info".parse()?)
                .add_directive("clinic_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("CLINIC_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let config = EmrConfig::from_lookup(|key| std::env::var(key).ok())?;

    tracing::info!("++ EMR REST at {}", config.rest_base_url());
    tracing::info!("++ EMR FHIR at {}", config.fhir_base_url());
    match config.location_uuid() {
        Some(location) => tracing::info!("++ Clinic location {}", location),
        None => tracing::warn!("EMR_LOCATION_UUID is not set; requests must name a location"),
    }

    let state = AppState::new(config, std::env::var("CLINIC_API_KEY").ok())?;
    if state.api_key.is_none() {
        tracing::warn!("CLINIC_API_KEY is not set; the REST API is open");
    }

    tracing::info!("++ Starting clinic REST on {}", rest_addr);
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", err);
            }
            tracing::info!("-- Shutting down");
        })
        .await?;

    Ok(())
}
