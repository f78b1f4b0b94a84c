//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the clinic REST API (with OpenAPI/Swagger UI) on its own.
//!
//! ## Intended use
//! Useful for development against a test EMR. The workspace's main `clinic-run` binary serves the
//! same router.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use clinic_core::EmrConfig;

/// Main entry point for the clinic REST API server
///
/// # Environment Variables
/// - `CLINIC_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `CLINIC_API_KEY`: When set, required in the `x-api-key` header
/// - `EMR_*`: EMR connection settings, see `EmrConfig::from_lookup`
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the EMR configuration is missing or malformed,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("clinic_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CLINIC_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let config = EmrConfig::from_lookup(|key| std::env::var(key).ok())?;
    tracing::info!("-- EMR at {}", config.rest_base_url());

    let state = AppState::new(config, std::env::var("CLINIC_API_KEY").ok())?;
    if state.api_key.is_none() {
        tracing::warn!("CLINIC_API_KEY is not set; the REST API is open");
    }

    tracing::info!("-- Starting clinic REST API on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
