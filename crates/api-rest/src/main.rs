//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development when you only want the REST server (with OpenAPI/Swagger UI). The
//! workspace's main `portal-run` binary serves the same router.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use portal_core::{ConfigSources, PortalConfig};

/// Main entry point for the portal REST API server
///
/// Starts the REST API server on the configured address (default: 0.0.0.0:3000).
///
/// # Environment Variables
/// - `PORTAL_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `API_KEY`: Key required in the `x-api-key` header of portal routes (optional)
/// - `PORTAL_*`: Gateway, map and portal settings, see `PortalConfig::resolve`
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the portal configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("portal_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("PORTAL_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting portal REST API on {}", addr);

    let cfg = PortalConfig::resolve(ConfigSources::from_env())?;
    let gateway = cfg.gateway().connect()?;
    let api_key = std::env::var("API_KEY").ok().filter(|k| !k.is_empty());
    if api_key.is_none() {
        tracing::warn!("API_KEY not set, portal routes accept any caller");
    }

    let app = router(AppState::new(cfg, gateway, api_key));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
