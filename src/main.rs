use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use portal_core::{ConfigSources, PortalConfig};

/// Main entry point for the portal
///
/// Resolves the portal configuration once, connects the remote data gateway and serves the
/// REST API until interrupted.
///
/// # Environment Variables
/// - `PORTAL_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `PORTAL_GATEWAY_URL` / `PORTAL_GATEWAY_KEY`: hosted backend; the in-memory store is used
///   when unset
/// - `PORTAL_SEED_FILE`: YAML clinic list for the in-memory store
/// - `API_KEY`: key required in the `x-api-key` header of portal routes
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
                .add_directive("portal_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("portal_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("PORTAL_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = PortalConfig::resolve(ConfigSources::from_env())?;
    let gateway = cfg.gateway().connect()?;
    let api_key = std::env::var("API_KEY").ok().filter(|k| !k.is_empty());
    if api_key.is_none() {
        tracing::warn!("API_KEY not set, portal routes accept any caller");
    }

    tracing::info!("++ Starting portal REST on {}", rest_addr);

    let app = router(AppState::new(cfg, gateway, api_key));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    tracing::info!("-- Portal stopped");
    Ok(())
}
