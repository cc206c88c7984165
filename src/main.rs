use anyhow::Context;
use dotenvy::dotenv;
use tracing::{error, info};

use coursemart::coursemart_config::ServerConfig;
use coursemart::logging::init_tracing;
use coursemart::metrics::{init_metrics, metrics_app};
use coursemart::router::init_router;
use coursemart::state::init_app_state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing().context("failed to initialize tracing")?;

    let server_config = ServerConfig::from_env();

    if let Some(handle) = init_metrics()? {
        let metrics_addr = server_config.metrics_addr();
        let listener = tokio::net::TcpListener::bind(&metrics_addr)
            .await
            .with_context(|| format!("failed to bind metrics listener on {metrics_addr}"))?;
        info!(addr = %metrics_addr, "Metrics available at /metrics");

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, metrics_app(handle)).await {
                error!(error = %e, "metrics server stopped");
            }
        });
    }

    let state = init_app_state().await?;
    let app = init_router(state);

    let bind_addr = server_config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    info!(addr = %bind_addr, "Server running");
    info!("Scalar UI available at /scalar");

    axum::serve(listener, app).await?;
    Ok(())
}
