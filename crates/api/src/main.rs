use anyhow::Context;

use totes_api::app::{AppState, build_app};
use totes_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    totes_observability::init();

    let config = AppConfig::load()?;

    let state = AppState::from_config(&config).await?;
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
