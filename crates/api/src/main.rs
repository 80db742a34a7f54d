use anyhow::Context;

use dentiva_api::app;
use dentiva_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dentiva_observability::init();

    let config = ApiConfig::from_env();
    let (router, _services) = app::build_app(&config);

    let listener = tokio::net::TcpListener::bind(&config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router).await?;
    Ok(())
}
