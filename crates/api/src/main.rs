use anyhow::Context;

use eventive_infra::config::AppConfig;
use eventive_observability::LogConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;

    eventive_observability::init(&LogConfig {
        json: config.log_json,
        ..LogConfig::default()
    });

    let app = eventive_api::app::build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
