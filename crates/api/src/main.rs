use anyhow::Context;
use mentorbook_api::{create_router, AppState};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mentorbook=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = mentorbook_infra::config::load().context("failed to load configuration")?;
    info!(
        db_path = %config.database.path,
        scheduling_enabled = config.scheduling.enabled,
        "starting mentorbook"
    );

    let state = AppState::build(&config).context("failed to wire application state")?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    info!(addr = %config.server.bind_addr, "listening");

    axum::serve(listener, app).await.context("server exited with an error")?;
    Ok(())
}
