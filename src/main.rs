use std::sync::Arc;

use storefront_relay::{
    api,
    config::AppConfig,
    db::{self, pg::PgPaymentEventStore},
    sweeper::{self, RetentionSweeper},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_relay=info,tower_http=info".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let store = PgPaymentEventStore::connect(&config.database_url).await?;
    db::run_migrations(store.pool()).await?;

    let sweep_interval = config.sweeper.interval;
    let sweeper = RetentionSweeper::new(Arc::new(store), config.sweeper.clone());
    let sweep_task = sweeper::spawn_schedule(sweeper, sweep_interval);
    tracing::info!(
        interval_secs = sweep_interval.as_secs(),
        "payment event cleanup scheduled"
    );

    let app = api::router(api::AppState::from_config(config.relay.clone())?);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(
        addr = %config.bind_addr,
        upstream = %config.relay.upstream_base,
        mount = %config.relay.mount_prefix,
        "server listening"
    );
    let served = axum::serve(listener, app).await;

    sweep_task.abort();
    served?;
    Ok(())
}
