use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use pagepulse_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Structured JSON logging. Level controlled via RUST_LOG env var.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pagepulse=info".parse()?),
        )
        .json()
        .init();

    let cfg = pagepulse_core::config::Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Ensure data directory exists before opening DuckDB.
    std::fs::create_dir_all(&cfg.data_dir)?;
    let db_path = format!("{}/pagepulse.db", cfg.data_dir);

    let db = pagepulse_duckdb::DuckDbBackend::open(&db_path, &cfg.duckdb_memory_limit)?;

    let state = Arc::new(AppState::new(db, cfg.clone()));

    let addr = format!("0.0.0.0:{}", cfg.port);
    let app = pagepulse_server::app::build_app(Arc::clone(&state));

    info!(port = cfg.port, "PagePulse listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let state_for_shutdown = Arc::clone(&state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    // Give in-flight analytics writes a bounded chance to land before exit.
    tokio::time::timeout(
        std::time::Duration::from_secs(5),
        state_for_shutdown.wait_for_writes(),
    )
    .await
    .ok();

    Ok(())
}
