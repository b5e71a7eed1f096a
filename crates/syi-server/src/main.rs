use std::sync::Arc;

use anyhow::Result;
use syi_core::IndexCode;
use syi_scheduler::{EngineConfig, Scheduler};
use timeseries_store::Store;
use tokio::net::TcpListener;

mod adapters;

use adapters::build_adapters;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        tracing::error!("PANIC: {info}");
    }));

    tracing::info!("Starting StableYield Index engine");

    let config = EngineConfig::from_env()?;
    tracing::info!("Configuration loaded and validated");
    tracing::info!("  Cycle interval: {:?}", config.scheduler.cycle_interval);
    tracing::info!("  Cycle deadline: {:?}", config.scheduler.cycle_deadline);
    tracing::info!("  Per-source timeout: {:?}", config.scheduler.per_source_timeout);
    tracing::info!(
        "  Regime tick: {:02}:{:02} UTC",
        config.scheduler.regime_tick_hour_utc,
        config.scheduler.regime_tick_minute_utc
    );

    let adapters = build_adapters();
    tracing::info!("{} source adapter(s) enabled", adapters.len());

    let store = Arc::new(Store::new());
    let index_codes = IndexCode::all().to_vec();
    let scheduler = Arc::new(Scheduler::new(index_codes, adapters, Arc::clone(&store), config));

    let scheduler_handle = Arc::clone(&scheduler);
    let scheduler_task = tokio::spawn(async move {
        scheduler_handle.run().await;
    });

    let state = syi_server::AppState {
        store: Arc::clone(&store),
        scheduler: Arc::clone(&scheduler),
    };
    let app = syi_server::build_router(state);

    let bind_addr = std::env::var("SYI_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("Query API listening on {bind_addr}. Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler_task.abort();
    tracing::info!("StableYield Index engine shut down.");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => { tracing::info!("received SIGINT"); }
            _ = sigterm.recv() => { tracing::info!("received SIGTERM"); }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("received ctrl-c");
    }
}
