// gateledger - Usage telemetry and thinking-signature cache for AI gateways
// Author: kelexine (https://github.com/kelexine)

use anyhow::Result;
use clap::Parser;
use gateledger::cli::Args;
use gateledger::config::AppConfig;
use gateledger::server::create_router;
use gateledger::signature::{spawn_sweeper, SignatureCache};
use gateledger::usage::UsageStore;
use gateledger::utils::logging;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Phase 1: Load configuration
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from(path, true)?,
        None => AppConfig::load()?,
    };
    args.apply(&mut config);

    // Phase 2: Initialize logging
    logging::init(&config.logging)?;
    info!("Starting gateledger v{}", env!("CARGO_PKG_VERSION"));

    // Phase 3: Build the runtime sized from config
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.workers.max(1))
        .enable_all()
        .build()?;

    runtime.block_on(run(config))
}

async fn run(config: AppConfig) -> Result<()> {
    // Phase 4: Construct the stores
    let signatures = Arc::new(SignatureCache::new(config.signature_cache.to_cache_config()));
    let usage = Arc::new(UsageStore::new(config.usage.to_usage_config()));
    info!(
        "Signature cache ready (ttl {}s, {} entries per group), usage window {}",
        config.signature_cache.ttl_seconds,
        config.signature_cache.max_entries_per_group,
        usage.recent_window()
    );

    let sweeper = config.signature_cache.sweep_interval().map(|every| {
        info!("Signature sweep every {}s", every.as_secs());
        spawn_sweeper(signatures.clone(), every)
    });

    // Phase 5: Build and start the admin server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let app = create_router(config, signatures, usage);

    info!("Starting admin server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Phase 6: Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
