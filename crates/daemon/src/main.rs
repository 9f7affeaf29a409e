//! sendqd - outbound message queue daemon
//!
//! Owns the queue record, drives the dispatcher, and serves the JSON-RPC
//! presenter surface.

mod config;
mod telemetry;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use config::{DaemonConfig, TransportConfig, TransportKind};
use sendq_api_rpc::{RpcServer, RpcServerConfig};
use sendq_core::application::{shutdown_channel, Dispatcher, QueueService, QueueStore};
use sendq_core::port::id_provider::UuidProvider;
use sendq_core::port::time_provider::SystemTimeProvider;
use sendq_core::port::{NotificationFeed, Notifier, Transport};
use sendq_infra_sqlite::{create_pool, database_url, run_migrations, SqliteStateStore};
use sendq_infra_system::{CommandTransport, FeedNotifier, HttpTransport, LogTransport};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Configuration and logging
    let config = DaemonConfig::load().context("Failed to load configuration")?;
    let _logging = telemetry::init_logging(&config.logging)?;
    config.validate()?;

    info!("sendqd v{} starting...", VERSION);

    // 2. Database
    let db_path = config.resolved_database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    info!(db_path = %db_path.display(), "Opening queue database...");

    let pool = create_pool(&database_url(&db_path))
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 3. Queue state (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);
    let state_store = Arc::new(SqliteStateStore::new(pool.clone(), time_provider.clone()));
    let store = Arc::new(QueueStore::new(state_store, config.queue.clone()));

    let report = store
        .load()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load queue record: {}", e))?;
    if report.corrupt {
        warn!("Queue record was corrupt; started with an empty queue and default settings");
    } else {
        info!(
            items = report.items,
            recovered_in_flight = report.recovered_in_flight,
            "Queue restored"
        );
    }

    // 4. Collaborators
    let feed = Arc::new(FeedNotifier::new(time_provider.clone()));
    let notifier: Arc<dyn Notifier> = feed.clone();
    let transport = build_transport(&config.transport)?;

    let dispatcher = Arc::new(Dispatcher::new(
        store.clone(),
        transport,
        notifier.clone(),
        time_provider.clone(),
    ));
    let service = Arc::new(QueueService::new(
        store,
        dispatcher.clone(),
        id_provider,
        time_provider,
        notifier,
    ));

    // 5. JSON-RPC server
    let rpc_config = RpcServerConfig {
        host: config.rpc.host.clone(),
        port: config.rpc.port,
    };
    let feed: Arc<dyn NotificationFeed> = feed;
    let (rpc_addr, rpc_handle) = RpcServer::new(rpc_config, service.clone(), feed)
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    // 6. Dispatcher loop
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let dispatcher_handle = tokio::spawn({
        let dispatcher = dispatcher.clone();
        async move { dispatcher.run(shutdown_rx).await }
    });

    info!(rpc_addr = %rpc_addr, transport = ?config.transport.kind, "System ready");
    info!("Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    // 8. Graceful shutdown: stop intake, let an in-flight send settle, persist
    if let Err(e) = rpc_handle.stop() {
        warn!(error = %e, "RPC server already stopped");
    }
    if !shutdown_tx.shutdown() {
        warn!("Dispatcher loop had already exited");
    }

    let grace = Duration::from_millis(config.shutdown_grace_ms);
    match tokio::time::timeout(grace, dispatcher_handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "Dispatcher task failed"),
        Err(_) => warn!(
            grace_ms = config.shutdown_grace_ms,
            "Dispatcher did not stop within grace period"
        ),
    }

    if let Err(e) = service.flush().await {
        error!(error = %e, "Final queue flush failed");
    }
    pool.close().await;

    info!("Shutdown complete.");
    Ok(())
}

fn build_transport(config: &TransportConfig) -> Result<Arc<dyn Transport>> {
    let transport: Arc<dyn Transport> = match config.kind {
        TransportKind::Command => {
            let program = config
                .command
                .clone()
                .context("transport.command is required for the command transport")?;
            Arc::new(CommandTransport::new(
                program,
                config.args.clone(),
                config.env_allowlist.clone(),
                config.timeout_ms,
            ))
        }
        TransportKind::Http => {
            let base_url = config
                .base_url
                .clone()
                .context("transport.base_url is required for the http transport")?;
            Arc::new(
                HttpTransport::new(base_url, config.token.clone(), config.timeout_ms)
                    .map_err(|e| anyhow::anyhow!("HTTP transport setup failed: {}", e))?,
            )
        }
        TransportKind::Log => {
            warn!("Using log transport: messages are logged, not delivered");
            Arc::new(LogTransport)
        }
    };
    Ok(transport)
}
