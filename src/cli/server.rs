use std::sync::Arc;

use anyhow::Result;
use botcomod_house::Houses;
use botcomod_shared::token::TokenCodec;
use tower_http::trace::TraceLayer;

use crate::{audit::UpdateLogger, bot::Services, config::Config, routes::AppState};

#[tracing::instrument(skip_all)]
pub async fn serve(
    config: Config,
    host_override: Option<String>,
    port_override: Option<u16>,
) -> Result<()> {
    tracing::info!("Starting botcomod server...");

    // Use CLI overrides if provided, otherwise use config
    let host = host_override.unwrap_or(config.server.host.to_owned());
    let port = port_override.unwrap_or(config.server.port);

    // Write pool: 1 connection, every update transaction goes through it
    let write_pool = crate::db::create_write_pool(&config.database.url).await?;

    // Side pool for the house cache and the audit worker
    let pool = crate::db::create_pool(&config.database.url, config.database.max_connections).await?;

    let (audit, audit_worker) = UpdateLogger::spawn(pool.clone(), &config.audit);
    let services = Services {
        houses: Houses::new(pool.clone(), config.houses.cache_ttl()),
        tokens: TokenCodec::new(config.token.secret.as_bytes())?,
        bot: config.bot.clone(),
    };

    let state = AppState {
        pool: write_pool.clone(),
        services: Arc::new(services),
        audit,
    };

    let app = crate::routes::router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router and its state are gone, so the last sender is dropped and the
    // worker exits after draining the queue.
    tracing::info!("Draining audit queue...");
    if let Err(e) = audit_worker.await {
        tracing::error!("audit worker: {e}");
    }

    tracing::info!("Closing database pools...");
    pool.close().await;
    write_pool.close().await;

    tracing::info!("Graceful shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Starting graceful shutdown...");
}
