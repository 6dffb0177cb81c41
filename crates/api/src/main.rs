use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelworks_api::config::{LogFormat, ServerConfig};
use reelworks_api::router::build_app_router;
use reelworks_api::state::AppState;
use reelworks_core::Workflow;
use reelworks_db::PgStore;
use reelworks_events::{EventBus, NotificationOutbox};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env()?;

    // --- Tracing ---
    init_tracing(config.log_format);
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let pool = reelworks_db::create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    reelworks_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    reelworks_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database ready, migrations applied");

    // --- Event bus and outbox ---
    let event_bus = Arc::new(EventBus::default());
    let outbox_handle = tokio::spawn(NotificationOutbox::run(
        pool.clone(),
        event_bus.subscribe(),
    ));

    // --- Workflow ---
    let store = PgStore::new(pool).with_lock_wait(config.lock_wait);
    let workflow = Workflow::new(Arc::new(store), event_bus.clone(), config.workflow);

    let addr = SocketAddr::new(
        config.host.parse().context("Invalid HOST address")?,
        config.port,
    );

    let state = AppState {
        workflow,
        config: Arc::new(config),
    };
    let app = build_app_router(state)?;

    // --- Start server ---
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, draining outbox");

    // Dropping the last bus handle closes the channel; the outbox exits once drained.
    // The router and its workflow clone were consumed by `serve`.
    drop(event_bus);
    if tokio::time::timeout(Duration::from_secs(5), outbox_handle)
        .await
        .is_err()
    {
        tracing::warn!("Notification outbox did not drain in time");
    }

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "reelworks_api=debug,reelworks_core=info,reelworks_db=info,reelworks_events=info,tower_http=debug"
            .into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
