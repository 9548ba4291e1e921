//! certdesk API server.

use std::sync::Arc;

use certdesk_server::assets::AssetFetcher;
use certdesk_server::config::{EmailProvider, ServerConfig};
use certdesk_server::email::{EmailSender, HttpEmailSender, SimulatedEmailSender};
use certdesk_server::identity::{spawn_session_logger, GoTrueClient, SessionEvents};
use certdesk_server::{create_router, db, AppState};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("certdesk_server=info,tower_http=info")),
        )
        .init();

    info!("Starting certdesk server...");

    let config = ServerConfig::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;

    let pool = db::create_pool(&config.database_url).await?;
    if config.run_migrations {
        db::run_migrations(&pool).await?;
    }
    info!("Database ready");

    let identity = GoTrueClient::new(&config.auth_url, &config.auth_api_key, config.asset_timeout)?;

    let mailer: Arc<dyn EmailSender> = match &config.email {
        EmailProvider::Simulated { delay } => {
            info!("Email delivery is simulated ({} ms delay)", delay.as_millis());
            Arc::new(SimulatedEmailSender::new(*delay))
        }
        EmailProvider::Http {
            api_url,
            api_key,
            from,
        } => {
            info!("Email delivery via {}", api_url);
            Arc::new(HttpEmailSender::new(api_url, api_key, from, config.asset_timeout)?)
        }
    };

    let sessions = SessionEvents::new();
    let session_logger = spawn_session_logger(&sessions);

    let state = AppState {
        pool,
        identity: Arc::new(identity),
        mailer,
        assets: AssetFetcher::new(config.asset_timeout)?,
        sessions,
        layout: Arc::new(config.template.layout()),
        public_base_url: config.public_base_url.clone(),
    };

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    session_logger.abort();
    info!("Shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
