//! Foundry API Server
//!
//! Main entry point for the Foundry admin backend.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use foundry_api::sync::start_sync_scheduler;
use foundry_api::throttle::ResetThrottle;
use foundry_api::{AppState, create_router};
use foundry_shared::AppConfig;
use foundry_shared::email::EmailService;
use foundry_shared::erp::ErpClient;
use foundry_shared::jwt::{JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "foundry=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = foundry_db::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    let db = Arc::new(db);

    let jwt_service = JwtService::new(JwtConfig::from(&config.jwt));

    let email_service = EmailService::new(config.email.clone());
    info!(
        smtp_host = %config.email.smtp_host,
        smtp_port = %config.email.smtp_port,
        "Email service configured"
    );

    let erp = Arc::new(ErpClient::new(config.erp.clone()).context("Failed to build ERP client")?);
    info!(base_url = %config.erp.base_url, "ERP client configured");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = if config.sync.enabled {
        Some(
            start_sync_scheduler(&config.sync.cron, db.clone(), erp.clone(), shutdown_rx)
                .context("Failed to start employee sync")?,
        )
    } else {
        warn!("Employee sync scheduler disabled");
        None
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let reset_throttle = ResetThrottle::new(config.auth.password_reset_throttle_secs);
    let state = AppState {
        db,
        jwt_service: Arc::new(jwt_service),
        email_service: Arc::new(email_service),
        config: Arc::new(config),
        erp,
        reset_throttle,
    };

    let app = create_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown signal received");
        })
        .await?;

    shutdown_tx.send_replace(true);
    if let Some(handle) = scheduler {
        handle.await.ok();
    }

    Ok(())
}
