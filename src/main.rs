use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use salespad_outreach_api::ai_service::AiService;
use salespad_outreach_api::app;
use salespad_outreach_api::config::Config;
use salespad_outreach_api::db::Database;
use salespad_outreach_api::handlers::AppState;
use salespad_outreach_api::lead_service::LeadService;
use salespad_outreach_api::lead_store::PgLeadStore;
use salespad_outreach_api::openapi;
use salespad_outreach_api::queue_service::{QueueService, QueueSettings};

/// Main entry point for the application.
///
/// Initializes logging, configuration, the database pool (running
/// migrations), the lead/queue/AI services and the HTTP routes, then starts
/// the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "salespad_outreach_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize database connection pool
    let db = Database::new(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database connection pool established");

    let app_state = Arc::new(AppState {
        leads: LeadService::new(Arc::new(PgLeadStore::new(db.pool.clone()))),
        queue: QueueService::new(QueueSettings::from_config(&config)),
        ai: AiService::new(Duration::from_millis(config.ai_delay_ms)),
    });

    // 10 requests/second per IP, burst of 20
    let app = app::rate_limited_router(app_state, openapi::api_doc(&config.public_url), 10, 20)?;

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("[SalesPad] Prototype running at {}", config.public_url);
    tracing::info!(
        "[SalesPad] Swagger docs available at {}/api-docs",
        config.public_url
    );
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
