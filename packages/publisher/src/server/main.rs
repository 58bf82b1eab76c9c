// Main entry point for the publisher API server

use std::sync::Arc;

use anyhow::{Context, Result};
use publisher_core::domains::auth::JwtService;
use publisher_core::kernel::scheduled_tasks::start_scheduler;
use publisher_core::kernel::{
    create_alert_notifier, InMemoryRateLimitStore, OpenAIGenerator, ServerDeps,
};
use publisher_core::server::{build_app, AppState};
use publisher_core::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,publisher_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting content publisher API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    let deps = Arc::new(ServerDeps::with_postgres(
        pool,
        Arc::new(OpenAIGenerator::new(
            config.openai_api_key.clone(),
            config.openai_model.clone(),
        )),
        create_alert_notifier(
            config.resend_api_key.clone(),
            config.alert_email_from.clone(),
            config.alert_email_to.clone(),
        ),
        Arc::new(InMemoryRateLimitStore::new()),
        config.admin_emails.clone(),
    ));

    // Keep the scheduler alive for the lifetime of the server
    let _scheduler = if config.scheduler_enabled {
        Some(
            start_scheduler(deps.clone(), &config.generate_cron, &config.publish_cron)
                .await
                .context("Failed to start scheduler")?,
        )
    } else {
        tracing::info!("In-process scheduler disabled, relying on HTTP cron triggers");
        spawn_rate_limit_purge(deps.clone());
        None
    };

    if config.cron_secret.is_none() {
        tracing::warn!("CRON_SECRET not set, /api/cron endpoints will reject every call");
    }

    // Build application
    let state = AppState {
        deps,
        jwt_service: Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer.clone())),
        cron_secret: config.cron_secret.clone(),
        admin_rate_limit_per_minute: config.admin_rate_limit_per_minute,
        scheduler_enabled: config.scheduler_enabled,
        trust_proxy_headers: config.trust_proxy_headers,
    };
    let app = build_app(state, &config.allowed_origins);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

/// Drop elapsed rate-limit windows when the scheduler's purge job is not running
fn spawn_rate_limit_purge(deps: Arc<ServerDeps>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(600));
        loop {
            interval.tick().await;
            if let Err(e) = deps.rate_limits.purge_expired().await {
                tracing::warn!("Rate-limit purge failed: {}", e);
            }
        }
    });
}
