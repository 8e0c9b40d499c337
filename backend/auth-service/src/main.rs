/// Auth Service Main Entry Point
///
/// Starts the HTTP server with:
/// - PostgreSQL connection pool (user store)
/// - Redis connection manager (OTP backing store)
/// - SMTP email service (one-time codes)
/// - Session-token signer (HS256)
use anyhow::{Context, Result};
use auth_service::{
    config::Settings,
    db::PgUserStore,
    http::{self, AppState},
    security::{PasswordHasher, SessionSigner},
    services::{EmailService, OAuthService, OtpService, RedisOtpStore, UserService, DEFAULT_OTP_TTL},
};
use redis::aio::ConnectionManager;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "auth_service=info,info".into()))
        .with_target(false)
        .json()
        .init();

    info!("Starting auth service");

    // Load configuration
    let settings = Settings::load().context("Failed to load configuration")?;
    info!("Configuration loaded successfully");

    // Initialize database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(settings.database.max_connections)
        .acquire_timeout(Duration::from_secs(settings.database.acquire_timeout))
        .connect(&settings.database.url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    info!(
        "Database pool initialized with {} max connections",
        settings.database.max_connections
    );

    // Run database migrations
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .context("Failed to run database migrations")?;
    info!("Database migrations completed");

    // Initialize Redis connection manager (OTP backing store)
    let redis_client =
        redis::Client::open(settings.redis.url.as_str()).context("Failed to construct Redis client")?;
    let redis_conn = ConnectionManager::new(redis_client)
        .await
        .context("Failed to connect to Redis")?;
    info!("Redis connection manager initialized");

    // The signing secret is read once here and threaded in explicitly;
    // rotating it invalidates all outstanding tokens.
    let signer = Arc::new(SessionSigner::new(
        settings.jwt.secret.as_bytes(),
        chrono::Duration::hours(settings.jwt.expiry_hours),
    ));

    let hasher = PasswordHasher::new(&settings.hasher)?;
    let mailer = EmailService::new(&settings.email)?;
    if !mailer.is_enabled() {
        info!("Email service running in no-op mode");
    }

    let otp = OtpService::new(Arc::new(RedisOtpStore::new(redis_conn)), DEFAULT_OTP_TTL);
    let store = Arc::new(PgUserStore::new(db_pool));
    let users = UserService::new(store, hasher, signer, otp, mailer);
    let oauth = Arc::new(OAuthService::new(
        settings.oauth.clone(),
        settings.server.mode,
        &settings.client,
    )?);

    let state = AppState { users, oauth };
    http::serve(state, &settings.server.host, settings.server.port).await
}
