/// HTTP API for the auth service
///
/// Thin glue over the service layer: JSON request binding in, enveloped
/// JSON out. Status-code mapping lives on [`crate::error::AuthError`];
/// handlers only name the operation.
mod auth;
mod users;

use crate::services::{OAuthService, UserService};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub oauth: Arc<OAuthService>,
}

/// Build the HTTP router with all public endpoints
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/send/otp", post(auth::send_otp))
        .route("/verify/otp", post(auth::verify_otp))
        .route("/:provider/oauth", get(auth::oauth_authorize))
        .route("/callback/:provider", get(auth::oauth_callback));

    let user_routes = Router::new().route("/", get(users::get_all_users)).route(
        "/:id",
        get(users::get_user_by_id)
            .put(users::update_user)
            .delete(users::delete_user),
    );

    Router::new()
        .route("/health", get(health_check))
        .nest("/v1/auth", auth_routes)
        .nest("/v1/users", user_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint (no auth required)
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Response envelope shared by every endpoint.
pub(crate) fn envelope<T: Serialize>(status: StatusCode, message: &str, data: T) -> Response {
    (
        status,
        Json(json!({
            "statusCode": status.as_u16(),
            "status": status.is_success(),
            "message": message,
            "data": data,
        })),
    )
        .into_response()
}

/// Serve the router until ctrl-c.
pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = build_router(state);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {e}"))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install ctrl-c handler: {}", e);
        return;
    }
    info!("shutdown signal received");
}
