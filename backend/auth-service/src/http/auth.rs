/// Authentication endpoints: register, login, OTP, OAuth
use super::{envelope, AppState};
use crate::error::{AuthError, Result};
use crate::models::{
    LoginRequest, RegisterRequest, SendOtpRequest, UserResponse, VerifyOtpRequest,
};
use crate::services::OAuthProvider;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

pub(super) async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response> {
    req.validate()?;
    let user = state
        .users
        .register(&req.name, &req.email, &req.password)
        .await?;

    Ok(envelope(
        StatusCode::CREATED,
        "Register user data",
        UserResponse::from(user),
    ))
}

pub(super) async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response> {
    req.validate()?;
    let token = state.users.login(&req.email, &req.password).await?;

    Ok(envelope(StatusCode::OK, "Login user data", token))
}

pub(super) async fn send_otp(
    State(state): State<AppState>,
    Json(req): Json<SendOtpRequest>,
) -> Result<Response> {
    req.validate()?;
    state.users.send_otp(&req.email).await?;

    Ok(envelope(StatusCode::OK, "OTP sent successfully", req.email))
}

pub(super) async fn verify_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Response> {
    req.validate()?;
    let user = state.users.verify_otp(&req.email, &req.otp).await?;

    Ok(envelope(
        StatusCode::OK,
        "OTP verified successfully",
        UserResponse::from(user),
    ))
}

/// Hand the frontend the provider's authorization URL.
pub(super) async fn oauth_authorize(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Response> {
    let provider = parse_provider(&provider)?;
    let url = state
        .oauth
        .authorization_url(provider, provider.as_str())?;

    Ok(Json(json!({ "url": url })).into_response())
}

#[derive(Debug, Deserialize)]
pub(super) struct CallbackQuery {
    code: Option<String>,
}

/// Provider redirect target: exchange the code, upsert the identity, and
/// send the browser back to the frontend with a session token.
pub(super) async fn oauth_callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> Result<Response> {
    let provider = parse_provider(&provider)?;

    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AuthError::Validation("authorization code not found".to_string()))?;

    let profile = state.oauth.exchange_code(provider, &code).await?;
    let token = state.users.oauth_login(profile).await?;

    let client_base = state.oauth.client_redirect_base();
    if state.oauth.is_public() {
        return Ok(
            Redirect::to(&format!("{client_base}/login?token={token}")).into_response(),
        );
    }

    // Development: hand the token over as a cookie on the loopback origin.
    let cookie = format!("token={token}; Path=/; Max-Age=86400");
    Ok((
        [(header::SET_COOKIE, cookie)],
        Redirect::to(client_base),
    )
        .into_response())
}

fn parse_provider(provider: &str) -> Result<OAuthProvider> {
    OAuthProvider::from_str(provider)
        .ok_or_else(|| AuthError::UnknownProvider(provider.to_string()))
}
