use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use crypto_core::TokenError;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("please enter a valid email address")]
    InvalidEmail,

    #[error("{0}")]
    WeakPassword(String),

    #[error("email already exists")]
    EmailAlreadyExists,

    #[error("email already in use by another user")]
    EmailInUse,

    #[error("user not found")]
    UserNotFound,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("invalid or expired OTP")]
    InvalidOtp,

    #[error("unknown OAuth provider: {0}")]
    UnknownProvider(String),

    #[error("OAuth code exchange failed: {0}")]
    OAuthExchange(String),

    #[error("OAuth profile fetch failed: {0}")]
    OAuthProfileFetch(String),

    #[error("OAuth profile could not be parsed: {0}")]
    OAuthProfileParse(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("database error: {0}")]
    Database(String),

    #[error("OTP store error: {0}")]
    Store(String),

    #[error("failed to send email: {0}")]
    EmailSend(String),

    #[error("internal server error: {0}")]
    Internal(String),
}

impl AuthError {
    /// HTTP status for the error kind.
    ///
    /// Authentication failures all collapse to 401 so the response does not
    /// reveal which factor failed; infrastructure detail stays out of the
    /// body entirely.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation(_)
            | AuthError::InvalidEmail
            | AuthError::WeakPassword(_)
            | AuthError::UnknownProvider(_) => StatusCode::BAD_REQUEST,

            AuthError::EmailAlreadyExists | AuthError::EmailInUse => StatusCode::CONFLICT,

            AuthError::UserNotFound => StatusCode::NOT_FOUND,

            AuthError::InvalidCredentials | AuthError::InvalidOtp => StatusCode::UNAUTHORIZED,

            AuthError::Token(TokenError::Signing(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::Token(_) => StatusCode::UNAUTHORIZED,

            AuthError::OAuthExchange(_)
            | AuthError::OAuthProfileFetch(_)
            | AuthError::OAuthProfileParse(_)
            | AuthError::Database(_)
            | AuthError::Store(_)
            | AuthError::EmailSend(_)
            | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the client.
    fn client_message(&self) -> String {
        match self {
            // Don't leak internal details in production
            AuthError::Token(TokenError::Signing(_))
            | AuthError::OAuthExchange(_)
            | AuthError::OAuthProfileFetch(_)
            | AuthError::OAuthProfileParse(_)
            | AuthError::Database(_)
            | AuthError::Store(_)
            | AuthError::EmailSend(_)
            | AuthError::Internal(_) => "internal server error".to_string(),

            AuthError::Token(_) => "invalid or expired token".to_string(),

            other => other.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({
            "statusCode": status.as_u16(),
            "status": false,
            "message": self.client_message(),
        }));

        (status, body).into_response()
    }
}

// Conversions from external error types
impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("database error: {}", err);
        AuthError::Database(err.to_string())
    }
}

impl From<redis::RedisError> for AuthError {
    fn from(err: redis::RedisError) -> Self {
        tracing::error!("redis error: {}", err);
        AuthError::Store(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(err: validator::ValidationErrors) -> Self {
        AuthError::Validation(err.to_string())
    }
}
