/// Auth Service Library
///
/// Provides authentication and identity management for the Refina backend:
/// password and OAuth login, one-time-code email verification, and signed
/// session tokens.
///
/// ## Modules
///
/// - `config`: Service configuration
/// - `db`: User store contract and Postgres implementation
/// - `error`: Error types
/// - `http`: Axum router and handlers
/// - `models`: Data models
/// - `security`: Session tokens, password hashing
/// - `services`: Business logic (email, oauth, otp, users)
/// - `validators`: Input validation
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod models;
pub mod security;
pub mod services;
pub mod validators;

// Re-export commonly used types
pub use error::{AuthError, Result};
