/// Service layer for the auth service
///
/// Provides business logic and integrations:
/// - Email delivery (SMTP for one-time codes)
/// - OAuth 2.0 federation (Google, GitHub, Microsoft)
/// - One-time-code issuance and validation (Redis-backed)
/// - Identity orchestration (register, login, OTP verification, CRUD)
pub mod email;
pub mod oauth;
pub mod otp;
pub mod users;

pub use email::EmailService;
pub use oauth::{FederatedProfile, OAuthProvider, OAuthService};
pub use otp::{OtpService, OtpStore, RedisOtpStore, DEFAULT_OTP_TTL};
pub use users::UserService;
