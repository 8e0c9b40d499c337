/// Security primitives for the auth service
///
/// - Password hashing and verification (Argon2id, tunable cost)
/// - Session-token issue/verify (HS256 via the shared crypto-core library)
// Re-export session-token functionality from crypto-core
pub use crypto_core::jwt;
pub use crypto_core::{Claims, SessionSigner, TokenError};

pub mod password;

pub use password::PasswordHasher;
