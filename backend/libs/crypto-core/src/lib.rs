/// Shared cryptographic primitives for the Refina backend.
///
/// Currently hosts the session-token module. Services consume it through
/// their own `security` layer rather than importing `jsonwebtoken`
/// directly, so the algorithm and claims shape stay in one place.
pub mod jwt;

pub use jwt::{Claims, SessionSigner, TokenError};
