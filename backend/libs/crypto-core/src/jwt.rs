/// Session-token signing for Refina services
///
/// Tokens are compact JWS strings (HS256) carrying the subject id, display
/// name, email, and expiry. The signing secret is provided once at
/// construction and is immutable for the process lifetime; rotating the
/// configured secret invalidates every outstanding token (accepted
/// trade-off, there is no key versioning).
///
/// ## Security
///
/// - **HS256 only**: verification inspects the token header and rejects
///   any other algorithm before touching the signature, so a forged token
///   cannot downgrade or confuse the verifier.
/// - **No ambient keys**: the signer is constructed from configuration and
///   threaded into components explicitly, which also makes it trivial to
///   unit test with a fabricated secret.
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Algorithm pinned for all session tokens.
const SESSION_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign session token: {0}")]
    Signing(String),

    #[error("token signed with unexpected algorithm {0:?}")]
    UnexpectedAlgorithm(Algorithm),

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,
}

/// Claims carried by a session token. Immutable once minted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Issuer/verifier for session tokens.
///
/// Construct once at startup from the configured secret and share behind
/// an `Arc`; issuance and verification are pure CPU work and safe for
/// unlimited parallel use.
pub struct SessionSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl SessionSigner {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Issue a signed token for `subject`, expiring `ttl` from now.
    pub fn issue(&self, subject: &str, name: &str, email: &str) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(SESSION_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a token and return its claims.
    ///
    /// A pure function of the token and the configured secret: checks the
    /// header algorithm, then the signature, then the expiry. Consults no
    /// external state.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let header = decode_header(token).map_err(|_| TokenError::Malformed)?;
        if header.alg != SESSION_ALGORITHM {
            return Err(TokenError::UnexpectedAlgorithm(header.alg));
        }

        let mut validation = Validation::new(SESSION_ALGORITHM);
        validation.validate_exp = true;

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => Err(match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed,
            }),
        }
    }
}
