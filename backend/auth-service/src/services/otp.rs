/// One-time-code issuance and validation
///
/// Codes are 6-digit zero-padded numeric strings held in the backing
/// key-value store under the owner's email, with a time-to-live. At most
/// one code is live per email: issuing again overwrites the previous code,
/// and a successful validation deletes it so it cannot be replayed. Expiry
/// is enforced lazily by the store's TTL eviction; there is no sweeper.
///
/// A mismatch and a store failure are distinct outcomes (`Ok(false)` vs
/// `Err`), so callers can tell "wrong code" from "infrastructure down".
use crate::error::Result;
use async_trait::async_trait;
use rand::Rng;
use redis::aio::ConnectionManager;
use std::sync::Arc;
use std::time::Duration;

/// Default time-to-live for issued codes.
pub const DEFAULT_OTP_TTL: Duration = Duration::from_secs(300);

const OTP_LENGTH: usize = 6;

const OTP_KEY_PREFIX: &str = "auth:otp:";

/// Key-value contract consumed by the OTP manager.
#[async_trait]
pub trait OtpStore: Send + Sync {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Redis-backed store (SETEX/GET/DEL).
///
/// SETEX replaces any existing value atomically, which is what guarantees
/// at most one live code per email under concurrent issuance.
#[derive(Clone)]
pub struct RedisOtpStore {
    conn: ConnectionManager,
}

impl RedisOtpStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl OtpStore for RedisOtpStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("SETEX")
            .arg(key)
            .arg(ttl.as_secs())
            .arg(value)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("DEL")
            .arg(key)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}

/// Issues and validates one-time codes against an [`OtpStore`].
#[derive(Clone)]
pub struct OtpService {
    store: Arc<dyn OtpStore>,
    ttl: Duration,
}

impl OtpService {
    pub fn new(store: Arc<dyn OtpStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Generate and store a fresh code for `email`, replacing any code
    /// already pending for it.
    pub async fn issue_code(&self, email: &str) -> Result<String> {
        let code = generate_code();
        self.store.set(&otp_key(email), &code, self.ttl).await?;
        Ok(code)
    }

    /// Check `candidate` against the pending code for `email`.
    ///
    /// Returns `Ok(true)` and deletes the code on a match (single use).
    /// Returns `Ok(false)` on a mismatch — leaving the stored code intact —
    /// or when no code is pending (never issued, already consumed, or
    /// evicted on expiry). Store failures surface as errors.
    pub async fn validate_code(&self, email: &str, candidate: &str) -> Result<bool> {
        let Some(candidate) = normalize_candidate(candidate) else {
            return Ok(false);
        };

        let key = otp_key(email);
        match self.store.get(&key).await? {
            Some(stored) if stored == candidate => {
                self.store.delete(&key).await?;
                Ok(true)
            }
            Some(_) | None => Ok(false),
        }
    }
}

fn otp_key(email: &str) -> String {
    format!("{OTP_KEY_PREFIX}{}", email.to_lowercase())
}

/// Uniformly random code in `000000..=999999`.
fn generate_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

/// Zero-pad an all-digit candidate to the code length; anything else can
/// never match a stored code.
fn normalize_candidate(candidate: &str) -> Option<String> {
    if candidate.is_empty()
        || candidate.len() > OTP_LENGTH
        || !candidate.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }
    Some(format!("{:0>width$}", candidate, width = OTP_LENGTH))
}
