//! Configuration management for the auth service
//!
//! Everything is read from environment variables (with a `.env` fallback in
//! debug builds). Each component receives its settings struct at
//! construction time rather than reading ambient global state, so units can
//! be tested with fabricated secrets and credentials.

use anyhow::{Context, Result};
use std::env;
use tracing::info;

/// Application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub client: ClientSettings,
    pub database: DatabaseSettings,
    pub redis: RedisSettings,
    pub jwt: JwtSettings,
    pub hasher: HasherSettings,
    pub email: EmailSettings,
    pub oauth: OAuthSettings,
}

impl Settings {
    /// Load settings from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file in development
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
            info!("Loaded .env file for development");
        }

        Ok(Settings {
            server: ServerSettings::from_env()?,
            client: ClientSettings::from_env(),
            database: DatabaseSettings::from_env()?,
            redis: RedisSettings::from_env()?,
            jwt: JwtSettings::from_env()?,
            hasher: HasherSettings::from_env()?,
            email: EmailSettings::from_env()?,
            oauth: OAuthSettings::from_env(),
        })
    }
}

/// Deployment mode; drives OAuth redirect-URL construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Development,
    Staging,
    Production,
}

impl Mode {
    fn from_env() -> Result<Self> {
        match env::var("APP_MODE")
            .unwrap_or_else(|_| "development".to_string())
            .as_str()
        {
            "development" => Ok(Mode::Development),
            "staging" => Ok(Mode::Staging),
            "production" => Ok(Mode::Production),
            other => anyhow::bail!("Invalid APP_MODE: {other}"),
        }
    }

    /// Whether the service is reachable at a public base URL.
    pub fn is_public(&self) -> bool {
        matches!(self, Mode::Staging | Mode::Production)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub mode: Mode,
}

impl ServerSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid SERVER_PORT")?,
            mode: Mode::from_env()?,
        })
    }
}

/// Frontend client the OAuth callbacks redirect back to
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Public base URL (staging/production)
    pub url: String,
    /// Loopback port (development)
    pub port: String,
}

impl ClientSettings {
    fn from_env() -> Self {
        Self {
            url: env::var("CLIENT_URL").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            port: env::var("CLIENT_PORT").unwrap_or_else(|_| "3000".to_string()),
        }
    }
}

/// Database connection settings
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: u64,
}

impl DatabaseSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,
            acquire_timeout: env::var("DATABASE_ACQUIRE_TIMEOUT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_ACQUIRE_TIMEOUT")?,
        })
    }
}

/// OTP backing store settings
#[derive(Debug, Clone)]
pub struct RedisSettings {
    pub url: String,
}

impl RedisSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("REDIS_URL").context("REDIS_URL must be set")?,
        })
    }
}

/// Session-token settings
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub expiry_hours: i64,
}

impl JwtSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .context("Invalid JWT_EXPIRY_HOURS")?,
        })
    }
}

/// Argon2id cost parameters
///
/// Defaults follow the OWASP recommendation (19 MiB, t=2, p=1); all three
/// knobs are tunable so deployments can raise the work factor without a
/// code change.
#[derive(Debug, Clone)]
pub struct HasherSettings {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl HasherSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            memory_kib: env::var("ARGON2_MEMORY_KIB")
                .unwrap_or_else(|_| "19456".to_string())
                .parse()
                .context("Invalid ARGON2_MEMORY_KIB")?,
            iterations: env::var("ARGON2_ITERATIONS")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("Invalid ARGON2_ITERATIONS")?,
            parallelism: env::var("ARGON2_PARALLELISM")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .context("Invalid ARGON2_PARALLELISM")?,
        })
    }
}

/// SMTP configuration
#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: String,
    pub use_starttls: bool,
}

impl EmailSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            smtp_host: env::var("SMTP_HOST").unwrap_or_default(),
            smtp_port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()
                .context("Invalid SMTP_PORT")?,
            smtp_username: env::var("SMTP_USERNAME").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
            smtp_from: env::var("SMTP_FROM").unwrap_or_else(|_| "noreply@refina.dev".to_string()),
            use_starttls: env::var("SMTP_USE_STARTTLS")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
        })
    }
}

/// Client id/secret pair for one OAuth provider
#[derive(Debug, Clone, Default)]
pub struct ProviderCredentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl ProviderCredentials {
    fn from_env(prefix: &str) -> Self {
        Self {
            client_id: env::var(format!("OAUTH_{prefix}_CLIENT_ID")).ok(),
            client_secret: env::var(format!("OAUTH_{prefix}_CLIENT_SECRET")).ok(),
        }
    }

    /// Whether both halves of the credential are present.
    pub fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }
}

/// OAuth provider configuration (Google, GitHub, Microsoft)
#[derive(Debug, Clone, Default)]
pub struct OAuthSettings {
    pub google: ProviderCredentials,
    pub github: ProviderCredentials,
    pub microsoft: ProviderCredentials,
}

impl OAuthSettings {
    fn from_env() -> Self {
        Self {
            google: ProviderCredentials::from_env("GOOGLE"),
            github: ProviderCredentials::from_env("GITHUB"),
            microsoft: ProviderCredentials::from_env("MICROSOFT"),
        }
    }
}
