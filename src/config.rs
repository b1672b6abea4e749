use chrono::{Duration, Utc};
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACCESS_MINUTES: i64 = 5;
const DEFAULT_REFRESH_DAYS: i64 = 1;

/// Signing key used when JWT_SECRET is unset. Never use it outside development.
pub const DEVELOPMENT_JWT_SECRET: &str = "blitz-development-secret";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be a positive integer in range, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("{name} may not be empty")]
    Empty { name: &'static str },
}

/// Runtime settings read from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Postgres URL. In-memory stores are used when unset.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source, so tests don't touch the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) if secret.is_empty() => {
                return Err(ConfigError::Empty { name: "JWT_SECRET" })
            }
            Some(secret) => secret,
            None => DEVELOPMENT_JWT_SECRET.to_string(),
        };

        let access_token_minutes =
            positive(&lookup, "ACCESS_TOKEN_MINUTES", DEFAULT_ACCESS_MINUTES)?;
        token_lifetime(
            "ACCESS_TOKEN_MINUTES",
            access_token_minutes,
            Duration::try_minutes,
        )?;
        let refresh_token_days = positive(&lookup, "REFRESH_TOKEN_DAYS", DEFAULT_REFRESH_DAYS)?;
        token_lifetime("REFRESH_TOKEN_DAYS", refresh_token_days, Duration::try_days)?;

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            database_max_connections: positive(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_MAX_CONNECTIONS,
            )?,
            jwt_secret,
            access_token_minutes,
            refresh_token_days,
        })
    }

    pub fn uses_development_secret(&self) -> bool {
        self.jwt_secret == DEVELOPMENT_JWT_SECRET
    }
}

/// A token issued now must still have a representable expiry
fn token_lifetime(
    name: &'static str,
    value: i64,
    to_duration: fn(i64) -> Option<Duration>,
) -> Result<(), ConfigError> {
    to_duration(value)
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
        .map(|_| ())
        .ok_or_else(|| ConfigError::InvalidNumber {
            name,
            value: value.to_string(),
        })
}

fn positive<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) if value > T::default() => Ok(value),
            _ => Err(ConfigError::InvalidNumber { name, value: raw }),
        },
    }
}
