use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::types::{TokenClaims, TokenType};
use crate::config::AppConfig;
use crate::shared::AppError;

/// Configuration for JWT token operations
#[derive(Clone)]
pub struct TokenConfig {
    secret: String,
    pub access_lifetime: Duration,
    pub refresh_lifetime: Duration,
}

impl TokenConfig {
    /// Lifetimes too large for chrono saturate; `create_token` then refuses to sign
    pub fn new(secret: String, access_minutes: i64, refresh_days: i64) -> Self {
        Self {
            secret,
            access_lifetime: Duration::try_minutes(access_minutes)
                .unwrap_or_else(Duration::max_value),
            refresh_lifetime: Duration::try_days(refresh_days).unwrap_or_else(Duration::max_value),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.jwt_secret.clone(),
            config.access_token_minutes,
            config.refresh_token_days,
        )
    }

    /// Creates a signed token of the given type for an account
    #[instrument(skip(self, username))]
    pub fn create_token(
        &self,
        user_id: i64,
        username: &str,
        token_type: TokenType,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let lifetime = match token_type {
            TokenType::Access => self.access_lifetime,
            TokenType::Refresh => self.refresh_lifetime,
        };
        let expires_at = now.checked_add_signed(lifetime).ok_or_else(|| {
            debug!("Token lifetime overflows the calendar");
            AppError::Internal
        })?;
        let exp = expires_at.timestamp().max(0) as usize;

        debug!(exp_timestamp = exp, "Creating JWT token with expiration");

        let claims = TokenClaims {
            user_id,
            username: username.to_string(),
            token_type,
            jti: Uuid::new_v4().to_string(),
            exp,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| {
            debug!(error = %e, "Failed to encode JWT token");
            AppError::Internal
        })
    }

    /// Validates signature, expiry and token type, returning the claims if valid
    #[instrument(skip(self, token))]
    pub fn validate_token(
        &self,
        token: &str,
        expected: TokenType,
    ) -> Result<TokenClaims, AppError> {
        debug!("Decoding and validating JWT token");

        let claims = decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            debug!(error = %e, "Failed to decode JWT token");
            AppError::Unauthorized("Token is invalid or expired".to_string())
        })?;

        if claims.token_type != expected {
            debug!(token_type = ?claims.token_type, "JWT token has the wrong type");
            return Err(AppError::Unauthorized(
                "Token has wrong type".to_string(),
            ));
        }

        debug!(
            user_id = claims.user_id,
            exp = claims.exp,
            "JWT token decoded successfully"
        );
        Ok(claims)
    }
}
