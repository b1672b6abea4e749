use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{info, instrument, warn};

use super::{
    password::{hash_password_blocking, verify_password_blocking},
    repository::{username_taken, AccountRepository},
    token::TokenConfig,
    types::{
        AccessTokenResponse, AccountResponse, RefreshRequest, RegisterRequest, TokenPairResponse,
        TokenRequest, TokenType,
    },
};
use crate::schema::FieldErrors;
use crate::shared::AppError;

const USERNAME_MAX_LEN: usize = 150;
const PASSWORD_MIN_LEN: usize = 8;

const BAD_CREDENTIALS: &str = "No active account found with the given credentials";
const BAD_TOKEN: &str = "Token is invalid or expired";

fn username_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern is valid"))
}

/// Pulls a non-blank string out of an optional request field, recording an error if absent
fn required<'a>(errors: &mut FieldErrors, field: &str, value: &'a Option<String>) -> Option<&'a str> {
    match value.as_deref() {
        None => {
            errors.add(field, "This field is required.");
            None
        }
        Some(v) if v.trim().is_empty() => {
            errors.add(field, "This field may not be blank.");
            None
        }
        Some(v) => Some(v),
    }
}

/// Service for account registration and token issuance
pub struct AuthService {
    repository: Arc<dyn AccountRepository + Send + Sync>,
    token_config: TokenConfig,
}

impl AuthService {
    pub fn new(
        repository: Arc<dyn AccountRepository + Send + Sync>,
        token_config: TokenConfig,
    ) -> Self {
        Self {
            repository,
            token_config,
        }
    }

    /// Creates an account after checking username shape, password length and uniqueness
    #[instrument(skip(self, request))]
    pub async fn register(&self, request: RegisterRequest) -> Result<AccountResponse, AppError> {
        let mut errors = FieldErrors::default();

        let username = required(&mut errors, "username", &request.username).map(str::trim);
        if let Some(username) = username {
            if username.chars().count() > USERNAME_MAX_LEN {
                errors.add(
                    "username",
                    format!(
                        "Ensure this field has no more than {} characters.",
                        USERNAME_MAX_LEN
                    ),
                );
            } else if !username_pattern().is_match(username) {
                errors.add(
                    "username",
                    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
                );
            }
        }

        let password = required(&mut errors, "password", &request.password);
        if let Some(password) = password {
            if password.chars().count() < PASSWORD_MIN_LEN {
                errors.add(
                    "password",
                    format!(
                        "This password is too short. It must contain at least {} characters.",
                        PASSWORD_MIN_LEN
                    ),
                );
            }
        }

        let (Some(username), Some(password)) = (username, password) else {
            return Err(AppError::Validation(errors));
        };
        errors.into_result()?;

        if self.repository.get_by_username(username).await?.is_some() {
            warn!(username = %username, "Registration rejected, username taken");
            return Err(username_taken());
        }

        // A concurrent registration can still win the name; the repository reports that as taken too
        let password_hash = hash_password_blocking(password.to_string()).await?;
        let account = self
            .repository
            .create_account(username, &password_hash)
            .await?;

        info!(account_id = account.id, "Account registered");
        Ok(AccountResponse {
            id: account.id,
            username: account.username,
        })
    }

    /// Exchanges credentials for an access/refresh token pair
    #[instrument(skip(self, request))]
    pub async fn obtain_token(&self, request: TokenRequest) -> Result<TokenPairResponse, AppError> {
        let mut errors = FieldErrors::default();
        // Trimmed the same way as at registration
        let username = required(&mut errors, "username", &request.username).map(str::trim);
        let password = required(&mut errors, "password", &request.password);
        let (Some(username), Some(password)) = (username, password) else {
            return Err(AppError::Validation(errors));
        };

        let account = match self.repository.get_by_username(username).await? {
            Some(account)
                if verify_password_blocking(
                    account.password_hash.clone(),
                    password.to_string(),
                )
                .await? =>
            {
                account
            }
            _ => {
                warn!(username = %username, "Token request with bad credentials");
                return Err(AppError::Unauthorized(BAD_CREDENTIALS.to_string()));
            }
        };

        let access = self
            .token_config
            .create_token(account.id, &account.username, TokenType::Access)?;
        let refresh = self
            .token_config
            .create_token(account.id, &account.username, TokenType::Refresh)?;

        info!(account_id = account.id, "Token pair issued");
        Ok(TokenPairResponse { access, refresh })
    }

    /// Issues a fresh access token for a valid refresh token
    #[instrument(skip(self, request))]
    pub async fn refresh_token(
        &self,
        request: RefreshRequest,
    ) -> Result<AccessTokenResponse, AppError> {
        let mut errors = FieldErrors::default();
        let Some(refresh) = required(&mut errors, "refresh", &request.refresh) else {
            return Err(AppError::Validation(errors));
        };

        let claims = self
            .token_config
            .validate_token(refresh, TokenType::Refresh)
            .map_err(|_| AppError::Unauthorized(BAD_TOKEN.to_string()))?;

        if self.repository.get_account(claims.user_id).await?.is_none() {
            warn!(account_id = claims.user_id, "Refresh token for unknown account");
            return Err(AppError::Unauthorized(BAD_TOKEN.to_string()));
        }

        let access = self
            .token_config
            .create_token(claims.user_id, &claims.username, TokenType::Access)?;

        info!(account_id = claims.user_id, "Access token refreshed");
        Ok(AccessTokenResponse { access })
    }
}
