use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::auth::{repository::AccountRepository, TokenConfig};
use crate::schema::FieldErrors;
use crate::store::Store;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store + Send + Sync>,
    pub account_repository: Arc<dyn AccountRepository + Send + Sync>,
    pub token_config: TokenConfig,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store + Send + Sync>,
        account_repository: Arc<dyn AccountRepository + Send + Sync>,
        token_config: TokenConfig,
    ) -> Self {
        Self {
            store,
            account_repository,
            token_config,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    /// Shorthand for a single error that is not tied to one field
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::Validation(FieldErrors::non_field(message))
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::invalid(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Validation failed",
                    "fields": errors,
                }),
            ),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": format!("Database error: {}", msg) }),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal server error" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::auth::{repository::InMemoryAccountRepository, TokenClaims, TokenType};
    use crate::store::InMemoryStore;

    /// Builder for creating AppState with overrides for testing
    pub struct AppStateBuilder {
        store: Option<Arc<dyn Store + Send + Sync>>,
        account_repository: Option<Arc<dyn AccountRepository + Send + Sync>>,
    }

    impl AppStateBuilder {
        pub fn new() -> Self {
            Self {
                store: None,
                account_repository: None,
            }
        }

        pub fn with_store(mut self, store: Arc<dyn Store + Send + Sync>) -> Self {
            self.store = Some(store);
            self
        }

        pub fn with_account_repository(
            mut self,
            repo: Arc<dyn AccountRepository + Send + Sync>,
        ) -> Self {
            self.account_repository = Some(repo);
            self
        }

        pub fn build(self) -> AppState {
            AppState {
                store: self
                    .store
                    .unwrap_or_else(|| Arc::new(InMemoryStore::new())),
                account_repository: self
                    .account_repository
                    .unwrap_or_else(|| Arc::new(InMemoryAccountRepository::new())),
                token_config: TokenConfig::new("test-secret".to_string(), 5, 1),
            }
        }
    }

    impl Default for AppStateBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    /// Claims for a caller that never went through the token endpoint
    pub fn caller(user_id: i64) -> TokenClaims {
        TokenClaims {
            user_id,
            username: format!("user-{}", user_id),
            token_type: TokenType::Access,
            jti: "test".to_string(),
            exp: usize::MAX,
            iat: 0,
        }
    }
}
