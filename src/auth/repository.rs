use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::models::AccountModel;
use crate::schema::FieldErrors;
use crate::shared::AppError;

/// Reported whether the duplicate is caught before the write or by the store itself
pub fn username_taken() -> AppError {
    AppError::Validation(FieldErrors::single(
        "username",
        "A user with that username already exists.",
    ))
}

/// Trait for account repository operations
#[async_trait]
pub trait AccountRepository {
    /// Stores a new account and returns it with its assigned id
    async fn create_account(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<AccountModel, AppError>;
    async fn get_by_username(&self, username: &str) -> Result<Option<AccountModel>, AppError>;
    async fn get_account(&self, id: i64) -> Result<Option<AccountModel>, AppError>;
}

/// In-memory implementation of AccountRepository for development and testing
///
/// Data is lost when the application restarts. Ids count up from 1 like a serial column.
pub struct InMemoryAccountRepository {
    accounts: RwLock<HashMap<i64, AccountModel>>,
}

impl Default for InMemoryAccountRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
        }
    }

    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    #[instrument(skip(self, password_hash))]
    async fn create_account(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<AccountModel, AppError> {
        debug!(username = %username, "Creating account in memory");

        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.username == username) {
            warn!(username = %username, "Account already exists in memory");
            return Err(username_taken());
        }

        let id = accounts.keys().max().copied().unwrap_or(0) + 1;
        let account = AccountModel {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        accounts.insert(id, account.clone());

        debug!(account_id = id, "Account created successfully in memory");
        Ok(account)
    }

    #[instrument(skip(self))]
    async fn get_by_username(&self, username: &str) -> Result<Option<AccountModel>, AppError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| a.username == username).cloned())
    }

    #[instrument(skip(self))]
    async fn get_account(&self, id: i64) -> Result<Option<AccountModel>, AppError> {
        Ok(self.accounts.read().await.get(&id).cloned())
    }
}

/// PostgreSQL implementation of account repository
pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the accounts table. Must run before any account-keyed table is created.
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS accounts (
    id BIGSERIAL PRIMARY KEY,
    username VARCHAR(150) NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create accounts table");
            AppError::DatabaseError(e.to_string())
        })?;

        info!("Table ready: accounts");
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    #[instrument(skip(self, password_hash))]
    async fn create_account(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<AccountModel, AppError> {
        debug!(username = %username, "Creating account in database");

        let account = sqlx::query_as::<_, AccountModel>(
            "INSERT INTO accounts (username, password_hash) VALUES ($1, $2) \
             RETURNING id, username, password_hash, created_at",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
                warn!(username = %username, "Account already exists in database");
                username_taken()
            }
            _ => {
                warn!(error = %e, "Failed to create account in database");
                AppError::DatabaseError(e.to_string())
            }
        })?;

        debug!(account_id = account.id, "Account created successfully in database");
        Ok(account)
    }

    #[instrument(skip(self))]
    async fn get_by_username(&self, username: &str) -> Result<Option<AccountModel>, AppError> {
        sqlx::query_as::<_, AccountModel>(
            "SELECT id, username, password_hash, created_at FROM accounts WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to fetch account from database");
            AppError::DatabaseError(e.to_string())
        })
    }

    #[instrument(skip(self))]
    async fn get_account(&self, id: i64) -> Result<Option<AccountModel>, AppError> {
        sqlx::query_as::<_, AccountModel>(
            "SELECT id, username, password_hash, created_at FROM accounts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, account_id = id, "Failed to fetch account from database");
            AppError::DatabaseError(e.to_string())
        })
    }
}
