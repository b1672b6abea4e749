use chrono::Utc;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::auth::TokenClaims;
use crate::models::{Message, Resource};
use crate::schema::{KeyKind, RecordKey, Row, TableSchema, WriteMode};
use crate::shared::AppError;
use crate::store::Store;

/// CRUD operations for one resource type over the shared store
pub struct ResourceService<R: Resource> {
    store: Arc<dyn Store + Send + Sync>,
    _resource: PhantomData<R>,
}

impl<R: Resource> ResourceService<R> {
    pub fn new(store: Arc<dyn Store + Send + Sync>) -> Self {
        Self {
            store,
            _resource: PhantomData,
        }
    }

    fn schema() -> &'static TableSchema {
        R::SCHEMA
    }

    fn not_found() -> AppError {
        AppError::NotFound(format!("No {} matches the given query.", Self::schema().label))
    }

    /// Ids that can't name a record are reported the same way as ids that name nothing
    fn parse_key(raw_id: &str) -> Result<RecordKey, AppError> {
        Self::schema().parse_key(raw_id).ok_or_else(|| {
            debug!(id = %raw_id, "Unparseable id");
            Self::not_found()
        })
    }

    fn to_record(row: Row) -> Result<R, AppError> {
        R::from_row(row).map_err(|e| {
            warn!(error = %e, table = Self::schema().name, "Stored row does not match its type");
            AppError::Internal
        })
    }

    #[instrument(skip(self), fields(table = Self::schema().name))]
    pub async fn list(&self) -> Result<Vec<R>, AppError> {
        let rows = self.store.list_rows(Self::schema()).await?;
        debug!(count = rows.len(), "Listed records");
        rows.into_iter().map(Self::to_record).collect()
    }

    #[instrument(skip(self), fields(table = Self::schema().name))]
    pub async fn get(&self, raw_id: &str) -> Result<R, AppError> {
        let key = Self::parse_key(raw_id)?;
        let row = self
            .store
            .get_row(Self::schema(), key)
            .await?
            .ok_or_else(Self::not_found)?;
        Self::to_record(row)
    }

    /// Validates the payload, assigns the key and timestamps, and stores the new record.
    /// Account-keyed records take the caller's account id.
    #[instrument(skip(self, caller, payload), fields(table = Self::schema().name, account_id = caller.user_id))]
    pub async fn create(&self, caller: &TokenClaims, payload: &Value) -> Result<R, AppError> {
        let schema = Self::schema();
        let mut row = schema.validate(payload, WriteMode::Create)?;

        let key = match schema.key {
            KeyKind::Account => RecordKey::Account(caller.user_id),
            KeyKind::Uuid => RecordKey::Uuid(Uuid::new_v4()),
        };
        row.insert("id".to_string(), key.to_value());
        schema.stamp_created(&mut row, Utc::now());

        let stored = self.store.insert_row(schema, row).await?;
        let record = Self::to_record(stored)?;
        info!(id = %key, summary = record.summary().as_deref(), "Record created");
        Ok(record)
    }

    /// Full (PUT) or partial (PATCH) update of an existing record
    #[instrument(skip(self, payload), fields(table = Self::schema().name))]
    pub async fn update(&self, raw_id: &str, payload: &Value, partial: bool) -> Result<R, AppError> {
        let schema = Self::schema();
        let key = Self::parse_key(raw_id)?;
        let mut row = self
            .store
            .get_row(schema, key)
            .await?
            .ok_or_else(Self::not_found)?;

        let mode = if partial {
            WriteMode::Patch
        } else {
            WriteMode::Replace
        };
        let changes = schema.validate(payload, mode)?;
        debug!(id = %key, changed = changes.len(), "Applying update");

        row.extend(changes);
        schema.stamp_updated(&mut row, Utc::now());

        let stored = self.store.update_row(schema, key, row).await?;
        info!(id = %key, "Record updated");
        Self::to_record(stored)
    }

    #[instrument(skip(self), fields(table = Self::schema().name))]
    pub async fn delete(&self, raw_id: &str) -> Result<(), AppError> {
        let key = Self::parse_key(raw_id)?;
        self.store.delete_row(Self::schema(), key).await?;
        info!(id = %key, "Record deleted");
        Ok(())
    }
}

impl ResourceService<Message> {
    /// Marks a message read. Only its receiver may do this.
    #[instrument(skip(self, caller), fields(account_id = caller.user_id))]
    pub async fn mark_read(&self, caller: &TokenClaims, raw_id: &str) -> Result<Message, AppError> {
        let schema = Self::schema();
        let key = Self::parse_key(raw_id)?;
        let mut row = self
            .store
            .get_row(schema, key)
            .await?
            .ok_or_else(Self::not_found)?;

        if !Self::to_record(row.clone())?.is_addressed_to(caller.user_id) {
            warn!(id = %key, "Read receipt attempted by someone other than the receiver");
            return Err(AppError::Forbidden(
                "You do not have permission to perform this action.".to_string(),
            ));
        }

        row.insert("read".to_string(), Value::Bool(true));
        let stored = self.store.update_row(schema, key, row).await?;
        info!(id = %key, "Message marked read");
        Self::to_record(stored)
    }
}
