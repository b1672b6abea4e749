//! Row storage behind the resource services.
//!
//! Stores work on JSON rows described by a [`TableSchema`] and enforce its keys, references,
//! uniqueness groups and cascading deletes. Constraint violations come back as
//! `AppError::Validation` so callers see them exactly like a rejected payload.

use async_trait::async_trait;

use crate::schema::{RecordKey, Row, TableSchema};
use crate::shared::AppError;

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Trait for row storage operations
#[async_trait]
pub trait Store {
    /// All rows of a table in creation order
    async fn list_rows(&self, table: &'static TableSchema) -> Result<Vec<Row>, AppError>;
    async fn get_row(
        &self,
        table: &'static TableSchema,
        key: RecordKey,
    ) -> Result<Option<Row>, AppError>;
    /// Inserts a complete row, key included
    async fn insert_row(&self, table: &'static TableSchema, row: Row) -> Result<Row, AppError>;
    /// Replaces the row stored under `key`
    async fn update_row(
        &self,
        table: &'static TableSchema,
        key: RecordKey,
        row: Row,
    ) -> Result<Row, AppError>;
    /// Deletes the row and everything that references it
    async fn delete_row(&self, table: &'static TableSchema, key: RecordKey)
        -> Result<(), AppError>;
}
