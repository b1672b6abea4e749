use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::Store;
use crate::models::TABLES;
use crate::schema::{missing_reference_error, FieldErrors, RecordKey, Row, TableSchema};
use crate::shared::AppError;

/// In-memory implementation of Store for development and testing
///
/// Every table lives behind one lock, so constraint checks and cascades are atomic with the
/// write they guard. Data is lost when the application restarts.
pub struct InMemoryStore {
    tables: &'static [&'static TableSchema],
    rows: RwLock<HashMap<&'static str, Vec<Row>>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates an empty store for the resource tables
    pub fn new() -> Self {
        Self::with_tables(TABLES)
    }

    /// Creates an empty store for the given tables, parents first
    pub fn with_tables(tables: &'static [&'static TableSchema]) -> Self {
        let rows = tables.iter().map(|t| (t.name, Vec::new())).collect();
        Self {
            tables,
            rows: RwLock::new(rows),
        }
    }

    /// Returns the current number of rows in a table
    pub async fn row_count(&self, table: &str) -> usize {
        self.rows.read().await.get(table).map_or(0, Vec::len)
    }

    fn rows_of<'a>(
        rows: &'a HashMap<&'static str, Vec<Row>>,
        table: &TableSchema,
    ) -> Result<&'a Vec<Row>, AppError> {
        rows.get(table.name).ok_or_else(|| {
            warn!(table = table.name, "Table is not registered in memory");
            AppError::DatabaseError(format!("relation \"{}\" does not exist", table.name))
        })
    }

    fn position(rows: &[Row], key: &Value) -> Option<usize> {
        rows.iter().position(|r| r.get("id") == Some(key))
    }

    /// Rejects a row whose references point at missing rows or whose unique groups collide
    fn check_constraints(
        rows: &HashMap<&'static str, Vec<Row>>,
        table: &TableSchema,
        row: &Row,
        key: &Value,
    ) -> Result<(), AppError> {
        let mut errors = FieldErrors::default();

        for (field, target, _) in table.references() {
            let value = match row.get(field.name) {
                Some(Value::Null) | None => continue,
                Some(value) => value,
            };
            let exists = rows
                .get(target)
                .is_some_and(|target_rows| Self::position(target_rows, value).is_some());
            if !exists {
                errors.extend(missing_reference_error(field.name, Some(value)));
            }
        }
        errors.into_result()?;

        let table_rows = Self::rows_of(rows, table)?;
        for group in table.unique_together {
            let collides = table_rows.iter().any(|other| {
                other.get("id") != Some(key)
                    && group.iter().all(|column| other.get(*column) == row.get(*column))
            });
            if collides {
                return Err(AppError::Validation(table.unique_together_error(group)));
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Store for InMemoryStore {
    #[instrument(skip(self, table), fields(table = table.name))]
    async fn list_rows(&self, table: &'static TableSchema) -> Result<Vec<Row>, AppError> {
        debug!("Listing rows in memory");

        let rows = self.rows.read().await;
        Ok(Self::rows_of(&rows, table)?.clone())
    }

    #[instrument(skip(self, table), fields(table = table.name))]
    async fn get_row(
        &self,
        table: &'static TableSchema,
        key: RecordKey,
    ) -> Result<Option<Row>, AppError> {
        debug!(id = %key, "Fetching row from memory");

        let rows = self.rows.read().await;
        let table_rows = Self::rows_of(&rows, table)?;
        let row = Self::position(table_rows, &key.to_value()).map(|i| table_rows[i].clone());

        if row.is_none() {
            debug!(id = %key, "Row not found in memory");
        }
        Ok(row)
    }

    #[instrument(skip(self, table, row), fields(table = table.name))]
    async fn insert_row(&self, table: &'static TableSchema, row: Row) -> Result<Row, AppError> {
        let key = table
            .key_of(&row)
            .ok_or_else(|| AppError::DatabaseError("row has no primary key".to_string()))?
            .to_value();
        debug!(id = %key, "Inserting row in memory");

        let mut rows = self.rows.write().await;
        if Self::position(Self::rows_of(&rows, table)?, &key).is_some() {
            warn!(id = %key, "Row already exists in memory");
            return Err(AppError::Validation(table.duplicate_key_error()));
        }
        Self::check_constraints(&rows, table, &row, &key)?;

        if let Some(table_rows) = rows.get_mut(table.name) {
            table_rows.push(row.clone());
        }

        debug!(id = %key, "Row inserted successfully in memory");
        Ok(row)
    }

    #[instrument(skip(self, table, row), fields(table = table.name))]
    async fn update_row(
        &self,
        table: &'static TableSchema,
        key: RecordKey,
        mut row: Row,
    ) -> Result<Row, AppError> {
        let key = key.to_value();
        debug!(id = %key, "Updating row in memory");
        row.insert("id".to_string(), key.clone());

        let mut rows = self.rows.write().await;
        let index = Self::position(Self::rows_of(&rows, table)?, &key).ok_or_else(|| {
            warn!(id = %key, "Row not found for update in memory");
            AppError::NotFound(format!("No {} matches the given query.", table.label))
        })?;
        Self::check_constraints(&rows, table, &row, &key)?;

        if let Some(table_rows) = rows.get_mut(table.name) {
            table_rows[index] = row.clone();
        }

        debug!(id = %key, "Row updated successfully in memory");
        Ok(row)
    }

    #[instrument(skip(self, table), fields(table = table.name))]
    async fn delete_row(
        &self,
        table: &'static TableSchema,
        key: RecordKey,
    ) -> Result<(), AppError> {
        debug!(id = %key, "Deleting row from memory");

        let mut rows = self.rows.write().await;
        let key = key.to_value();
        if Self::position(Self::rows_of(&rows, table)?, &key).is_none() {
            warn!(id = %key, "Row not found for deletion in memory");
            return Err(AppError::NotFound(format!(
                "No {} matches the given query.",
                table.label
            )));
        }

        let mut pending: Vec<(&'static str, Value)> = vec![(table.name, key)];
        let mut removed = 0usize;

        while let Some((table_name, key)) = pending.pop() {
            if let Some(table_rows) = rows.get_mut(table_name) {
                let before = table_rows.len();
                table_rows.retain(|r| r.get("id") != Some(&key));
                removed += before - table_rows.len();
            }

            for child in self.tables {
                for (field, target, _) in child.references() {
                    if target != table_name {
                        continue;
                    }
                    if let Some(child_rows) = rows.get(child.name) {
                        pending.extend(
                            child_rows
                                .iter()
                                .filter(|r| r.get(field.name) == Some(&key))
                                .filter_map(|r| r.get("id").cloned())
                                .map(|id| (child.name, id)),
                        );
                    }
                }
            }
        }

        debug!(rows_removed = removed, "Row deleted with cascade from memory");
        Ok(())
    }
}
