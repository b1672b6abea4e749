use async_trait::async_trait;
use sqlx::{postgres::PgArguments, query::QueryScalar, types::Json, PgPool, Postgres};
use tracing::{debug, info, instrument, warn};

use super::Store;
use crate::schema::{FieldKind, RecordKey, Row, TableSchema};
use crate::shared::AppError;

type RowQuery<'q> = QueryScalar<'q, Postgres, Json<Row>, PgArguments>;

/// PostgreSQL implementation of Store
///
/// Rows cross the wire as JSONB: writes go through `jsonb_populate_record` and reads come back
/// through `to_jsonb`, so one set of queries serves every table in the schema registry.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates any missing tables, parents first
    #[instrument(skip(self, tables))]
    pub async fn migrate(&self, tables: &[&TableSchema]) -> Result<(), AppError> {
        for table in tables {
            sqlx::query(&table.create_table_sql())
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    warn!(error = %e, table = table.name, "Failed to create table");
                    AppError::DatabaseError(e.to_string())
                })?;
            info!(table = table.name, "Table ready");
        }
        Ok(())
    }
}

fn bind_key(query: RowQuery<'_>, key: RecordKey) -> RowQuery<'_> {
    match key {
        RecordKey::Account(id) => query.bind(id),
        RecordKey::Uuid(id) => query.bind(id),
    }
}

/// Maps constraint violations back to validation errors, everything else to a database error
fn write_error(table: &TableSchema, row: &Row, error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_error) = &error {
        let is_constraint = db_error.is_unique_violation()
            || db_error.is_foreign_key_violation()
            || db_error.is_check_violation();
        if let (true, Some(constraint)) = (is_constraint, db_error.constraint()) {
            debug!(table = table.name, constraint, "Write rejected by constraint");
            return AppError::Validation(table.constraint_errors(constraint, row));
        }
    }

    warn!(error = %error, table = table.name, "Failed to write row to database");
    AppError::DatabaseError(error.to_string())
}

fn read_error(table: &TableSchema, error: sqlx::Error) -> AppError {
    warn!(error = %error, table = table.name, "Failed to read rows from database");
    AppError::DatabaseError(error.to_string())
}

fn not_found(table: &TableSchema) -> AppError {
    AppError::NotFound(format!("No {} matches the given query.", table.label))
}

#[async_trait]
impl Store for PostgresStore {
    #[instrument(skip(self, table), fields(table = table.name))]
    async fn list_rows(&self, table: &'static TableSchema) -> Result<Vec<Row>, AppError> {
        debug!("Listing rows from database");

        let sql = format!(
            "SELECT to_jsonb(t.*) FROM {} AS t ORDER BY t.created_at, t.id",
            table.name
        );
        let rows = sqlx::query_scalar::<_, Json<Row>>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| read_error(table, e))?;

        Ok(rows.into_iter().map(|Json(row)| row).collect())
    }

    #[instrument(skip(self, table), fields(table = table.name))]
    async fn get_row(
        &self,
        table: &'static TableSchema,
        key: RecordKey,
    ) -> Result<Option<Row>, AppError> {
        debug!(id = %key, "Fetching row from database");

        let sql = format!("SELECT to_jsonb(t.*) FROM {} AS t WHERE t.id = $1", table.name);
        let row = bind_key(sqlx::query_scalar(&sql), key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| read_error(table, e))?;

        if row.is_none() {
            debug!(id = %key, "Row not found in database");
        }
        Ok(row.map(|Json(row)| row))
    }

    #[instrument(skip(self, table, row), fields(table = table.name))]
    async fn insert_row(&self, table: &'static TableSchema, row: Row) -> Result<Row, AppError> {
        debug!("Inserting row in database");

        let sql = format!(
            "INSERT INTO {table} AS t SELECT * FROM jsonb_populate_record(NULL::{table}, $1) \
             RETURNING to_jsonb(t.*)",
            table = table.name
        );
        let Json(inserted) = sqlx::query_scalar::<_, Json<Row>>(&sql)
            .bind(Json(&row))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| write_error(table, &row, e))?;

        debug!("Row inserted successfully in database");
        Ok(inserted)
    }

    #[instrument(skip(self, table, row), fields(table = table.name))]
    async fn update_row(
        &self,
        table: &'static TableSchema,
        key: RecordKey,
        row: Row,
    ) -> Result<Row, AppError> {
        debug!(id = %key, "Updating row in database");

        let assignments: Vec<String> = table
            .fields
            .iter()
            .filter(|f| f.kind != FieldKind::Key)
            .map(|f| format!("{name} = r.{name}", name = f.name))
            .collect();
        let sql = format!(
            "UPDATE {table} AS t SET {assignments} \
             FROM jsonb_populate_record(NULL::{table}, $2) AS r \
             WHERE t.id = $1 RETURNING to_jsonb(t.*)",
            table = table.name,
            assignments = assignments.join(", ")
        );
        let updated = bind_key(sqlx::query_scalar(&sql), key)
            .bind(Json(&row))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| write_error(table, &row, e))?;

        match updated {
            Some(Json(updated)) => {
                debug!(id = %key, "Row updated successfully in database");
                Ok(updated)
            }
            None => {
                warn!(id = %key, "Row not found for update");
                Err(not_found(table))
            }
        }
    }

    #[instrument(skip(self, table), fields(table = table.name))]
    async fn delete_row(
        &self,
        table: &'static TableSchema,
        key: RecordKey,
    ) -> Result<(), AppError> {
        debug!(id = %key, "Deleting row from database");

        let sql = format!("DELETE FROM {} WHERE id = $1", table.name);
        let query = sqlx::query(&sql);
        let query = match key {
            RecordKey::Account(id) => query.bind(id),
            RecordKey::Uuid(id) => query.bind(id),
        };
        let result = query.execute(&self.pool).await.map_err(|e| {
            warn!(error = %e, id = %key, "Failed to delete row from database");
            AppError::DatabaseError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            warn!(id = %key, "Row not found for deletion");
            return Err(not_found(table));
        }

        debug!(id = %key, "Row deleted successfully from database");
        Ok(())
    }
}
