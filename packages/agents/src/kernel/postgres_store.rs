//! Postgres implementation of [`BaseStore`].
//!
//! Rows travel as JSON in both directions. Reads use `to_jsonb(t)`, writes go
//! through `jsonb_populate_record(NULL::<table>, $1)` so Postgres does the
//! column type coercion (uuid, timestamptz, text[], jsonb). Only column names
//! are spliced into SQL, and only after validation.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::traits::{BaseStore, Filters, StoreError, StoreOperation, Table};
use crate::common::{into_record, Record};

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn quote_column(table: Table, column: &str) -> Result<String, StoreError> {
    let valid = !column.is_empty()
        && column.len() <= 63
        && column.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !column.starts_with(|c: char| c.is_ascii_digit());
    if !valid {
        return Err(StoreError::InvalidColumn {
            table,
            column: column.to_string(),
        });
    }
    Ok(format!("\"{}\"", column))
}

fn quoted_columns(table: Table, record: &Record) -> Result<Vec<String>, StoreError> {
    record.keys().map(|k| quote_column(table, k)).collect()
}

fn push_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    table: Table,
    filters: &Filters,
) -> Result<(), StoreError> {
    for (i, (column, value)) in filters.iter().enumerate() {
        quote_column(table, column)?;
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        qb.push("(to_jsonb(t) -> ");
        qb.push_bind(column.to_string());
        qb.push(") = ");
        qb.push_bind(Json(value.clone()));
    }
    Ok(())
}

/// `INSERT INTO <table> (cols) SELECT cols FROM jsonb_populate_record(...)`
fn push_insert(qb: &mut QueryBuilder<'_, Postgres>, table: Table, columns: &[String], record: Record) {
    let list = columns.join(", ");
    qb.push("INSERT INTO ");
    qb.push(table.as_str());
    qb.push(" (");
    qb.push(&list);
    qb.push(") SELECT ");
    qb.push(&list);
    qb.push(" FROM jsonb_populate_record(NULL::");
    qb.push(table.as_str());
    qb.push(", ");
    qb.push_bind(Json(Value::Object(record)));
    qb.push(")");
}

fn db_error(table: Table, operation: StoreOperation) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |source| StoreError::Database {
        table,
        operation,
        source,
    }
}

#[async_trait]
impl BaseStore for PostgresStore {
    async fn select(&self, table: Table, filters: &Filters) -> Result<Vec<Record>, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT to_jsonb(t) FROM ");
        qb.push(table.as_str());
        qb.push(" AS t");
        push_filters(&mut qb, table, filters)?;

        let rows: Vec<Json<Value>> = qb
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error(table, StoreOperation::Select))?;

        Ok(rows.into_iter().map(|Json(v)| into_record(v)).collect())
    }

    async fn insert(&self, table: Table, record: Record) -> Result<Option<Record>, StoreError> {
        if record.is_empty() {
            return Err(StoreError::EmptyRecord {
                table,
                operation: StoreOperation::Insert,
            });
        }
        let columns = quoted_columns(table, &record)?;

        let mut qb = QueryBuilder::<Postgres>::new("WITH ins AS (");
        push_insert(&mut qb, table, &columns, record);
        qb.push(" RETURNING *) SELECT to_jsonb(ins) FROM ins");

        let row: Option<Json<Value>> = qb
            .build_query_scalar()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error(table, StoreOperation::Insert))?;

        Ok(row.map(|Json(v)| into_record(v)))
    }

    async fn update(
        &self,
        table: Table,
        changes: Record,
        filters: &Filters,
    ) -> Result<Vec<Record>, StoreError> {
        if changes.is_empty() {
            return Err(StoreError::EmptyRecord {
                table,
                operation: StoreOperation::Update,
            });
        }
        if filters.is_empty() {
            return Err(StoreError::UnfilteredUpdate { table });
        }
        let columns = quoted_columns(table, &changes)?;

        let mut qb = QueryBuilder::<Postgres>::new(
            "WITH src AS (SELECT * FROM jsonb_populate_record(NULL::",
        );
        qb.push(table.as_str());
        qb.push(", ");
        qb.push_bind(Json(Value::Object(changes)));
        qb.push(")), upd AS (UPDATE ");
        qb.push(table.as_str());
        qb.push(" AS t SET ");
        let assignments: Vec<String> = columns
            .iter()
            .map(|c| format!("{c} = src.{c}"))
            .collect();
        qb.push(assignments.join(", "));
        qb.push(" FROM src");
        push_filters(&mut qb, table, filters)?;
        qb.push(" RETURNING t.*) SELECT to_jsonb(upd) FROM upd");

        let rows: Vec<Json<Value>> = qb
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error(table, StoreOperation::Update))?;

        Ok(rows.into_iter().map(|Json(v)| into_record(v)).collect())
    }

    async fn upsert(
        &self,
        table: Table,
        record: Record,
        conflict_keys: &[&str],
    ) -> Result<Option<Record>, StoreError> {
        if record.is_empty() {
            return Err(StoreError::EmptyRecord {
                table,
                operation: StoreOperation::Upsert,
            });
        }
        let columns = quoted_columns(table, &record)?;
        let keys = conflict_keys
            .iter()
            .map(|k| quote_column(table, k))
            .collect::<Result<Vec<_>, _>>()?;
        let updates: Vec<String> = record
            .keys()
            .filter(|k| !conflict_keys.contains(&k.as_str()))
            .map(|k| format!("\"{k}\" = EXCLUDED.\"{k}\""))
            .collect();

        let mut qb = QueryBuilder::<Postgres>::new("WITH ins AS (");
        push_insert(&mut qb, table, &columns, record);
        if !keys.is_empty() {
            qb.push(" ON CONFLICT (");
            qb.push(keys.join(", "));
            qb.push(")");
            if updates.is_empty() {
                qb.push(" DO NOTHING");
            } else {
                qb.push(" DO UPDATE SET ");
                qb.push(updates.join(", "));
            }
        }
        qb.push(" RETURNING *) SELECT to_jsonb(ins) FROM ins");

        let row: Option<Json<Value>> = qb
            .build_query_scalar()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error(table, StoreOperation::Upsert))?;

        Ok(row.map(|Json(v)| into_record(v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_column_accepts_plain_identifiers() {
        assert_eq!(
            quote_column(Table::Posts, "author_id").unwrap(),
            "\"author_id\""
        );
    }

    #[test]
    fn test_quote_column_rejects_injection() {
        for bad in ["", "id; DROP TABLE posts", "a\"b", "1col", "status--"] {
            assert!(
                matches!(
                    quote_column(Table::Posts, bad),
                    Err(StoreError::InvalidColumn { .. })
                ),
                "accepted {bad:?}"
            );
        }
    }
}
