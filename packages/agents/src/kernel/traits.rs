// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Stage logic lives in domains/* and reaches storage through these traits.
//
// Naming convention: Base* for trait names (e.g., BaseStore)

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::common::Record;

// =============================================================================
// Tables
// =============================================================================

/// Tables the agents read and write. Closed set so table names never come from input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Organization,
    Profiles,
    Posts,
    Events,
    EventParticipants,
    Categories,
    TopNeeds,
    HelpOffer,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Organization => "organization",
            Table::Profiles => "profiles",
            Table::Posts => "posts",
            Table::Events => "events",
            Table::EventParticipants => "event_participants",
            Table::Categories => "categories",
            Table::TopNeeds => "top_needs",
            Table::HelpOffer => "help_offer",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Filters
// =============================================================================

/// Conjunction of column equality predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    predicates: Vec<(String, Value)>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates.push((column.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.predicates.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// True when every predicate equals the row's value. A missing column reads as null.
    pub fn matches(&self, row: &Record) -> bool {
        self.predicates
            .iter()
            .all(|(k, v)| row.get(k).unwrap_or(&Value::Null) == v)
    }
}

// =============================================================================
// Store Trait (Infrastructure - relational storage)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Select,
    Insert,
    Update,
    Upsert,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StoreOperation::Select => "select",
            StoreOperation::Insert => "insert",
            StoreOperation::Update => "update",
            StoreOperation::Upsert => "upsert",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{operation} on {table} failed: {source}")]
    Database {
        table: Table,
        operation: StoreOperation,
        #[source]
        source: sqlx::Error,
    },

    #[error("invalid column name {column:?} for {table}")]
    InvalidColumn { table: Table, column: String },

    #[error("{operation} on {table} with an empty record")]
    EmptyRecord {
        table: Table,
        operation: StoreOperation,
    },

    #[error("refusing unfiltered update on {table}")]
    UnfilteredUpdate { table: Table },

    #[error("{operation} on {table} unavailable: {message}")]
    Unavailable {
        table: Table,
        operation: StoreOperation,
        message: String,
    },
}

impl StoreError {
    pub fn table(&self) -> Table {
        match self {
            StoreError::Database { table, .. }
            | StoreError::InvalidColumn { table, .. }
            | StoreError::EmptyRecord { table, .. }
            | StoreError::UnfilteredUpdate { table }
            | StoreError::Unavailable { table, .. } => *table,
        }
    }
}

/// Relational storage used by every stage.
///
/// Rows are loosely typed [`Record`]s; stages parse them into domain models.
#[async_trait]
pub trait BaseStore: Send + Sync {
    /// Rows matching every filter (all rows when `filters` is empty).
    async fn select(&self, table: Table, filters: &Filters) -> Result<Vec<Record>, StoreError>;

    /// Insert one row, returning the stored row (with generated columns).
    async fn insert(&self, table: Table, record: Record) -> Result<Option<Record>, StoreError>;

    /// Set `changes` on matching rows, returning the updated rows.
    async fn update(
        &self,
        table: Table,
        changes: Record,
        filters: &Filters,
    ) -> Result<Vec<Record>, StoreError>;

    /// Insert or update on conflict with `conflict_keys`.
    async fn upsert(
        &self,
        table: Table,
        record: Record,
        conflict_keys: &[&str],
    ) -> Result<Option<Record>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::into_record;
    use serde_json::json;

    #[test]
    fn test_filters_match_all_predicates() {
        let row = into_record(json!({"status": "open", "is_free": false}));
        assert!(Filters::new().matches(&row));
        assert!(Filters::new().eq("status", "open").matches(&row));
        assert!(!Filters::new()
            .eq("status", "open")
            .eq("is_free", true)
            .matches(&row));
    }

    #[test]
    fn test_filters_missing_column_matches_null_only() {
        let row = into_record(json!({"status": "open"}));
        assert!(Filters::new().eq("closed_at", Value::Null).matches(&row));
        assert!(!Filters::new().eq("closed_at", "2025-01-01").matches(&row));
    }

    #[test]
    fn test_store_error_carries_table() {
        let err = StoreError::Unavailable {
            table: Table::TopNeeds,
            operation: StoreOperation::Insert,
            message: "connection refused".into(),
        };
        assert_eq!(err.table(), Table::TopNeeds);
        assert_eq!(
            err.to_string(),
            "insert on top_needs unavailable: connection refused"
        );
    }
}
