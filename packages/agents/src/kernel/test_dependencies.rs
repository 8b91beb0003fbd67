// TestDependencies - in-memory implementations for testing
//
// MemoryStore stands in for Postgres; FailingStore wraps any store and fails
// chosen tables/operations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::traits::{BaseStore, Filters, StoreError, StoreOperation, Table};
use crate::common::{into_record, Record};

// =============================================================================
// Memory Store
// =============================================================================

/// In-memory store. Clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<HashMap<Table, Vec<Record>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed rows (builder style). Rows without an `id` get one.
    pub fn with_rows(self, table: Table, rows: Vec<Value>) -> Self {
        self.seed(table, rows);
        self
    }

    pub fn seed(&self, table: Table, rows: Vec<Value>) {
        let mut tables = self.lock();
        let entries = tables.entry(table).or_default();
        for row in rows {
            entries.push(with_id(into_record(row)));
        }
    }

    /// Snapshot of every row in `table`.
    pub fn rows(&self, table: Table) -> Vec<Record> {
        self.lock().get(&table).cloned().unwrap_or_default()
    }

    pub fn count(&self, table: Table) -> usize {
        self.lock().get(&table).map_or(0, Vec::len)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Table, Vec<Record>>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn with_id(mut record: Record) -> Record {
    if record.get("id").map_or(true, Value::is_null) {
        record.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
    }
    record
}

fn merge(target: &mut Record, changes: &Record) {
    for (k, v) in changes {
        target.insert(k.clone(), v.clone());
    }
}

#[async_trait]
impl BaseStore for MemoryStore {
    async fn select(&self, table: Table, filters: &Filters) -> Result<Vec<Record>, StoreError> {
        Ok(self
            .lock()
            .get(&table)
            .map(|rows| rows.iter().filter(|r| filters.matches(r)).cloned().collect())
            .unwrap_or_default())
    }

    async fn insert(&self, table: Table, record: Record) -> Result<Option<Record>, StoreError> {
        if record.is_empty() {
            return Err(StoreError::EmptyRecord {
                table,
                operation: StoreOperation::Insert,
            });
        }
        let record = with_id(record);
        self.lock().entry(table).or_default().push(record.clone());
        Ok(Some(record))
    }

    async fn update(
        &self,
        table: Table,
        changes: Record,
        filters: &Filters,
    ) -> Result<Vec<Record>, StoreError> {
        if filters.is_empty() {
            return Err(StoreError::UnfilteredUpdate { table });
        }
        let mut tables = self.lock();
        let mut updated = Vec::new();
        for row in tables.entry(table).or_default().iter_mut() {
            if filters.matches(row) {
                merge(row, &changes);
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn upsert(
        &self,
        table: Table,
        record: Record,
        conflict_keys: &[&str],
    ) -> Result<Option<Record>, StoreError> {
        let key_filter = conflict_keys.iter().fold(Filters::new(), |f, k| {
            f.eq(*k, record.get(*k).cloned().unwrap_or(Value::Null))
        });
        let mut tables = self.lock();
        let rows = tables.entry(table).or_default();
        if !conflict_keys.is_empty() {
            if let Some(existing) = rows.iter_mut().find(|r| key_filter.matches(r)) {
                merge(existing, &record);
                return Ok(Some(existing.clone()));
            }
        }
        let record = with_id(record);
        rows.push(record.clone());
        Ok(Some(record))
    }
}

// =============================================================================
// Failing Store
// =============================================================================

/// Delegates to `inner` except for the configured (table, operation) pairs,
/// which return [`StoreError::Unavailable`].
#[derive(Clone)]
pub struct FailingStore<S> {
    inner: S,
    failing: Vec<(Table, Option<StoreOperation>)>,
}

impl<S: BaseStore> FailingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            failing: Vec::new(),
        }
    }

    /// Fail every operation on `table`.
    pub fn fail_table(mut self, table: Table) -> Self {
        self.failing.push((table, None));
        self
    }

    pub fn fail_operation(mut self, table: Table, operation: StoreOperation) -> Self {
        self.failing.push((table, Some(operation)));
        self
    }

    fn check(&self, table: Table, operation: StoreOperation) -> Result<(), StoreError> {
        let fails = self
            .failing
            .iter()
            .any(|(t, op)| *t == table && op.map_or(true, |op| op == operation));
        if fails {
            return Err(StoreError::Unavailable {
                table,
                operation,
                message: "simulated outage".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl<S: BaseStore> BaseStore for FailingStore<S> {
    async fn select(&self, table: Table, filters: &Filters) -> Result<Vec<Record>, StoreError> {
        self.check(table, StoreOperation::Select)?;
        self.inner.select(table, filters).await
    }

    async fn insert(&self, table: Table, record: Record) -> Result<Option<Record>, StoreError> {
        self.check(table, StoreOperation::Insert)?;
        self.inner.insert(table, record).await
    }

    async fn update(
        &self,
        table: Table,
        changes: Record,
        filters: &Filters,
    ) -> Result<Vec<Record>, StoreError> {
        self.check(table, StoreOperation::Update)?;
        self.inner.update(table, changes, filters).await
    }

    async fn upsert(
        &self,
        table: Table,
        record: Record,
        conflict_keys: &[&str],
    ) -> Result<Option<Record>, StoreError> {
        self.check(table, StoreOperation::Upsert)?;
        self.inner.upsert(table, record, conflict_keys).await
    }
}
