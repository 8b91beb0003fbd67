//! Per-stage view of the store.
//!
//! Stages never see a `StoreError`. Every failed call is logged with the stage
//! and table, counted, and surfaces as "did not happen" (empty / `None`). The
//! count ends up in the stage report as `storage_failures`.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::warn;

use super::traits::{BaseStore, Filters, StoreError, Table};
use crate::common::Record;
use crate::pipeline::StageName;

/// Result of a lookup-before-insert probe.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(Record),
    Missing,
    /// The probe itself failed; callers must not assume the row is absent.
    Failed,
}

pub struct StageStore<'a> {
    inner: &'a dyn BaseStore,
    stage: StageName,
    failures: AtomicUsize,
}

impl<'a> StageStore<'a> {
    pub fn new(inner: &'a dyn BaseStore, stage: StageName) -> Self {
        Self {
            inner,
            stage,
            failures: AtomicUsize::new(0),
        }
    }

    pub fn stage(&self) -> StageName {
        self.stage
    }

    /// Number of storage operations that failed through this view.
    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    pub async fn select(&self, table: Table, filters: &Filters) -> Vec<Record> {
        match self.inner.select(table, filters).await {
            Ok(rows) => rows,
            Err(e) => {
                self.absorb(&e);
                Vec::new()
            }
        }
    }

    pub async fn select_all(&self, table: Table) -> Vec<Record> {
        self.select(table, &Filters::new()).await
    }

    /// First row matching `filters`.
    pub async fn lookup(&self, table: Table, filters: &Filters) -> Lookup {
        match self.inner.select(table, filters).await {
            Ok(rows) => rows.into_iter().next().map_or(Lookup::Missing, Lookup::Found),
            Err(e) => {
                self.absorb(&e);
                Lookup::Failed
            }
        }
    }

    pub async fn insert(&self, table: Table, record: Record) -> Option<Record> {
        match self.inner.insert(table, record).await {
            Ok(row) => row,
            Err(e) => {
                self.absorb(&e);
                None
            }
        }
    }

    pub async fn update(&self, table: Table, changes: Record, filters: &Filters) -> Vec<Record> {
        match self.inner.update(table, changes, filters).await {
            Ok(rows) => rows,
            Err(e) => {
                self.absorb(&e);
                Vec::new()
            }
        }
    }

    pub async fn upsert(
        &self,
        table: Table,
        record: Record,
        conflict_keys: &[&str],
    ) -> Option<Record> {
        match self.inner.upsert(table, record, conflict_keys).await {
            Ok(row) => row,
            Err(e) => {
                self.absorb(&e);
                None
            }
        }
    }

    fn absorb(&self, error: &StoreError) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        warn!(
            stage = %self.stage,
            table = %error.table(),
            error = %error,
            "Storage operation failed"
        );
    }
}
