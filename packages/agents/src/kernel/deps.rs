//! Agent dependencies (using traits for testability)
//!
//! Central dependency container handed to every stage invocation.

use std::sync::Arc;

use sqlx::PgPool;

use super::postgres_store::PostgresStore;
use super::stage_store::StageStore;
use super::traits::BaseStore;
use crate::pipeline::StageName;

#[derive(Clone)]
pub struct AgentDeps {
    pub store: Arc<dyn BaseStore>,
}

impl AgentDeps {
    pub fn new(store: Arc<dyn BaseStore>) -> Self {
        Self { store }
    }

    /// Dependencies backed by Postgres.
    pub fn postgres(pool: PgPool) -> Self {
        Self::new(Arc::new(PostgresStore::new(pool)))
    }

    /// Error-absorbing view of the store for one stage invocation.
    pub fn store_for(&self, stage: StageName) -> StageStore<'_> {
        StageStore::new(self.store.as_ref(), stage)
    }
}
