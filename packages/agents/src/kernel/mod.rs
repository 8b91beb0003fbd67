//! Kernel module - storage infrastructure and dependencies.

pub mod deps;
pub mod postgres_store;
pub mod scheduled_tasks;
pub mod stage_store;
pub mod test_dependencies;
pub mod traits;

pub use deps::AgentDeps;
pub use postgres_store::PostgresStore;
pub use scheduled_tasks::start_scheduler;
pub use stage_store::{Lookup, StageStore};
pub use test_dependencies::{FailingStore, MemoryStore};
pub use traits::*;
