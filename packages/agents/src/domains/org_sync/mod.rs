//! Organization sync: capacity and shortage feeds into urgent needs.

pub mod activities;
pub mod models;
pub mod stage;
pub mod utils;

pub use models::{
    sample_snapshots, OrgFeedSnapshot, OrgNeedKind, OrgSyncRecord, OrgSyncReport, SyncStatus,
    UrgentNeed,
};
pub use stage::{OrgSyncConfig, OrgSyncStage};
