mod report;
mod snapshot;

pub use report::{OrgNeedKind, OrgSyncRecord, OrgSyncReport, SyncStatus, UrgentNeed};
pub use snapshot::{sample_snapshots, OrgFeedSnapshot, DEFAULT_CAPACITY_PERCENT};
