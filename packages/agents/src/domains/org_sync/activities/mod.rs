//! Org sync activities.

mod sync;

pub use sync::{
    create_need_for, detect_urgent_needs, reconcile_organization, sync_organizations, SyncOutcome,
};
