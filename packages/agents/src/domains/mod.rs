pub mod community;
pub mod event_analysis;
pub mod org_sync;
pub mod supply_demand;
pub mod top_needs;
pub mod volunteer_match;
