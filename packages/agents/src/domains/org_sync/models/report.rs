use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domains::org_sync::utils::UrgencyLevel;
use crate::domains::top_needs::TopNeed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Matched an existing organization row
    Updated,
    /// No organization row with this id
    New,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgSyncRecord {
    pub org_id: String,
    pub name: String,
    pub capacity_percent: f64,
    pub shortages: Vec<String>,
    pub operating_hours: Option<String>,
    pub location: Option<String>,
    pub sync_status: SyncStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgNeedKind {
    CapacityCritical,
    ItemShortage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrgentNeed {
    pub org_id: String,
    pub org_name: String,
    pub need_type: OrgNeedKind,
    pub urgency: UrgencyLevel,
    pub score: f64,
    pub location: Option<String>,
    /// Category the organization's type reports under
    pub category_slug: String,
    /// Short items, for item shortages
    pub items: Vec<String>,
    pub capacity_percent: f64,
    pub window_hours: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrgSyncReport {
    pub organizations_examined: usize,
    /// Feed entries dropped for lacking an org id
    pub invalid_snapshots: usize,
    pub used_sample_data: bool,
    pub sync_results: Vec<OrgSyncRecord>,
    pub urgent_needs: Vec<UrgentNeed>,
    pub created_needs: Vec<TopNeed>,
    pub storage_failures: usize,
    pub timestamp: DateTime<Utc>,
}

impl OrgSyncReport {
    /// Urgent needs reported under `slug`.
    pub fn urgent_needs_for(&self, slug: &str) -> impl Iterator<Item = &UrgentNeed> {
        let slug = slug.to_string();
        self.urgent_needs
            .iter()
            .filter(move |need| need.category_slug == slug)
    }
}
