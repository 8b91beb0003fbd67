use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CategoryBalance;
use crate::common::RecordId;
use crate::domains::top_needs::TopNeed;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderContact {
    pub profile_id: RecordId,
    pub display_name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationContact {
    pub org_id: String,
    pub name: String,
    /// Reported an urgent need in this cycle's org sync
    pub has_urgent_need: bool,
}

/// Who should hear about a shortage. Returned only, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortageNotification {
    pub category_id: i64,
    pub category_slug: String,
    pub top_need_id: Option<RecordId>,
    pub providers: Vec<ProviderContact>,
    pub organizations: Vec<OrganizationContact>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplyDemandReport {
    pub categories_analyzed: usize,
    pub requests_examined: usize,
    pub offers_examined: usize,
    /// Open posts whose category matched no category row
    pub uncategorized_posts: usize,
    /// Keyed by category slug
    pub analysis: BTreeMap<String, CategoryBalance>,
    pub shortage_categories: Vec<CategoryBalance>,
    pub created_needs: Vec<TopNeed>,
    pub notifications: Vec<ShortageNotification>,
    pub used_org_sync_data: bool,
    pub storage_failures: usize,
    pub timestamp: DateTime<Utc>,
}
