//! Organization sync activity.
//!
//! Pipeline:
//! 1. Reconcile each feed snapshot with its `organization` row (update or "new")
//! 2. Detect urgent needs (critical capacity, item shortages)
//! 3. Persist one TopNeed per urgent need

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::common::Record;
use crate::domains::community::{resolve_category_id, Category};
use crate::domains::org_sync::models::{
    OrgFeedSnapshot, OrgNeedKind, OrgSyncRecord, SyncStatus, UrgentNeed,
};
use crate::domains::org_sync::utils::{
    category_slug_for_org_type, is_capacity_critical, item_shortage_urgency, need_window_hours,
    UrgencyLevel,
};
use crate::domains::org_sync::OrgSyncConfig;
use crate::domains::top_needs::TopNeed;
use crate::kernel::{Filters, Lookup, StageStore, Table};
use crate::pipeline::StageName;

/// Urgent needs implied by one snapshot. Pure.
pub fn detect_urgent_needs(snapshot: &OrgFeedSnapshot, config: &OrgSyncConfig) -> Vec<UrgentNeed> {
    let mut needs = Vec::new();
    let category_slug = category_slug_for_org_type(&snapshot.org_type).to_string();

    let need = |need_type: OrgNeedKind, urgency: UrgencyLevel, items: Vec<String>| UrgentNeed {
        org_id: snapshot.org_id.clone(),
        org_name: snapshot.name.clone(),
        need_type,
        urgency,
        score: urgency.score(),
        location: snapshot.location.clone(),
        category_slug: category_slug.clone(),
        items,
        capacity_percent: snapshot.capacity_percent,
        window_hours: need_window_hours(urgency),
    };

    if is_capacity_critical(snapshot.capacity_percent, config.critical_capacity_percent) {
        needs.push(need(
            OrgNeedKind::CapacityCritical,
            UrgencyLevel::Critical,
            Vec::new(),
        ));
    }

    if !snapshot.shortages.is_empty() {
        let urgency = item_shortage_urgency(snapshot.capacity_percent, config.low_capacity_percent);
        needs.push(need(
            OrgNeedKind::ItemShortage,
            urgency,
            snapshot.shortages.clone(),
        ));
    }

    needs
}

/// Reconcile a snapshot with the organization table.
pub async fn reconcile_organization(
    snapshot: &OrgFeedSnapshot,
    now: DateTime<Utc>,
    store: &StageStore<'_>,
) -> OrgSyncRecord {
    let by_id = Filters::new().eq("id", snapshot.org_id.as_str());

    let sync_status = match store.lookup(Table::Organization, &by_id).await {
        Lookup::Found(_) => {
            let mut changes = Record::new();
            changes.insert("capacity_percent".into(), json!(snapshot.capacity_percent));
            changes.insert("shortages".into(), json!(snapshot.shortages));
            changes.insert("last_synced_at".into(), Value::from(now.to_rfc3339()));
            if let Some(hours) = &snapshot.operating_hours {
                changes.insert("operating_hours".into(), Value::from(hours.clone()));
            }
            store.update(Table::Organization, changes, &by_id).await;
            SyncStatus::Updated
        }
        Lookup::Missing | Lookup::Failed => SyncStatus::New,
    };

    debug!(org_id = %snapshot.org_id, status = ?sync_status, "Reconciled organization");

    OrgSyncRecord {
        org_id: snapshot.org_id.clone(),
        name: snapshot.name.clone(),
        capacity_percent: snapshot.capacity_percent,
        shortages: snapshot.shortages.clone(),
        operating_hours: snapshot.operating_hours.clone(),
        location: snapshot.location.clone(),
        sync_status,
    }
}

/// Persist an urgent need as a TopNeed.
pub async fn create_need_for(
    need: &UrgentNeed,
    categories: &[Category],
    now: DateTime<Utc>,
    store: &StageStore<'_>,
) -> Option<TopNeed> {
    let details = json!({
        "source": StageName::OrgSync.as_str(),
        "org_id": need.org_id,
        "org_name": need.org_name,
        "need_type": need.need_type,
        "urgency": need.urgency,
        "capacity_percent": need.capacity_percent,
        "items": need.items,
    });
    TopNeed::new(
        need.location.as_deref().unwrap_or_default(),
        resolve_category_id(categories, &need.category_slug),
        need.score,
        details,
        need.window_hours,
        now,
    )
    .create(store)
    .await
}

pub struct SyncOutcome {
    pub sync_results: Vec<OrgSyncRecord>,
    pub urgent_needs: Vec<UrgentNeed>,
    pub created_needs: Vec<TopNeed>,
}

pub async fn sync_organizations(
    snapshots: &[OrgFeedSnapshot],
    config: &OrgSyncConfig,
    now: DateTime<Utc>,
    store: &StageStore<'_>,
) -> SyncOutcome {
    let mut sync_results = Vec::with_capacity(snapshots.len());
    let mut urgent_needs = Vec::new();

    for snapshot in snapshots {
        sync_results.push(reconcile_organization(snapshot, now, store).await);
        urgent_needs.extend(detect_urgent_needs(snapshot, config));
    }

    let categories = if urgent_needs.is_empty() {
        Vec::new()
    } else {
        Category::find_all(store).await
    };

    let mut created_needs = Vec::new();
    for need in &urgent_needs {
        if let Some(created) = create_need_for(need, &categories, now, store).await {
            created_needs.push(created);
        }
    }

    info!(
        organizations = sync_results.len(),
        urgent_needs = urgent_needs.len(),
        created_needs = created_needs.len(),
        "Organization sync completed"
    );

    SyncOutcome {
        sync_results,
        urgent_needs,
        created_needs,
    }
}
