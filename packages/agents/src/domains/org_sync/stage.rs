use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};

use super::activities::sync_organizations;
use super::models::{sample_snapshots, OrgFeedSnapshot, OrgSyncReport};
use super::utils::{CRITICAL_CAPACITY_PERCENT, LOW_CAPACITY_PERCENT};
use crate::kernel::AgentDeps;
use crate::pipeline::{Stage, StageError, StageInput, StageName, StagePayload};

#[derive(Debug, Clone)]
pub struct OrgSyncConfig {
    pub critical_capacity_percent: f64,
    pub low_capacity_percent: f64,
    /// Fall back to the built-in sample feed when no `sync_data` is given
    pub use_sample_data: bool,
}

impl Default for OrgSyncConfig {
    fn default() -> Self {
        Self {
            critical_capacity_percent: CRITICAL_CAPACITY_PERCENT,
            low_capacity_percent: LOW_CAPACITY_PERCENT,
            use_sample_data: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrgSyncStage {
    pub config: OrgSyncConfig,
}

impl OrgSyncStage {
    pub fn new(config: OrgSyncConfig) -> Self {
        Self { config }
    }
}

struct FeedInput {
    snapshots: Vec<OrgFeedSnapshot>,
    invalid: usize,
    used_sample_data: bool,
}

fn read_feed(input: &StageInput, config: &OrgSyncConfig) -> Result<FeedInput, StageError> {
    match input.get("sync_data") {
        None | Some(Value::Null) => {
            let snapshots = if config.use_sample_data {
                sample_snapshots()
            } else {
                Vec::new()
            };
            Ok(FeedInput {
                used_sample_data: config.use_sample_data,
                snapshots,
                invalid: 0,
            })
        }
        Some(Value::Array(entries)) => {
            let snapshots: Vec<OrgFeedSnapshot> =
                entries.iter().filter_map(OrgFeedSnapshot::from_value).collect();
            let invalid = entries.len() - snapshots.len();
            if invalid > 0 {
                warn!(invalid, "Dropped feed entries without an org id");
            }
            Ok(FeedInput {
                snapshots,
                invalid,
                used_sample_data: false,
            })
        }
        Some(_) => Err(StageError::invalid_input(
            StageName::OrgSync,
            "sync_data must be a list of organization snapshots",
        )),
    }
}

#[async_trait]
impl Stage for OrgSyncStage {
    fn name(&self) -> StageName {
        StageName::OrgSync
    }

    fn description(&self) -> &'static str {
        "Syncs organization capacity and shortage feeds and raises urgent needs"
    }

    async fn process(
        &self,
        input: &StageInput,
        deps: &AgentDeps,
    ) -> Result<StagePayload, StageError> {
        let feed = read_feed(input, &self.config)?;
        info!(
            organizations = feed.snapshots.len(),
            sample = feed.used_sample_data,
            "Starting organization sync"
        );

        let store = deps.store_for(StageName::OrgSync);
        let now = Utc::now();
        let outcome = sync_organizations(&feed.snapshots, &self.config, now, &store).await;

        Ok(StagePayload::OrgSync(OrgSyncReport {
            organizations_examined: feed.snapshots.len(),
            invalid_snapshots: feed.invalid,
            used_sample_data: feed.used_sample_data,
            sync_results: outcome.sync_results,
            urgent_needs: outcome.urgent_needs,
            created_needs: outcome.created_needs,
            storage_failures: store.failures(),
            timestamp: now,
        }))
    }
}
