//! Stage contract and the typed values that flow between stages.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{PipelineError, StageError};
use crate::common::Record;
use crate::domains::event_analysis::EventAnalysisReport;
use crate::domains::org_sync::OrgSyncReport;
use crate::domains::supply_demand::SupplyDemandReport;
use crate::domains::volunteer_match::VolunteerMatchReport;
use crate::kernel::AgentDeps;

/// The four pipeline stages, by wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StageName {
    #[serde(rename = "org_sync_agent")]
    OrgSync,
    #[serde(rename = "event_analysis_agent")]
    EventAnalysis,
    #[serde(rename = "supply_demand_balancer")]
    SupplyDemand,
    #[serde(rename = "volunteer_match_agent")]
    VolunteerMatch,
}

impl StageName {
    pub const ALL: [StageName; 4] = [
        StageName::OrgSync,
        StageName::EventAnalysis,
        StageName::SupplyDemand,
        StageName::VolunteerMatch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::OrgSync => "org_sync_agent",
            StageName::EventAnalysis => "event_analysis_agent",
            StageName::SupplyDemand => "supply_demand_balancer",
            StageName::VolunteerMatch => "volunteer_match_agent",
        }
    }

    /// Key under which this stage's payload is handed to dependents.
    pub fn result_key(&self) -> String {
        format!("{}_result", self.as_str())
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageName {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StageName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| PipelineError::UnknownStage(s.to_string()))
    }
}

/// One pipeline stage.
///
/// `process` returns stage-local failures as [`StageError`] values. Storage
/// failures never reach here; they are absorbed by
/// [`StageStore`](crate::kernel::StageStore) and counted in the report.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> StageName;

    fn description(&self) -> &'static str;

    async fn process(&self, input: &StageInput, deps: &AgentDeps)
        -> Result<StagePayload, StageError>;
}

/// Input for one stage invocation: the cycle's base input plus the payloads
/// of the step's completed dependencies.
#[derive(Debug, Clone)]
pub struct StageInput {
    pub step_name: StageName,
    pub step_description: String,
    pub base: Record,
    pub dependency_results: BTreeMap<StageName, StagePayload>,
}

impl StageInput {
    pub fn new(step_name: StageName, step_description: impl Into<String>, base: Record) -> Self {
        Self {
            step_name,
            step_description: step_description.into(),
            base,
            dependency_results: BTreeMap::new(),
        }
    }

    pub fn with_dependency(mut self, payload: StagePayload) -> Self {
        self.dependency_results.insert(payload.stage(), payload);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.base.get(key)
    }

    /// Payload of `stage`, from the dependency results or, failing that, from
    /// a `"<stage>_result"` entry in the base input (single-stage runs).
    pub fn dependency(&self, stage: StageName) -> Option<StagePayload> {
        if let Some(payload) = self.dependency_results.get(&stage) {
            return Some(payload.clone());
        }
        let raw = self.base.get(&stage.result_key())?.clone();
        StagePayload::from_value(stage, raw)
    }

    pub fn org_sync_result(&self) -> Option<OrgSyncReport> {
        match self.dependency(StageName::OrgSync)? {
            StagePayload::OrgSync(report) => Some(report),
            _ => None,
        }
    }

    pub fn supply_demand_result(&self) -> Option<SupplyDemandReport> {
        match self.dependency(StageName::SupplyDemand)? {
            StagePayload::SupplyDemand(report) => Some(report),
            _ => None,
        }
    }
}

/// Typed report of a completed stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage")]
pub enum StagePayload {
    #[serde(rename = "org_sync_agent")]
    OrgSync(OrgSyncReport),
    #[serde(rename = "event_analysis_agent")]
    EventAnalysis(EventAnalysisReport),
    #[serde(rename = "supply_demand_balancer")]
    SupplyDemand(SupplyDemandReport),
    #[serde(rename = "volunteer_match_agent")]
    VolunteerMatch(VolunteerMatchReport),
}

impl StagePayload {
    pub fn stage(&self) -> StageName {
        match self {
            StagePayload::OrgSync(_) => StageName::OrgSync,
            StagePayload::EventAnalysis(_) => StageName::EventAnalysis,
            StagePayload::SupplyDemand(_) => StageName::SupplyDemand,
            StagePayload::VolunteerMatch(_) => StageName::VolunteerMatch,
        }
    }

    /// The payload must have been produced by `expected`.
    pub fn validate_for(&self, expected: StageName) -> Result<(), PipelineError> {
        let found = self.stage();
        if found != expected {
            return Err(PipelineError::PayloadMismatch { expected, found });
        }
        Ok(())
    }

    pub fn storage_failures(&self) -> usize {
        match self {
            StagePayload::OrgSync(r) => r.storage_failures,
            StagePayload::EventAnalysis(r) => r.storage_failures,
            StagePayload::SupplyDemand(r) => r.storage_failures,
            StagePayload::VolunteerMatch(r) => r.storage_failures,
        }
    }

    /// Parse a serialized payload of `stage`, with or without the `stage` tag.
    pub fn from_value(stage: StageName, value: Value) -> Option<Self> {
        let payload = match stage {
            StageName::OrgSync => serde_json::from_value(value).ok().map(StagePayload::OrgSync),
            StageName::EventAnalysis => serde_json::from_value(value)
                .ok()
                .map(StagePayload::EventAnalysis),
            StageName::SupplyDemand => serde_json::from_value(value)
                .ok()
                .map(StagePayload::SupplyDemand),
            StageName::VolunteerMatch => serde_json::from_value(value)
                .ok()
                .map(StagePayload::VolunteerMatch),
        }?;
        Some(payload)
    }
}
