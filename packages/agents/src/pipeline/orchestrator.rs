//! Dependency-aware sequential executor.
//!
//! ```text
//! run_full_cycle
//!     │
//!     ├─► for each plan step, in order
//!     │       ├─ dependency not Completed → Skipped("Dependencies failed")
//!     │       ├─ input = base + "<dependency>_result" payloads
//!     │       ├─ Stage::process (timed, panics caught) → Completed | Failed
//!     │       └─ courtesy delay
//!     │
//!     └─► aggregate → insights + recommendations → history
//! ```

use std::any::Any;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::aggregate::{aggregate_results, CycleAggregate};
use super::error::{PipelineError, StageError};
use super::result::{AgentResult, StageStatus};
use super::stage::{Stage, StageInput, StageName};
use super::step::{ExecutionPlan, ExecutionStep};
use crate::common::Record;
use crate::domains::event_analysis::EventAnalysisStage;
use crate::domains::org_sync::OrgSyncStage;
use crate::domains::supply_demand::SupplyDemandStage;
use crate::domains::volunteer_match::VolunteerMatchStage;
use crate::kernel::AgentDeps;
use crate::Config;

pub const DEPENDENCIES_FAILED: &str = "Dependencies failed";

/// Number of history entries included in [`SystemStatus`].
const STATUS_HISTORY_ENTRIES: usize = 5;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Pause after each executed stage
    pub courtesy_delay: Duration,
    /// Completed cycles kept in memory
    pub history_limit: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            courtesy_delay: Duration::from_secs(1),
            history_limit: 50,
        }
    }
}

impl From<&Config> for OrchestratorConfig {
    fn from(config: &Config) -> Self {
        Self {
            courtesy_delay: config.courtesy_delay,
            history_limit: config.history_limit,
        }
    }
}

/// Result of a `run_full_cycle` call.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Completed(CycleAggregate),
    /// Another cycle holds the running flag; nothing was executed.
    AlreadyRunning,
    /// Orchestrator-level failure outside stage invocation.
    Failed(String),
}

impl CycleOutcome {
    pub fn aggregate(&self) -> Option<&CycleAggregate> {
        match self {
            CycleOutcome::Completed(aggregate) => Some(aggregate),
            _ => None,
        }
    }
}

/// Completed cycles serialize as the aggregate, the others as `{"error": message}`.
impl Serialize for CycleOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CycleOutcome::Completed(aggregate) => aggregate.serialize(serializer),
            CycleOutcome::AlreadyRunning => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", "Orchestrator already running")?;
                map.end()
            }
            CycleOutcome::Failed(message) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", message)?;
                map.end()
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleRecord {
    pub timestamp: DateTime<Utc>,
    pub results: CycleOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentStatus {
    pub status: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    pub orchestrator_running: bool,
    pub agent_status: BTreeMap<String, AgentStatus>,
    pub execution_history: Vec<CycleRecord>,
    pub timestamp: DateTime<Utc>,
}

/// Clears the running flag on every exit path, unwinding included.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct Orchestrator {
    stages: HashMap<StageName, Arc<dyn Stage>>,
    plan: ExecutionPlan,
    deps: AgentDeps,
    config: OrchestratorConfig,
    running: AtomicBool,
    history: Mutex<VecDeque<CycleRecord>>,
}

/// The four production stages with their default thresholds.
pub fn default_stages() -> Vec<Arc<dyn Stage>> {
    vec![
        Arc::new(OrgSyncStage::default()),
        Arc::new(EventAnalysisStage::default()),
        Arc::new(SupplyDemandStage::default()),
        Arc::new(VolunteerMatchStage::default()),
    ]
}

impl Orchestrator {
    pub fn new(deps: AgentDeps, config: OrchestratorConfig) -> Self {
        Self::with_stages(deps, config, default_stages())
    }

    /// Orchestrator over the default plan with the given stage implementations.
    pub fn with_stages(
        deps: AgentDeps,
        config: OrchestratorConfig,
        stages: Vec<Arc<dyn Stage>>,
    ) -> Self {
        Self {
            stages: stages.into_iter().map(|s| (s.name(), s)).collect(),
            plan: ExecutionPlan::default_plan(),
            deps,
            config,
            running: AtomicBool::new(false),
            history: Mutex::new(VecDeque::new()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run every plan step once and aggregate the results.
    pub async fn run_full_cycle(&self, input: Option<Record>) -> CycleOutcome {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Orchestrator already running, rejecting cycle");
            return CycleOutcome::AlreadyRunning;
        }
        let _guard = RunningGuard(&self.running);

        let started_at = Utc::now();
        info!(cycle_id = %started_at.to_rfc3339(), "Starting full agent cycle");

        let cycle = AssertUnwindSafe(self.execute_cycle(input.unwrap_or_default(), started_at));
        let outcome = match cycle.catch_unwind().await {
            Ok(Ok(aggregate)) => {
                info!(
                    completed = aggregate.cycle_summary.completed,
                    failed = aggregate.cycle_summary.failed,
                    skipped = aggregate.cycle_summary.skipped,
                    total_execution_time = aggregate.cycle_summary.total_execution_time,
                    "Agent cycle finished"
                );
                CycleOutcome::Completed(aggregate)
            }
            Ok(Err(e)) => {
                error!(error = %e, "Agent cycle failed");
                CycleOutcome::Failed(e.to_string())
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(error = %message, "Agent cycle panicked");
                CycleOutcome::Failed(message)
            }
        };

        self.record_history(started_at, outcome.clone());
        outcome
    }

    async fn execute_cycle(
        &self,
        mut base: Record,
        started_at: DateTime<Utc>,
    ) -> Result<CycleAggregate, PipelineError> {
        let cycle_id = started_at.to_rfc3339();
        base.insert("cycle_id".into(), Value::from(cycle_id.clone()));
        base.insert("timestamp".into(), Value::from(cycle_id.clone()));

        let mut results: Vec<AgentResult> = Vec::with_capacity(self.plan.steps.len());
        let last = self.plan.steps.len().saturating_sub(1);

        for (index, step) in self.plan.steps.iter().enumerate() {
            let mut result = AgentResult::pending(step.name.as_str());

            if !dependencies_satisfied(step, &results) {
                info!(stage = %step.name, "Skipping stage, dependencies failed");
                result.skip(DEPENDENCIES_FAILED)?;
                results.push(result);
                continue;
            }

            let Some(stage) = self.stages.get(&step.name) else {
                warn!(stage = %step.name, "No implementation registered for stage");
                result.fail(PipelineError::UnknownStage(step.name.to_string()).to_string(), None)?;
                results.push(result);
                continue;
            };

            match build_input(step, &base, &results) {
                Ok(input) => self.invoke(stage.as_ref(), &input, &mut result).await?,
                Err(e) => {
                    warn!(stage = %step.name, error = %e, "Rejected dependency payload");
                    result.fail(e.to_string(), None)?;
                }
            }
            results.push(result);

            if index < last && !self.config.courtesy_delay.is_zero() {
                tokio::time::sleep(self.config.courtesy_delay).await;
            }
        }

        Ok(aggregate_results(cycle_id, started_at, &results))
    }

    /// Run one stage by wire name, outside the plan. Dependencies are not
    /// checked; a `"<dependency>_result"` entry in `input` is used if present.
    pub async fn run_single_agent(&self, name: &str, input: Option<Record>) -> AgentResult {
        let mut result = AgentResult::pending(name);

        let stage = name
            .parse::<StageName>()
            .ok()
            .and_then(|stage_name| self.stages.get(&stage_name));
        let Some(stage) = stage else {
            warn!(stage = %name, "Unknown agent requested");
            let message = PipelineError::UnknownStage(name.to_string()).to_string();
            if let Err(e) = result.fail(message, None) {
                error!(error = %e, "Failed to record unknown agent");
            }
            return result;
        };

        let mut base = input.unwrap_or_default();
        base.entry("timestamp")
            .or_insert_with(|| Value::from(Utc::now().to_rfc3339()));
        let input = StageInput::new(stage.name(), stage.description(), base);

        if let Err(e) = self.invoke(stage.as_ref(), &input, &mut result).await {
            error!(stage = %name, error = %e, "Failed to record stage result");
        }
        result
    }

    /// Invoke one stage, recording Running then Completed or Failed on `result`.
    async fn invoke(
        &self,
        stage: &dyn Stage,
        input: &StageInput,
        result: &mut AgentResult,
    ) -> Result<(), PipelineError> {
        let name = stage.name();
        result.start(Utc::now())?;
        info!(stage = %name, step = %input.step_description, "Running stage");

        let started = Instant::now();
        let outcome = AssertUnwindSafe(stage.process(input, &self.deps))
            .catch_unwind()
            .await;
        let elapsed = started.elapsed().as_secs_f64();

        match outcome {
            Ok(Ok(payload)) => match payload.validate_for(name) {
                Ok(()) => {
                    debug!(
                        stage = %name,
                        execution_time = elapsed,
                        storage_failures = payload.storage_failures(),
                        "Stage completed"
                    );
                    result.complete(payload, elapsed)
                }
                Err(e) => {
                    warn!(stage = %name, error = %e, "Stage returned a foreign payload");
                    result.fail(e.to_string(), Some(elapsed))
                }
            },
            Ok(Err(e)) => {
                warn!(stage = %name, error = %e, "Stage failed");
                result.fail(e.to_string(), Some(elapsed))
            }
            Err(panic) => {
                let e = StageError::Panicked {
                    stage: name,
                    message: panic_message(panic.as_ref()),
                };
                error!(stage = %name, error = %e, "Stage panicked");
                result.fail(e.to_string(), Some(elapsed))
            }
        }
    }

    /// Most recent `limit` cycles, oldest first.
    pub fn execution_history(&self, limit: usize) -> Vec<CycleRecord> {
        let history = self.lock_history();
        let skip = history.len().saturating_sub(limit);
        history.iter().skip(skip).cloned().collect()
    }

    pub fn agent_status(&self) -> BTreeMap<String, AgentStatus> {
        self.plan
            .steps
            .iter()
            .filter_map(|step| self.stages.get(&step.name))
            .map(|stage| {
                (
                    stage.name().to_string(),
                    AgentStatus {
                        status: "available".to_string(),
                        description: stage.description().to_string(),
                    },
                )
            })
            .collect()
    }

    pub fn system_status(&self) -> SystemStatus {
        SystemStatus {
            orchestrator_running: self.is_running(),
            agent_status: self.agent_status(),
            execution_history: self.execution_history(STATUS_HISTORY_ENTRIES),
            timestamp: Utc::now(),
        }
    }

    fn record_history(&self, timestamp: DateTime<Utc>, results: CycleOutcome) {
        let mut history = self.lock_history();
        history.push_back(CycleRecord { timestamp, results });
        while history.len() > self.config.history_limit {
            history.pop_front();
        }
    }

    fn lock_history(&self) -> MutexGuard<'_, VecDeque<CycleRecord>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Every dependency has a Completed result. Skipped dependencies count as
/// unmet, so skips propagate down the plan.
fn dependencies_satisfied(step: &ExecutionStep, results: &[AgentResult]) -> bool {
    step.dependencies.iter().all(|dep| {
        results
            .iter()
            .any(|r| r.stage_name == dep.as_str() && r.status == StageStatus::Completed)
    })
}

fn build_input(
    step: &ExecutionStep,
    base: &Record,
    results: &[AgentResult],
) -> Result<StageInput, PipelineError> {
    let mut input = StageInput::new(step.name, step.description.clone(), base.clone());
    for dep in &step.dependencies {
        let payload = results
            .iter()
            .find(|r| r.stage_name == dep.as_str())
            .and_then(|r| r.payload.as_ref());
        if let Some(payload) = payload {
            payload.validate_for(*dep)?;
            input.dependency_results.insert(*dep, payload.clone());
        }
    }
    Ok(input)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::event_analysis::EventAnalysisReport;
    use crate::domains::org_sync::OrgSyncReport;
    use crate::domains::supply_demand::SupplyDemandReport;
    use crate::domains::volunteer_match::VolunteerMatchReport;
    use crate::kernel::MemoryStore;
    use crate::pipeline::StagePayload;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    #[derive(Clone, Copy)]
    enum Behavior {
        Succeed,
        Fail,
        Panic,
        WrongPayload,
        Sleep(Duration),
    }

    struct StubStage {
        name: StageName,
        behavior: Behavior,
        calls: Arc<AtomicUsize>,
        seen_dependencies: Arc<Mutex<Vec<StageName>>>,
    }

    impl StubStage {
        fn new(name: StageName, behavior: Behavior) -> Self {
            Self {
                name,
                behavior,
                calls: Arc::new(AtomicUsize::new(0)),
                seen_dependencies: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    fn empty_payload(name: StageName) -> StagePayload {
        match name {
            StageName::OrgSync => StagePayload::OrgSync(OrgSyncReport::default()),
            StageName::EventAnalysis => {
                StagePayload::EventAnalysis(EventAnalysisReport::default())
            }
            StageName::SupplyDemand => StagePayload::SupplyDemand(SupplyDemandReport::default()),
            StageName::VolunteerMatch => {
                StagePayload::VolunteerMatch(VolunteerMatchReport::default())
            }
        }
    }

    #[async_trait]
    impl Stage for StubStage {
        fn name(&self) -> StageName {
            self.name
        }

        fn description(&self) -> &'static str {
            "stub"
        }

        async fn process(
            &self,
            input: &StageInput,
            _deps: &AgentDeps,
        ) -> Result<StagePayload, StageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_dependencies
                .lock()
                .unwrap()
                .extend(input.dependency_results.keys().copied());
            match self.behavior {
                Behavior::Succeed => Ok(empty_payload(self.name)),
                Behavior::Fail => Err(StageError::invalid_input(self.name, "bad input")),
                Behavior::Panic => panic!("stage exploded"),
                Behavior::WrongPayload => Ok(empty_payload(StageName::OrgSync)),
                Behavior::Sleep(duration) => {
                    tokio::time::sleep(duration).await;
                    Ok(empty_payload(self.name))
                }
            }
        }
    }

    fn config() -> OrchestratorConfig {
        OrchestratorConfig {
            courtesy_delay: Duration::ZERO,
            history_limit: 3,
        }
    }

    fn orchestrator(behaviors: [Behavior; 4]) -> Orchestrator {
        let stages: Vec<Arc<dyn Stage>> = StageName::ALL
            .into_iter()
            .zip(behaviors)
            .map(|(name, behavior)| Arc::new(StubStage::new(name, behavior)) as Arc<dyn Stage>)
            .collect();
        let deps = AgentDeps::new(Arc::new(MemoryStore::new()));
        Orchestrator::with_stages(deps, config(), stages)
    }

    fn status(aggregate: &CycleAggregate, name: StageName) -> StageStatus {
        aggregate.result(name).unwrap().status
    }

    #[tokio::test]
    async fn test_all_stages_complete() {
        let orch = orchestrator([Behavior::Succeed; 4]);
        let outcome = orch.run_full_cycle(None).await;
        let aggregate = outcome.aggregate().unwrap();
        assert_eq!(aggregate.cycle_summary.completed, 4);
        assert_eq!(aggregate.cycle_summary.total_agents, 4);
        assert!(!orch.is_running());
    }

    #[tokio::test]
    async fn test_failed_stage_skips_dependents_transitively() {
        let orch = orchestrator([
            Behavior::Fail,
            Behavior::Succeed,
            Behavior::Succeed,
            Behavior::Succeed,
        ]);
        let outcome = orch.run_full_cycle(None).await;
        let aggregate = outcome.aggregate().unwrap();

        assert_eq!(status(aggregate, StageName::OrgSync), StageStatus::Failed);
        assert_eq!(
            status(aggregate, StageName::EventAnalysis),
            StageStatus::Completed
        );
        for skipped in [StageName::SupplyDemand, StageName::VolunteerMatch] {
            let result = aggregate.result(skipped).unwrap();
            assert_eq!(result.status, StageStatus::Skipped);
            assert_eq!(result.error.as_deref(), Some(DEPENDENCIES_FAILED));
        }
        assert_eq!(
            aggregate.recommendations[0],
            "Review and fix 1 failed agents: org_sync_agent"
        );
    }

    #[tokio::test]
    async fn test_panicking_stage_is_recorded_as_failed() {
        let orch = orchestrator([
            Behavior::Succeed,
            Behavior::Panic,
            Behavior::Succeed,
            Behavior::Succeed,
        ]);
        let outcome = orch.run_full_cycle(None).await;
        let aggregate = outcome.aggregate().unwrap();
        let result = aggregate.result(StageName::EventAnalysis).unwrap();
        assert_eq!(result.status, StageStatus::Failed);
        assert!(result.error.as_deref().unwrap().contains("stage exploded"));
        assert!(result.execution_time.is_some());
        assert_eq!(
            status(aggregate, StageName::SupplyDemand),
            StageStatus::Skipped
        );
        assert!(!orch.is_running());
    }

    #[tokio::test]
    async fn test_foreign_payload_is_rejected() {
        let orch = orchestrator([
            Behavior::Succeed,
            Behavior::WrongPayload,
            Behavior::Succeed,
            Behavior::Succeed,
        ]);
        let outcome = orch.run_full_cycle(None).await;
        let aggregate = outcome.aggregate().unwrap();
        assert_eq!(
            status(aggregate, StageName::EventAnalysis),
            StageStatus::Failed
        );
        assert_eq!(
            status(aggregate, StageName::SupplyDemand),
            StageStatus::Skipped
        );
    }

    #[tokio::test]
    async fn test_dependency_payloads_are_injected() {
        let supply = StubStage::new(StageName::SupplyDemand, Behavior::Succeed);
        let seen = supply.seen_dependencies.clone();
        let stages: Vec<Arc<dyn Stage>> = vec![
            Arc::new(StubStage::new(StageName::OrgSync, Behavior::Succeed)),
            Arc::new(StubStage::new(StageName::EventAnalysis, Behavior::Succeed)),
            Arc::new(supply),
            Arc::new(StubStage::new(StageName::VolunteerMatch, Behavior::Succeed)),
        ];
        let orch = Orchestrator::with_stages(
            AgentDeps::new(Arc::new(MemoryStore::new())),
            config(),
            stages,
        );
        orch.run_full_cycle(None).await;
        assert_eq!(
            *seen.lock().unwrap(),
            vec![StageName::OrgSync, StageName::EventAnalysis]
        );
    }

    #[tokio::test]
    async fn test_total_time_is_sum_of_stage_times() {
        let orch = orchestrator([Behavior::Succeed, Behavior::Fail, Behavior::Succeed, Behavior::Succeed]);
        let outcome = orch.run_full_cycle(None).await;
        let aggregate = outcome.aggregate().unwrap();
        let sum: f64 = aggregate
            .agent_results
            .values()
            .filter_map(|r| r.execution_time)
            .sum();
        assert!((aggregate.cycle_summary.total_execution_time - sum).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_concurrent_cycle_is_rejected() {
        let orch = Arc::new(orchestrator([
            Behavior::Sleep(Duration::from_millis(200)),
            Behavior::Succeed,
            Behavior::Succeed,
            Behavior::Succeed,
        ]));
        let first = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.run_full_cycle(None).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(orch.is_running());

        let second = orch.run_full_cycle(None).await;
        assert_eq!(second, CycleOutcome::AlreadyRunning);
        assert_eq!(
            serde_json::to_value(&second).unwrap(),
            serde_json::json!({"error": "Orchestrator already running"})
        );

        let first = first.await.unwrap();
        assert!(first.aggregate().is_some());
        assert!(!orch.is_running());
        assert_eq!(orch.execution_history(10).len(), 1);
    }

    #[tokio::test]
    async fn test_history_is_bounded_and_ordered() {
        let orch = orchestrator([Behavior::Succeed; 4]);
        for _ in 0..5 {
            orch.run_full_cycle(None).await;
        }
        let history = orch.execution_history(10);
        assert_eq!(history.len(), 3);
        assert!(history[0].timestamp <= history[2].timestamp);
        assert_eq!(orch.execution_history(1).len(), 1);
    }

    #[tokio::test]
    async fn test_run_single_agent_unknown_name() {
        let orch = orchestrator([Behavior::Succeed; 4]);
        let result = orch.run_single_agent("weather_agent", None).await;
        assert_eq!(result.status, StageStatus::Failed);
        assert_eq!(result.error.as_deref(), Some("Agent weather_agent not found"));
    }

    #[tokio::test]
    async fn test_run_single_agent_ignores_dependencies() {
        let orch = orchestrator([Behavior::Fail, Behavior::Succeed, Behavior::Succeed, Behavior::Succeed]);
        let result = orch
            .run_single_agent("volunteer_match_agent", None)
            .await;
        assert_eq!(result.status, StageStatus::Completed);
        assert!(matches!(
            result.payload,
            Some(StagePayload::VolunteerMatch(_))
        ));
    }

    #[tokio::test]
    async fn test_agent_status_lists_all_stages() {
        let orch = orchestrator([Behavior::Succeed; 4]);
        let status = orch.agent_status();
        assert_eq!(status.len(), 4);
        assert!(status.values().all(|s| s.status == "available"));
        let system = orch.system_status();
        assert!(!system.orchestrator_running);
        assert!(system.execution_history.is_empty());
    }
}
