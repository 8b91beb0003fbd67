//! Stage pipeline: contract, plan, orchestration and aggregation.

pub mod aggregate;
pub mod error;
pub mod orchestrator;
pub mod result;
pub mod stage;
pub mod step;

pub use aggregate::{aggregate_results, CycleAggregate, CycleSummary};
pub use error::{PipelineError, StageError};
pub use orchestrator::{
    default_stages, AgentStatus, CycleOutcome, CycleRecord, Orchestrator, OrchestratorConfig,
    SystemStatus, DEPENDENCIES_FAILED,
};
pub use result::{AgentResult, StageStatus};
pub use stage::{Stage, StageInput, StageName, StagePayload};
pub use step::{ExecutionPlan, ExecutionStep};
