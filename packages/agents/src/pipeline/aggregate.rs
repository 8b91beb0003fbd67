//! Pure read-only analysis of one cycle's results.
//!
//! Insights only look at stages that Completed; a failed or skipped stage
//! contributes to the summary counts and the recommendations, nothing else.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::result::{AgentResult, StageStatus};
use super::stage::{StageName, StagePayload};

/// Stages slower than this (seconds) trigger an optimization recommendation.
pub const SLOW_STAGE_SECONDS: f64 = 30.0;

/// More created shortage needs than this trigger an alert recommendation.
pub const SHORTAGE_ALERT_THRESHOLD: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub total_agents: usize,
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total_execution_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleAggregate {
    pub cycle_id: String,
    pub timestamp: DateTime<Utc>,
    pub cycle_summary: CycleSummary,
    pub agent_results: BTreeMap<String, AgentResult>,
    pub insights: Vec<String>,
    pub recommendations: Vec<String>,
}

impl CycleAggregate {
    pub fn result(&self, stage: StageName) -> Option<&AgentResult> {
        self.agent_results.get(stage.as_str())
    }
}

pub fn aggregate_results(
    cycle_id: impl Into<String>,
    timestamp: DateTime<Utc>,
    results: &[AgentResult],
) -> CycleAggregate {
    CycleAggregate {
        cycle_id: cycle_id.into(),
        timestamp,
        cycle_summary: summarize(results),
        agent_results: results
            .iter()
            .map(|r| (r.stage_name.clone(), r.clone()))
            .collect(),
        insights: generate_insights(results),
        recommendations: generate_recommendations(results),
    }
}

pub fn summarize(results: &[AgentResult]) -> CycleSummary {
    let count = |status: StageStatus| results.iter().filter(|r| r.status == status).count();
    CycleSummary {
        total_agents: results.len(),
        completed: count(StageStatus::Completed),
        failed: count(StageStatus::Failed),
        skipped: count(StageStatus::Skipped),
        total_execution_time: results.iter().filter_map(|r| r.execution_time).sum(),
    }
}

fn completed_payloads(results: &[AgentResult]) -> impl Iterator<Item = &StagePayload> {
    results
        .iter()
        .filter(|r| r.status == StageStatus::Completed)
        .filter_map(|r| r.payload.as_ref())
}

pub fn generate_insights(results: &[AgentResult]) -> Vec<String> {
    let mut insights = Vec::new();

    for payload in completed_payloads(results) {
        if let StagePayload::SupplyDemand(report) = payload {
            let shortages = report.shortage_categories.len();
            if shortages > 0 {
                insights.push(format!(
                    "Detected {} categories with supply shortages",
                    shortages
                ));
            }
        }
    }

    for payload in completed_payloads(results) {
        if let StagePayload::OrgSync(report) = payload {
            let urgent = report.urgent_needs.len();
            if urgent > 0 {
                insights.push(format!("Found {} urgent organizational needs", urgent));
            }
        }
    }

    for payload in completed_payloads(results) {
        if let StagePayload::VolunteerMatch(report) = payload {
            if report.matches_found > 0 {
                insights.push(format!(
                    "Generated {} volunteer-seeker matches",
                    report.matches_found
                ));
            }
        }
    }

    for payload in completed_payloads(results) {
        if let StagePayload::EventAnalysis(report) = payload {
            if report.total_events > 0 {
                insights.push(format!(
                    "Analyzed {} events, {} urgent",
                    report.total_events, report.urgent_events
                ));
            }
        }
    }

    insights
}

pub fn generate_recommendations(results: &[AgentResult]) -> Vec<String> {
    let mut recommendations = Vec::new();

    let failed: Vec<&str> = results
        .iter()
        .filter(|r| r.status == StageStatus::Failed)
        .map(|r| r.stage_name.as_str())
        .collect();
    if !failed.is_empty() {
        recommendations.push(format!(
            "Review and fix {} failed agents: {}",
            failed.len(),
            failed.join(", ")
        ));
    }

    let any_slow = results
        .iter()
        .any(|r| r.execution_time.is_some_and(|t| t > SLOW_STAGE_SECONDS));
    if any_slow {
        recommendations.push("Consider optimizing slow-running agents".to_string());
    }

    let shortage_alerts: usize = completed_payloads(results)
        .filter_map(|p| match p {
            StagePayload::SupplyDemand(report) => Some(report.created_needs.len()),
            _ => None,
        })
        .sum();
    if shortage_alerts > SHORTAGE_ALERT_THRESHOLD {
        recommendations
            .push("High number of shortage alerts - consider immediate action".to_string());
    }

    for result in results {
        let failures = result.storage_failures();
        if failures > 0 {
            recommendations.push(format!(
                "Check storage connectivity: {} failed storage operations in {}",
                failures, result.stage_name
            ));
        }
    }

    recommendations
}
