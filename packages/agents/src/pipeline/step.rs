use serde::Serialize;

use super::stage::StageName;

/// One step of the execution plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionStep {
    pub name: StageName,
    pub description: String,
    pub dependencies: Vec<StageName>,
}

impl ExecutionStep {
    pub fn new(name: StageName, description: &str, dependencies: &[StageName]) -> Self {
        Self {
            name,
            description: description.to_string(),
            dependencies: dependencies.to_vec(),
        }
    }
}

/// Ordered steps. Every dependency appears before its dependent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionPlan {
    pub steps: Vec<ExecutionStep>,
}

impl ExecutionPlan {
    pub fn default_plan() -> Self {
        Self {
            steps: vec![
                ExecutionStep::new(
                    StageName::OrgSync,
                    "Sync organization data and identify urgent needs",
                    &[],
                ),
                ExecutionStep::new(
                    StageName::EventAnalysis,
                    "Analyze events for support needs and urgency",
                    &[],
                ),
                ExecutionStep::new(
                    StageName::SupplyDemand,
                    "Analyze supply/demand balance and create top needs",
                    &[StageName::OrgSync, StageName::EventAnalysis],
                ),
                ExecutionStep::new(
                    StageName::VolunteerMatch,
                    "Match volunteers with seekers and create help offers",
                    &[StageName::SupplyDemand],
                ),
            ],
        }
    }

    pub fn step(&self, name: StageName) -> Option<&ExecutionStep> {
        self.steps.iter().find(|s| s.name == name)
    }
}

impl Default for ExecutionPlan {
    fn default() -> Self {
        Self::default_plan()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_plan_orders_dependencies_first() {
        let plan = ExecutionPlan::default_plan();
        for (index, step) in plan.steps.iter().enumerate() {
            for dep in &step.dependencies {
                let dep_index = plan.steps.iter().position(|s| s.name == *dep).unwrap();
                assert!(dep_index < index, "{} runs before {}", step.name, dep);
            }
        }
    }

    #[test]
    fn test_default_plan_dependencies() {
        let plan = ExecutionPlan::default_plan();
        assert_eq!(
            plan.step(StageName::SupplyDemand).unwrap().dependencies,
            vec![StageName::OrgSync, StageName::EventAnalysis]
        );
        assert_eq!(
            plan.step(StageName::VolunteerMatch).unwrap().dependencies,
            vec![StageName::SupplyDemand]
        );
        assert!(plan.step(StageName::OrgSync).unwrap().dependencies.is_empty());
    }
}
