use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use super::activities::{
    assess_event, create_event_need, create_support_post, support_post_for, PostOutcome,
};
use super::models::EventAnalysisReport;
use super::utils::PLACEHOLDER_CAPACITY_UTILIZATION;
use crate::domains::community::{Category, Event};
use crate::kernel::AgentDeps;
use crate::pipeline::{Stage, StageError, StageInput, StageName, StagePayload};

#[derive(Debug, Clone)]
pub struct EventAnalysisConfig {
    /// Utilization applied to every event
    pub capacity_utilization: f64,
    pub events_category_slug: String,
    pub need_window_hours: i64,
}

impl Default for EventAnalysisConfig {
    fn default() -> Self {
        Self {
            capacity_utilization: PLACEHOLDER_CAPACITY_UTILIZATION,
            events_category_slug: "events".to_string(),
            need_window_hours: 168,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventAnalysisStage {
    pub config: EventAnalysisConfig,
}

impl EventAnalysisStage {
    pub fn new(config: EventAnalysisConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Stage for EventAnalysisStage {
    fn name(&self) -> StageName {
        StageName::EventAnalysis
    }

    fn description(&self) -> &'static str {
        "Analyzes upcoming events for support needs and urgency"
    }

    async fn process(
        &self,
        _input: &StageInput,
        deps: &AgentDeps,
    ) -> Result<StagePayload, StageError> {
        let store = deps.store_for(StageName::EventAnalysis);
        let now = Utc::now();

        let events = Event::find_community_events(&store).await;
        info!(events = events.len(), "Starting event analysis");

        let assessments: Vec<_> = events
            .iter()
            .map(|event| assess_event(event, &self.config, now))
            .collect();

        let mut generated_posts = Vec::new();
        let mut existing_posts = 0;
        for (event, assessment) in events.iter().zip(&assessments) {
            if !assessment.needs_support {
                continue;
            }
            let post = support_post_for(event, assessment);
            match create_support_post(event, post, &self.config, now, &store).await {
                PostOutcome::Created(post) => generated_posts.push(post),
                PostOutcome::AlreadyExists => existing_posts += 1,
                PostOutcome::NotCreated => {}
            }
        }

        let urgent: Vec<_> = events
            .iter()
            .zip(&assessments)
            .filter(|(_, a)| a.is_urgent)
            .collect();
        let categories = if urgent.is_empty() {
            Vec::new()
        } else {
            Category::find_all(&store).await
        };
        let mut created_needs = Vec::new();
        for (event, assessment) in &urgent {
            if let Some(need) =
                create_event_need(event, assessment, &categories, &self.config, now, &store).await
            {
                created_needs.push(need);
            }
        }

        info!(
            generated_posts = generated_posts.len(),
            created_needs = created_needs.len(),
            "Event analysis completed"
        );

        Ok(StagePayload::EventAnalysis(EventAnalysisReport {
            total_events: events.len(),
            events_analyzed: assessments.len(),
            events_needing_support: assessments.iter().filter(|a| a.needs_support).count(),
            urgent_events: urgent.len(),
            generated_posts,
            existing_posts,
            created_needs,
            event_analysis: assessments,
            storage_failures: store.failures(),
            timestamp: now,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Record;
    use crate::kernel::{BaseStore, FailingStore, MemoryStore, StoreOperation, Table};
    use chrono::Duration;
    use serde_json::json;
    use std::sync::Arc;

    async fn run(stage: &EventAnalysisStage, store: Arc<dyn BaseStore>) -> EventAnalysisReport {
        let deps = AgentDeps::new(store);
        let input = StageInput::new(StageName::EventAnalysis, "analyze", Record::new());
        match stage.process(&input, &deps).await.unwrap() {
            StagePayload::EventAnalysis(report) => report,
            other => panic!("unexpected payload {other:?}"),
        }
    }

    fn seeded() -> MemoryStore {
        let soon = (Utc::now() + Duration::days(3)).to_rfc3339();
        let later = (Utc::now() + Duration::days(60)).to_rfc3339();
        let past = (Utc::now() - Duration::days(3)).to_rfc3339();
        MemoryStore::new()
            .with_rows(
                Table::Categories,
                vec![json!({"id": 1, "slug": "food"}), json!({"id": 6, "slug": "events"})],
            )
            .with_rows(
                Table::Events,
                vec![
                    json!({"id": "e1", "title": "Harvest Fair", "capacity": 200, "start_at": soon, "location_text": "Park"}),
                    json!({"id": "e2", "title": "Book Swap", "description": "looking for shelves", "start_at": later}),
                    json!({"id": "e3", "title": "Old Gala", "capacity": 300, "start_at": past}),
                ],
            )
    }

    #[tokio::test]
    async fn test_posts_and_needs_for_events() {
        let store = seeded();
        let report = run(&EventAnalysisStage::default(), Arc::new(store.clone())).await;

        assert_eq!(report.total_events, 3);
        assert_eq!(report.events_needing_support, 2);
        assert_eq!(report.urgent_events, 1);
        assert_eq!(report.generated_posts.len(), 2);
        assert_eq!(store.count(Table::Posts), 2);

        let post = store
            .rows(Table::Posts)
            .into_iter()
            .find(|p| p["title"] == json!("Volunteers needed for: Harvest Fair"))
            .unwrap();
        assert_eq!(post["categories"], json!("events"));
        assert_eq!(post["is_free"], json!(false));
        assert_eq!(post["status"], json!("open"));

        let need = &report.created_needs[0];
        assert_eq!(need.category_id, 6);
        assert_eq!(need.location, "Park");
        assert_eq!(need.score, 0.8);
        assert_eq!(need.window_end - need.window_start, Duration::hours(168));
        assert_eq!(need.details["source"], json!("event_analysis_agent"));
    }

    #[tokio::test]
    async fn test_second_run_does_not_duplicate_posts() {
        let store = seeded();
        let stage = EventAnalysisStage::default();
        run(&stage, Arc::new(store.clone())).await;
        let second = run(&stage, Arc::new(store.clone())).await;
        assert!(second.generated_posts.is_empty());
        assert_eq!(second.existing_posts, 2);
        assert_eq!(store.count(Table::Posts), 2);
    }

    #[tokio::test]
    async fn test_high_utilization_makes_every_future_event_urgent() {
        let stage = EventAnalysisStage::new(EventAnalysisConfig {
            capacity_utilization: 0.95,
            ..EventAnalysisConfig::default()
        });
        let report = run(&stage, Arc::new(seeded())).await;
        // utilization alone is urgent, past events included
        assert_eq!(report.urgent_events, 3);
        assert!(report.created_needs.iter().all(|n| n.score <= 1.0));
        let fair = report
            .event_analysis
            .iter()
            .find(|a| a.title == "Harvest Fair")
            .unwrap();
        assert_eq!(fair.urgency_score, 1.0);
    }

    #[tokio::test]
    async fn test_failed_post_lookup_skips_creation() {
        let store = FailingStore::new(seeded())
            .fail_operation(Table::Posts, StoreOperation::Select);
        let report = run(&EventAnalysisStage::default(), Arc::new(store)).await;
        assert!(report.generated_posts.is_empty());
        assert_eq!(report.storage_failures, 2);
        assert_eq!(report.created_needs.len(), 1);
    }

    #[tokio::test]
    async fn test_help_sessions_are_not_analyzed() {
        let tomorrow = (Utc::now() + Duration::days(1)).to_rfc3339();
        let store = seeded().with_rows(
            Table::Events,
            vec![json!({
                "id": "help-1",
                "title": "Volunteer Help: Math homework help",
                "description": "Volunteer help session for: Math homework help",
                "event_type": "volunteer_help",
                "start_at": tomorrow,
                "location_text": "Library",
            })],
        );
        let report = run(&EventAnalysisStage::default(), Arc::new(store.clone())).await;

        assert_eq!(report.total_events, 3);
        assert_eq!(report.urgent_events, 1);
        assert!(report
            .event_analysis
            .iter()
            .all(|a| a.title != "Volunteer Help: Math homework help"));
        assert!(store
            .rows(Table::Posts)
            .iter()
            .all(|p| !p["title"].as_str().unwrap_or("").contains("Volunteer Help")));
        assert_eq!(store.count(Table::TopNeeds), 1);
    }

    #[tokio::test]
    async fn test_no_events() {
        let report = run(&EventAnalysisStage::default(), Arc::new(MemoryStore::new())).await;
        assert_eq!(report.total_events, 0);
        assert!(report.event_analysis.is_empty());
        assert_eq!(report.storage_failures, 0);
    }
}
