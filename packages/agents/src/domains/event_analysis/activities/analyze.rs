//! Event analysis activity.
//!
//! Pipeline:
//! 1. Assess every event (urgency, support needs)
//! 2. Create one open support post per event needing support (idempotent on title)
//! 3. Raise a 7-day TopNeed per urgent event

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::common::{Record, RecordExt};
use crate::domains::community::{resolve_category_id, Category, Event, STATUS_OPEN};
use crate::domains::event_analysis::models::{EventAssessment, SupportPost, SupportPostKind};
use crate::domains::event_analysis::utils::{
    days_until, is_urgent, needs_resources, needs_support, needs_volunteers, urgency_score,
};
use crate::domains::event_analysis::EventAnalysisConfig;
use crate::domains::top_needs::TopNeed;
use crate::kernel::{Filters, Lookup, StageStore, Table};
use crate::pipeline::StageName;

/// Assess one event. Pure.
pub fn assess_event(
    event: &Event,
    config: &EventAnalysisConfig,
    now: DateTime<Utc>,
) -> EventAssessment {
    let days = event.start_at.map(|start| days_until(start, now));
    let is_past = event.start_at.is_some_and(|start| start < now);
    let utilization = config.capacity_utilization;
    let volunteers = needs_volunteers(event.capacity);
    let resources = needs_resources(&event.description);

    EventAssessment {
        event_id: event.id.clone(),
        title: event
            .title
            .clone()
            .unwrap_or_else(|| "Untitled Event".to_string()),
        start_at: event.start_at_raw.clone(),
        capacity: event.capacity,
        location: event.location().to_string(),
        org_id: event.org_id.clone(),
        days_until_event: days,
        needs_volunteers: volunteers,
        needs_resources: resources,
        capacity_utilization: utilization,
        urgency_score: urgency_score(days, utilization),
        needs_support: needs_support(is_past, utilization, volunteers, resources),
        is_urgent: is_urgent(days, utilization),
    }
}

/// Post content for an event needing support. Volunteer requests win over resource requests.
pub fn support_post_for(event: &Event, assessment: &EventAssessment) -> SupportPost {
    let event_title = event.title.as_deref().unwrap_or("Community Event");
    let (post_type, title, description) = if assessment.needs_volunteers {
        (
            SupportPostKind::VolunteerRequest,
            format!("Volunteers needed for: {}", event_title),
            format!("Help make this event successful! {}", event.description),
        )
    } else {
        (
            SupportPostKind::ResourceRequest,
            format!("Resources needed for: {}", event_title),
            format!(
                "Support this event with needed resources. {}",
                event.description
            ),
        )
    };
    SupportPost {
        id: None,
        event_id: event.id.clone(),
        post_type,
        title,
        description: description.trim_end().to_string(),
        location_text: event.location().to_string(),
    }
}

pub enum PostOutcome {
    Created(SupportPost),
    AlreadyExists,
    NotCreated,
}

/// Insert the support post unless an open post with the same title exists.
pub async fn create_support_post(
    event: &Event,
    post: SupportPost,
    config: &EventAnalysisConfig,
    now: DateTime<Utc>,
    store: &StageStore<'_>,
) -> PostOutcome {
    let existing = Filters::new()
        .eq("title", post.title.as_str())
        .eq("status", STATUS_OPEN);
    match store.lookup(Table::Posts, &existing).await {
        Lookup::Found(_) => {
            debug!(title = %post.title, "Support post already open");
            return PostOutcome::AlreadyExists;
        }
        Lookup::Failed => return PostOutcome::NotCreated,
        Lookup::Missing => {}
    }

    let mut record = Record::new();
    record.insert("title".into(), Value::from(post.title.clone()));
    record.insert("description".into(), Value::from(post.description.clone()));
    record.insert(
        "categories".into(),
        Value::from(config.events_category_slug.clone()),
    );
    record.insert("is_free".into(), Value::Bool(false));
    record.insert("location_text".into(), Value::from(post.location_text.clone()));
    if let Some(org_id) = &event.org_id {
        record.insert("org_id".into(), org_id.to_value());
    }
    record.insert("status".into(), Value::from(STATUS_OPEN));
    record.insert("created_at".into(), Value::from(now.to_rfc3339()));

    match store.insert(Table::Posts, record).await {
        Some(row) => {
            info!(title = %post.title, "Generated support post for event");
            PostOutcome::Created(SupportPost {
                id: row.id_field("id"),
                ..post
            })
        }
        None => PostOutcome::NotCreated,
    }
}

pub async fn create_event_need(
    event: &Event,
    assessment: &EventAssessment,
    categories: &[Category],
    config: &EventAnalysisConfig,
    now: DateTime<Utc>,
    store: &StageStore<'_>,
) -> Option<TopNeed> {
    let details = json!({
        "event_id": event.id,
        "event_title": event.title.as_deref().unwrap_or("Unknown Event"),
        "start_at": event.start_at_raw,
        "capacity": event.capacity,
        "needs_volunteers": assessment.needs_volunteers,
        "needs_resources": assessment.needs_resources,
        "source": StageName::EventAnalysis.as_str(),
    });
    TopNeed::new(
        event.location(),
        resolve_category_id(categories, &config.events_category_slug),
        assessment.urgency_score,
        details,
        config.need_window_hours,
        now,
    )
    .create(store)
    .await
}
