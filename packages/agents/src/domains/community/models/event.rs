use chrono::{DateTime, Utc};

use crate::common::{Record, RecordExt, RecordId};
use crate::kernel::{StageStore, Table};

/// `event_type` of the help sessions scheduled from volunteer matches.
pub const EVENT_TYPE_VOLUNTEER_HELP: &str = "volunteer_help";

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: Option<RecordId>,
    pub title: Option<String>,
    pub description: String,
    pub start_at: Option<DateTime<Utc>>,
    /// Raw `start_at` as stored, echoed back in reports
    pub start_at_raw: Option<String>,
    pub capacity: Option<f64>,
    pub location_text: Option<String>,
    pub org_id: Option<RecordId>,
    pub event_type: Option<String>,
}

impl Event {
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.id_field("id"),
            title: record.str_field("title").map(str::to_string),
            description: record.text_or("description", ""),
            start_at: record.datetime_field("start_at"),
            start_at_raw: record.str_field("start_at").map(str::to_string),
            capacity: record.f64_field("capacity"),
            location_text: record.str_field("location_text").map(str::to_string),
            org_id: record.id_field("org_id"),
            event_type: record.str_field("event_type").map(str::to_string),
        }
    }

    pub async fn find_all(store: &StageStore<'_>) -> Vec<Self> {
        store
            .select_all(Table::Events)
            .await
            .iter()
            .map(Self::from_record)
            .collect()
    }

    /// Events open to the community, without the scheduled help sessions.
    pub async fn find_community_events(store: &StageStore<'_>) -> Vec<Self> {
        Self::find_all(store)
            .await
            .into_iter()
            .filter(|event| !event.is_volunteer_help())
            .collect()
    }

    pub fn is_volunteer_help(&self) -> bool {
        self.event_type.as_deref() == Some(EVENT_TYPE_VOLUNTEER_HELP)
    }

    pub fn location(&self) -> &str {
        self.location_text.as_deref().unwrap_or("Unknown")
    }
}
