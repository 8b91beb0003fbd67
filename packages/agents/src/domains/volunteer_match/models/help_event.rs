use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use typed_builder::TypedBuilder;

use crate::common::{Record, RecordExt, RecordId};
use crate::domains::community::EVENT_TYPE_VOLUNTEER_HELP;
use crate::kernel::{Filters, Lookup, StageStore, Table};

pub const EVENT_STATUS_SCHEDULED: &str = "scheduled";

/// A help session scheduled from a help offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelpEvent {
    pub id: Option<RecordId>,
    pub title: String,
    pub start_at: Option<String>,
    pub end_at: Option<String>,
    pub help_offer_id: RecordId,
    pub post_id: Option<RecordId>,
}

#[derive(Debug, Clone, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct HelpEventDraft {
    pub title: String,
    pub description: String,
    pub location_text: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub created_by: RecordId,
    pub help_offer_id: RecordId,
    pub post_id: RecordId,
    pub match_confidence: f64,
    pub skills_involved: Vec<String>,
    pub match_type: String,
    pub created_at: DateTime<Utc>,
}

impl HelpEventDraft {
    fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("title".into(), Value::from(self.title.clone()));
        record.insert("description".into(), Value::from(self.description.clone()));
        record.insert("location_text".into(), Value::from(self.location_text.clone()));
        record.insert("start_at".into(), Value::from(self.start_at.to_rfc3339()));
        record.insert("end_at".into(), Value::from(self.end_at.to_rfc3339()));
        record.insert("created_by".into(), self.created_by.to_value());
        record.insert("event_type".into(), Value::from(EVENT_TYPE_VOLUNTEER_HELP));
        record.insert("status".into(), Value::from(EVENT_STATUS_SCHEDULED));
        record.insert("help_offer_id".into(), self.help_offer_id.to_value());
        record.insert("post_id".into(), self.post_id.to_value());
        record.insert(
            "metadata".into(),
            json!({
                "match_confidence": self.match_confidence,
                "skills_involved": self.skills_involved,
                "match_type": self.match_type,
                "auto_created": true,
            }),
        );
        record.insert("created_at".into(), Value::from(self.created_at.to_rfc3339()));
        record
    }
}

pub enum EventOutcome {
    Created(HelpEvent),
    Existing(HelpEvent),
    NotCreated,
}

impl HelpEvent {
    pub fn from_record(record: &Record) -> Option<Self> {
        Some(Self {
            id: record.id_field("id"),
            title: record.text_or("title", ""),
            start_at: record.str_field("start_at").map(str::to_string),
            end_at: record.str_field("end_at").map(str::to_string),
            help_offer_id: record.id_field("help_offer_id")?,
            post_id: record.id_field("post_id"),
        })
    }

    /// One event per help offer.
    pub async fn find_or_create(draft: HelpEventDraft, store: &StageStore<'_>) -> EventOutcome {
        let filter = Filters::new().eq("help_offer_id", draft.help_offer_id.to_value());
        match store.lookup(Table::Events, &filter).await {
            Lookup::Found(row) => {
                return match Self::from_record(&row) {
                    Some(event) => EventOutcome::Existing(event),
                    None => EventOutcome::NotCreated,
                }
            }
            Lookup::Failed => return EventOutcome::NotCreated,
            Lookup::Missing => {}
        }

        let Some(row) = store.insert(Table::Events, draft.to_record()).await else {
            return EventOutcome::NotCreated;
        };
        match Self::from_record(&row) {
            Some(event) => {
                info!(
                    title = %event.title,
                    help_offer_id = %event.help_offer_id,
                    "Created volunteer help event"
                );
                EventOutcome::Created(event)
            }
            None => EventOutcome::NotCreated,
        }
    }
}

/// Role and status of one side of a help session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantRole {
    /// Made the offer, so already accepted
    Volunteer,
    /// Must accept the invitation
    Recipient,
}

impl ParticipantRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ParticipantRole::Volunteer => "volunteer",
            ParticipantRole::Recipient => "recipient",
        }
    }

    pub fn initial_status(self) -> &'static str {
        match self {
            ParticipantRole::Volunteer => "accepted",
            ParticipantRole::Recipient => "invited",
        }
    }
}

/// Add `user_id` to the event unless already present. Returns whether a row was inserted.
pub async fn add_participant(
    event_id: &RecordId,
    user_id: &RecordId,
    role: ParticipantRole,
    now: DateTime<Utc>,
    store: &StageStore<'_>,
) -> bool {
    let filter = Filters::new()
        .eq("event_id", event_id.to_value())
        .eq("user_id", user_id.to_value());
    if !matches!(
        store.lookup(Table::EventParticipants, &filter).await,
        Lookup::Missing
    ) {
        return false;
    }

    let mut record = Record::new();
    record.insert("event_id".into(), event_id.to_value());
    record.insert("user_id".into(), user_id.to_value());
    record.insert("role".into(), Value::from(role.as_str()));
    record.insert("status".into(), Value::from(role.initial_status()));
    record.insert("created_at".into(), Value::from(now.to_rfc3339()));
    store.insert(Table::EventParticipants, record).await.is_some()
}
