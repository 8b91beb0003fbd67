use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::common::{Record, RecordExt, RecordId};
use crate::kernel::{StageStore, Table};

pub const UNKNOWN_LOCATION: &str = "Unknown";

/// A persisted, time-windowed need signal. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopNeed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub location: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub category_id: i64,
    /// Always within [0, 1]
    pub score: f64,
    pub details: Value,
    pub created_at: DateTime<Utc>,
}

/// NaN reads as 0.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

impl TopNeed {
    /// A need open from `now` for `window_hours`. Blank locations become "Unknown".
    pub fn new(
        location: &str,
        category_id: i64,
        score: f64,
        details: Value,
        window_hours: i64,
        now: DateTime<Utc>,
    ) -> Self {
        let location = match location.trim() {
            "" => UNKNOWN_LOCATION.to_string(),
            trimmed => trimmed.to_string(),
        };
        Self {
            id: None,
            location,
            window_start: now,
            window_end: now + Duration::hours(window_hours),
            category_id,
            score: clamp_score(score),
            details,
            created_at: now,
        }
    }

    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("location".into(), Value::from(self.location.clone()));
        record.insert(
            "window_start".into(),
            Value::from(self.window_start.to_rfc3339()),
        );
        record.insert("window_end".into(), Value::from(self.window_end.to_rfc3339()));
        record.insert("category_id".into(), Value::from(self.category_id));
        record.insert("score".into(), Value::from(self.score));
        record.insert("details".into(), self.details.clone());
        record.insert("created_at".into(), Value::from(self.created_at.to_rfc3339()));
        record
    }

    /// Insert and return the stored need (with its id), or `None` if the insert failed.
    pub async fn create(mut self, store: &StageStore<'_>) -> Option<Self> {
        let row = store.insert(Table::TopNeeds, self.to_record()).await?;
        self.id = row.id_field("id");
        info!(
            stage = %store.stage(),
            location = %self.location,
            category_id = self.category_id,
            score = self.score,
            "Created top need"
        );
        Some(self)
    }
}
