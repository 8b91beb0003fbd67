use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use typed_builder::TypedBuilder;

use crate::common::{Record, RecordExt, RecordId};
use crate::kernel::{Filters, Lookup, StageStore, Table};

pub const OFFER_STATUS_PENDING: &str = "pending";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelpOffer {
    pub id: Option<RecordId>,
    pub post_id: RecordId,
    pub helper_id: RecordId,
    pub status: String,
    pub offered_at: Option<String>,
}

/// A pending offer from `helper_id` on `post_id`.
#[derive(Debug, Clone, TypedBuilder)]
pub struct HelpOfferDraft {
    pub post_id: RecordId,
    pub helper_id: RecordId,
    pub offered_at: DateTime<Utc>,
    #[builder(default = OFFER_STATUS_PENDING.to_string(), setter(into))]
    pub status: String,
}

pub enum OfferOutcome {
    Created(HelpOffer),
    Existing(HelpOffer),
    NotCreated,
}

impl HelpOffer {
    pub fn from_record(record: &Record) -> Option<Self> {
        Some(Self {
            id: record.id_field("id"),
            post_id: record.id_field("post_id")?,
            helper_id: record.id_field("helper_id")?,
            status: record.text_or("status", OFFER_STATUS_PENDING),
            offered_at: record.str_field("offered_at").map(str::to_string),
        })
    }

    fn pair_filter(post_id: &RecordId, helper_id: &RecordId) -> Filters {
        Filters::new()
            .eq("post_id", post_id.to_value())
            .eq("helper_id", helper_id.to_value())
    }

    /// At most one offer per (post, helper): returns the stored one when present.
    pub async fn find_or_create(draft: HelpOfferDraft, store: &StageStore<'_>) -> OfferOutcome {
        let filter = Self::pair_filter(&draft.post_id, &draft.helper_id);
        match store.lookup(Table::HelpOffer, &filter).await {
            Lookup::Found(row) => {
                return match Self::from_record(&row) {
                    Some(offer) => OfferOutcome::Existing(offer),
                    None => OfferOutcome::NotCreated,
                }
            }
            Lookup::Failed => return OfferOutcome::NotCreated,
            Lookup::Missing => {}
        }

        let mut record = Record::new();
        record.insert("post_id".into(), draft.post_id.to_value());
        record.insert("helper_id".into(), draft.helper_id.to_value());
        record.insert("offered_at".into(), Value::from(draft.offered_at.to_rfc3339()));
        record.insert("status".into(), Value::from(draft.status));

        match store.insert(Table::HelpOffer, record).await {
            Some(row) => match Self::from_record(&row) {
                Some(offer) => OfferOutcome::Created(offer),
                None => OfferOutcome::NotCreated,
            },
            None => OfferOutcome::NotCreated,
        }
    }
}
