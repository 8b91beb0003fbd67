use serde::{Deserialize, Serialize};

use crate::common::{Record, RecordExt};
use crate::kernel::{StageStore, Table};

/// Used when no category row exists at all.
pub const FALLBACK_CATEGORY_ID: i64 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub slug: String,
    pub title: String,
}

impl Category {
    pub fn from_record(record: &Record) -> Option<Self> {
        let id = record.i64_field("id")?;
        let slug = record.str_field("slug")?.to_string();
        let title = record.text_or("title", &slug);
        Some(Self { id, slug, title })
    }

    pub async fn find_all(store: &StageStore<'_>) -> Vec<Self> {
        store
            .select_all(Table::Categories)
            .await
            .iter()
            .filter_map(Self::from_record)
            .collect()
    }

    /// Posts reference categories by slug or by id.
    pub fn matches_key(&self, key: &str) -> bool {
        self.slug == key || self.id.to_string() == key
    }
}

/// Category id for `slug`: the matching row, else the first row, else [`FALLBACK_CATEGORY_ID`].
pub fn resolve_category_id(categories: &[Category], slug: &str) -> i64 {
    categories
        .iter()
        .find(|c| c.slug == slug)
        .or_else(|| categories.first())
        .map_or(FALLBACK_CATEGORY_ID, |c| c.id)
}
