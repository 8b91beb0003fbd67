use serde_json::Value;

use crate::common::{Record, RecordExt, RecordId};
use crate::kernel::{Filters, StageStore, Table};

pub const STATUS_OPEN: &str = "open";

/// A community post. `is_free = true` is an offer, `false` is a request.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    /// Category slug or id, as stored in `categories`
    pub category: Option<String>,
    pub is_free: bool,
    pub status: Option<String>,
    pub author_id: Option<RecordId>,
    pub location_text: Option<String>,
}

impl Post {
    pub fn from_record(record: &Record) -> Option<Self> {
        let category = match record.get("categories") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        Some(Self {
            id: record.id_field("id")?,
            title: record.text_or("title", ""),
            description: record.text_or("description", ""),
            category,
            is_free: record.bool_field("is_free").unwrap_or(true),
            status: record.str_field("status").map(str::to_string),
            author_id: record.id_field("author_id"),
            location_text: record.str_field("location_text").map(str::to_string),
        })
    }

    pub async fn find_open(store: &StageStore<'_>) -> Vec<Self> {
        store
            .select(Table::Posts, &Filters::new().eq("status", STATUS_OPEN))
            .await
            .iter()
            .filter_map(Self::from_record)
            .collect()
    }

    pub fn is_request(&self) -> bool {
        !self.is_free
    }

    pub fn is_offer(&self) -> bool {
        self.is_free
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::into_record;
    use serde_json::json;

    #[test]
    fn test_is_free_defaults_to_offer() {
        let post = Post::from_record(&into_record(json!({"id": "p1"}))).unwrap();
        assert!(post.is_offer());
        assert_eq!(post.category, None);
    }

    #[test]
    fn test_numeric_category_is_kept_as_key() {
        let post =
            Post::from_record(&into_record(json!({"id": "p1", "categories": 7, "is_free": false})))
                .unwrap();
        assert_eq!(post.category.as_deref(), Some("7"));
        assert!(post.is_request());
    }

    #[test]
    fn test_post_without_id_is_skipped() {
        assert!(Post::from_record(&into_record(json!({"title": "x"}))).is_none());
    }
}
