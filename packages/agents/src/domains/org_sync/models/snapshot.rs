use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::{into_record, RecordExt};

/// Capacity assumed when a feed does not report one.
pub const DEFAULT_CAPACITY_PERCENT: f64 = 100.0;

/// One organization's self-reported state from an external feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgFeedSnapshot {
    pub org_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub org_type: String,
    pub capacity_percent: f64,
    pub operating_hours: Option<String>,
    pub shortages: Vec<String>,
    pub location: Option<String>,
    pub phone: Option<String>,
}

impl OrgFeedSnapshot {
    /// Lenient parse. `None` when the entry has no `org_id` (or `id`).
    pub fn from_value(value: &Value) -> Option<Self> {
        let record = into_record(value.clone());
        let org_id = record
            .str_field("org_id")
            .map(str::to_string)
            .or_else(|| record.id_field("org_id").map(|id| id.to_string()))
            .or_else(|| record.id_field("id").map(|id| id.to_string()))?;
        Some(Self {
            name: record.text_or("name", &org_id),
            org_type: record.text_or("type", "general"),
            capacity_percent: record
                .f64_field("capacity_percent")
                .unwrap_or(DEFAULT_CAPACITY_PERCENT),
            operating_hours: record.str_field("operating_hours").map(str::to_string),
            shortages: record.str_list("shortages"),
            location: record.str_field("location").map(str::to_string),
            phone: record.str_field("phone").map(str::to_string),
            org_id,
        })
    }
}

/// Snapshots used when a cycle is started without feed data.
pub fn sample_snapshots() -> Vec<OrgFeedSnapshot> {
    vec![
        OrgFeedSnapshot {
            org_id: "foodbank-001".to_string(),
            name: "Community Food Bank".to_string(),
            org_type: "foodbank".to_string(),
            capacity_percent: 25.0,
            operating_hours: Some("9:00-17:00".to_string()),
            shortages: vec!["canned_vegetables".to_string(), "baby_formula".to_string()],
            location: Some("Downtown".to_string()),
            phone: Some("555-0101".to_string()),
        },
        OrgFeedSnapshot {
            org_id: "shelter-001".to_string(),
            name: "Riverside Family Shelter".to_string(),
            org_type: "shelter".to_string(),
            capacity_percent: 15.0,
            operating_hours: Some("24/7".to_string()),
            shortages: Vec::new(),
            location: Some("Riverside".to_string()),
            phone: Some("555-0102".to_string()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_defaults() {
        let snapshot = OrgFeedSnapshot::from_value(&json!({"org_id": "o1"})).unwrap();
        assert_eq!(snapshot.name, "o1");
        assert_eq!(snapshot.capacity_percent, DEFAULT_CAPACITY_PERCENT);
        assert!(snapshot.shortages.is_empty());
    }

    #[test]
    fn test_from_value_accepts_numeric_strings_and_ids() {
        let snapshot =
            OrgFeedSnapshot::from_value(&json!({"id": 42, "capacity_percent": "15"})).unwrap();
        assert_eq!(snapshot.org_id, "42");
        assert_eq!(snapshot.capacity_percent, 15.0);
    }

    #[test]
    fn test_from_value_requires_id() {
        assert!(OrgFeedSnapshot::from_value(&json!({"name": "No Id"})).is_none());
        assert!(OrgFeedSnapshot::from_value(&json!("foodbank-001")).is_none());
    }
}
