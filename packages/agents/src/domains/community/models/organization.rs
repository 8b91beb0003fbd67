use crate::common::{Record, RecordExt, RecordId};
use crate::kernel::{StageStore, Table};

#[derive(Debug, Clone, PartialEq)]
pub struct Organization {
    pub id: RecordId,
    pub name: String,
    /// Service types, from `types` (array) or `type` (single value)
    pub org_types: Vec<String>,
    pub location: Option<String>,
}

impl Organization {
    pub fn from_record(record: &Record) -> Option<Self> {
        let mut org_types = record.str_list("types");
        if let Some(single) = record.str_field("type") {
            if !org_types.iter().any(|t| t == single) {
                org_types.push(single.to_string());
            }
        }
        Some(Self {
            id: record.id_field("id")?,
            name: record.text_or("name", "Unknown Organization"),
            org_types,
            location: record.str_field("location").map(str::to_string),
        })
    }

    pub async fn find_all(store: &StageStore<'_>) -> Vec<Self> {
        store
            .select_all(Table::Organization)
            .await
            .iter()
            .filter_map(Self::from_record)
            .collect()
    }

    pub fn serves(&self, slug: &str) -> bool {
        self.org_types.iter().any(|t| t == slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::into_record;
    use serde_json::json;

    #[test]
    fn test_types_merge_array_and_single() {
        let org = Organization::from_record(&into_record(
            json!({"id": "o1", "types": ["food"], "type": "shelter"}),
        ))
        .unwrap();
        assert!(org.serves("food"));
        assert!(org.serves("shelter"));
        assert!(!org.serves("healthcare"));
    }
}
