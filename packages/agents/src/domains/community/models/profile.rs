use crate::common::{Record, RecordExt, RecordId};
use crate::kernel::{StageStore, Table};

pub const ROLE_PROVIDER: &str = "provider";
pub const ROLE_SEEKER: &str = "seeker";

pub const DEFAULT_RADIUS_METERS: f64 = 5000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub id: RecordId,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<String>,
    pub skills: Vec<String>,
    pub offered_categories: Vec<String>,
    pub radius_meters: f64,
}

impl Profile {
    pub fn from_record(record: &Record) -> Option<Self> {
        Some(Self {
            id: record.id_field("id")?,
            display_name: record.str_field("display_name").map(str::to_string),
            email: record.str_field("email").map(str::to_string),
            roles: record.str_list("roles"),
            skills: record.str_list("skills"),
            offered_categories: record.str_list("offered_categories"),
            radius_meters: record
                .f64_field("radius_meters")
                .unwrap_or(DEFAULT_RADIUS_METERS),
        })
    }

    pub async fn find_all(store: &StageStore<'_>) -> Vec<Self> {
        store
            .select_all(Table::Profiles)
            .await
            .iter()
            .filter_map(Self::from_record)
            .collect()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Authors of requests: anyone who is not a provider, or who is also a seeker.
    pub fn is_seeker(&self) -> bool {
        !self.has_role(ROLE_PROVIDER) || self.has_role(ROLE_SEEKER)
    }

    /// Providers with at least one skill.
    pub fn is_available_volunteer(&self) -> bool {
        self.has_role(ROLE_PROVIDER) && !self.skills.is_empty()
    }

    pub fn display_label(&self) -> String {
        self.display_name
            .clone()
            .unwrap_or_else(|| "Anonymous".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::into_record;
    use serde_json::json;

    fn profile(value: serde_json::Value) -> Profile {
        Profile::from_record(&into_record(value)).unwrap()
    }

    #[test]
    fn test_seeker_rules() {
        assert!(profile(json!({"id": "a", "roles": []})).is_seeker());
        assert!(profile(json!({"id": "a", "roles": ["seeker"]})).is_seeker());
        assert!(profile(json!({"id": "a", "roles": ["provider", "seeker"]})).is_seeker());
        assert!(!profile(json!({"id": "a", "roles": ["provider"]})).is_seeker());
    }

    #[test]
    fn test_volunteer_needs_provider_role_and_skills() {
        assert!(profile(json!({"id": "a", "roles": ["provider"], "skills": ["cooking"]}))
            .is_available_volunteer());
        assert!(!profile(json!({"id": "a", "roles": ["provider"], "skills": []}))
            .is_available_volunteer());
        assert!(!profile(json!({"id": "a", "roles": ["seeker"], "skills": ["cooking"]}))
            .is_available_volunteer());
    }

    #[test]
    fn test_radius_defaults() {
        assert_eq!(profile(json!({"id": "a"})).radius_meters, DEFAULT_RADIUS_METERS);
        assert_eq!(
            profile(json!({"id": "a", "radius_meters": 0})).radius_meters,
            0.0
        );
    }
}
