//! Pure utility functions for organization urgency
//!
//! These functions contain NO side effects - they decide when an
//! organization's reported state is an urgent need and how urgent it is.

use serde::{Deserialize, Serialize};

/// Capacity below this percentage is critical
pub const CRITICAL_CAPACITY_PERCENT: f64 = 20.0;

/// Item shortages at capacity below this percentage are high urgency
pub const LOW_CAPACITY_PERCENT: f64 = 50.0;

pub const CRITICAL_WINDOW_HOURS: i64 = 12;
pub const STANDARD_WINDOW_HOURS: i64 = 24;

/// Score for urgency labels that are not recognized
pub const DEFAULT_URGENCY_SCORE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    Critical,
    High,
    Medium,
    Low,
}

impl UrgencyLevel {
    pub fn score(self) -> f64 {
        match self {
            UrgencyLevel::Critical => 0.9,
            UrgencyLevel::High => 0.7,
            UrgencyLevel::Medium => 0.5,
            UrgencyLevel::Low => 0.3,
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "critical" => Some(UrgencyLevel::Critical),
            "high" => Some(UrgencyLevel::High),
            "medium" => Some(UrgencyLevel::Medium),
            "low" => Some(UrgencyLevel::Low),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UrgencyLevel::Critical => "critical",
            UrgencyLevel::High => "high",
            UrgencyLevel::Medium => "medium",
            UrgencyLevel::Low => "low",
        }
    }
}

/// Score for a free-form urgency label (0.5 when unrecognized).
pub fn urgency_score(label: &str) -> f64 {
    UrgencyLevel::parse(label).map_or(DEFAULT_URGENCY_SCORE, UrgencyLevel::score)
}

pub fn is_capacity_critical(capacity_percent: f64, critical_below: f64) -> bool {
    capacity_percent < critical_below
}

/// Urgency of an item shortage, given how full the organization is.
pub fn item_shortage_urgency(capacity_percent: f64, low_below: f64) -> UrgencyLevel {
    if capacity_percent < low_below {
        UrgencyLevel::High
    } else {
        UrgencyLevel::Medium
    }
}

/// Critical needs get the short window.
pub fn need_window_hours(level: UrgencyLevel) -> i64 {
    if level == UrgencyLevel::Critical {
        CRITICAL_WINDOW_HOURS
    } else {
        STANDARD_WINDOW_HOURS
    }
}

/// Category slug an organization type reports needs under.
pub fn category_slug_for_org_type(org_type: &str) -> &'static str {
    match org_type.trim().to_ascii_lowercase().as_str() {
        "foodbank" | "food_bank" | "pantry" | "food" => "food",
        "shelter" | "housing" => "housing",
        "clinic" | "health" | "healthcare" => "healthcare",
        "school" | "tutoring" | "education" => "education",
        "transit" | "transportation" => "transportation",
        _ => "general",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency_mapping() {
        assert_eq!(urgency_score("critical"), 0.9);
        assert_eq!(urgency_score("high"), 0.7);
        assert_eq!(urgency_score("medium"), 0.5);
        assert_eq!(urgency_score("low"), 0.3);
        assert_eq!(urgency_score("whenever"), DEFAULT_URGENCY_SCORE);
        assert_eq!(urgency_score("HIGH"), 0.7);
    }

    #[test]
    fn test_capacity_critical_boundary() {
        assert!(is_capacity_critical(15.0, CRITICAL_CAPACITY_PERCENT));
        assert!(is_capacity_critical(19.9, CRITICAL_CAPACITY_PERCENT));
        assert!(!is_capacity_critical(20.0, CRITICAL_CAPACITY_PERCENT));
    }

    #[test]
    fn test_item_shortage_urgency() {
        assert_eq!(
            item_shortage_urgency(25.0, LOW_CAPACITY_PERCENT),
            UrgencyLevel::High
        );
        assert_eq!(
            item_shortage_urgency(50.0, LOW_CAPACITY_PERCENT),
            UrgencyLevel::Medium
        );
    }

    #[test]
    fn test_windows() {
        assert_eq!(need_window_hours(UrgencyLevel::Critical), 12);
        assert_eq!(need_window_hours(UrgencyLevel::High), 24);
        assert_eq!(need_window_hours(UrgencyLevel::Medium), 24);
    }

    #[test]
    fn test_org_type_slugs() {
        assert_eq!(category_slug_for_org_type("foodbank"), "food");
        assert_eq!(category_slug_for_org_type("Clinic"), "healthcare");
        assert_eq!(category_slug_for_org_type("library"), "general");
    }
}
