//! Pure utility functions for event urgency and support detection
//!
//! These functions contain NO side effects. Time-dependent checks take the
//! number of whole days until the event (floored, negative for past events)
//! instead of reading the clock.

use chrono::{DateTime, Utc};

/// Capacity utilization assumed for every event until attendance data exists.
pub const PLACEHOLDER_CAPACITY_UTILIZATION: f64 = 0.5;

/// Utilization above this means the event needs support
pub const SUPPORT_UTILIZATION_THRESHOLD: f64 = 0.8;

/// Utilization above this makes the event urgent
pub const URGENT_UTILIZATION_THRESHOLD: f64 = 0.9;

/// Events larger than this need volunteers
pub const VOLUNTEER_CAPACITY_THRESHOLD: f64 = 50.0;

pub const URGENT_WITHIN_DAYS: i64 = 7;

/// Description phrases that signal a resource request
pub const RESOURCE_KEYWORDS: [&str; 5] = ["need", "require", "looking for", "seeking", "help"];

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Whole days from `now` until `start`, rounded down.
pub fn days_until(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (start - now).num_milliseconds().div_euclid(MILLIS_PER_DAY)
}

/// Urgency in [0, 1] from proximity and utilization.
///
/// Algorithm:
/// - days <= 7 -> +0.8, days <= 14 -> +0.5, days <= 30 -> +0.2
/// - utilization > 0.9 -> +0.7, utilization > 0.8 -> +0.4
/// - capped at 1.0
pub fn urgency_score(days_until_event: Option<i64>, capacity_utilization: f64) -> f64 {
    let mut score = 0.0;

    if let Some(days) = days_until_event {
        if days <= 7 {
            score += 0.8;
        } else if days <= 14 {
            score += 0.5;
        } else if days <= 30 {
            score += 0.2;
        }
    }

    if capacity_utilization > URGENT_UTILIZATION_THRESHOLD {
        score += 0.7;
    } else if capacity_utilization > SUPPORT_UTILIZATION_THRESHOLD {
        score += 0.4;
    }

    f64::min(score, 1.0)
}

pub fn needs_volunteers(capacity: Option<f64>) -> bool {
    capacity.is_some_and(|c| c > VOLUNTEER_CAPACITY_THRESHOLD)
}

pub fn needs_resources(description: &str) -> bool {
    let description = description.to_lowercase();
    RESOURCE_KEYWORDS.iter().any(|k| description.contains(k))
}

/// Past events never need support.
pub fn needs_support(
    is_past: bool,
    capacity_utilization: f64,
    needs_volunteers: bool,
    needs_resources: bool,
) -> bool {
    if is_past {
        return false;
    }
    capacity_utilization > SUPPORT_UTILIZATION_THRESHOLD || needs_volunteers || needs_resources
}

/// Urgent: starts within the next week (today included), or nearly full.
pub fn is_urgent(days_until_event: Option<i64>, capacity_utilization: f64) -> bool {
    let soon = days_until_event.is_some_and(|d| (0..=URGENT_WITHIN_DAYS).contains(&d));
    soon || capacity_utilization > URGENT_UTILIZATION_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_days_until_floors() {
        assert_eq!(days_until(now() + Duration::hours(36), now()), 1);
        assert_eq!(days_until(now() + Duration::hours(23), now()), 0);
        assert_eq!(days_until(now() - Duration::hours(1), now()), -1);
        assert_eq!(days_until(now() - Duration::hours(25), now()), -2);
    }

    #[test]
    fn test_five_days_out_nearly_full_is_max_urgency() {
        assert_eq!(urgency_score(Some(5), 0.95), 1.0);
        assert!(is_urgent(Some(5), 0.95));
    }

    #[test]
    fn test_urgency_bands() {
        assert_eq!(urgency_score(Some(7), 0.5), 0.8);
        assert_eq!(urgency_score(Some(8), 0.5), 0.5);
        assert_eq!(urgency_score(Some(14), 0.5), 0.5);
        assert_eq!(urgency_score(Some(30), 0.5), 0.2);
        assert_eq!(urgency_score(Some(31), 0.5), 0.0);
        assert_eq!(urgency_score(None, 0.85), 0.4);
        assert_eq!(urgency_score(None, 0.95), 0.7);
        assert!((urgency_score(Some(20), 0.85) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_urgency_never_exceeds_one() {
        for days in -5..40 {
            for utilization in [0.0, 0.5, 0.85, 0.95, 1.5] {
                let score = urgency_score(Some(days), utilization);
                assert!((0.0..=1.0).contains(&score));
            }
        }
    }

    #[test]
    fn test_is_urgent_window() {
        assert!(is_urgent(Some(0), 0.5));
        assert!(is_urgent(Some(7), 0.5));
        assert!(!is_urgent(Some(8), 0.5));
        assert!(!is_urgent(Some(-1), 0.5));
        assert!(!is_urgent(None, PLACEHOLDER_CAPACITY_UTILIZATION));
    }

    #[test]
    fn test_needs_volunteers_threshold() {
        assert!(needs_volunteers(Some(51.0)));
        assert!(!needs_volunteers(Some(50.0)));
        assert!(!needs_volunteers(None));
    }

    #[test]
    fn test_needs_resources_keywords() {
        assert!(needs_resources("We NEED chairs"));
        assert!(needs_resources("looking for tables"));
        assert!(!needs_resources("A quiet picnic"));
    }

    #[test]
    fn test_past_events_never_need_support() {
        assert!(!needs_support(true, 0.95, true, true));
        assert!(needs_support(false, 0.5, false, true));
        assert!(needs_support(false, 0.85, false, false));
        assert!(!needs_support(false, 0.5, false, false));
    }
}
