use serde::{Deserialize, Serialize};

use crate::domains::supply_demand::utils::{
    is_shortage, most_frequent, severity_score, shortage_ratio, ShortageThresholds,
};

/// Request/offer balance for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBalance {
    pub category_id: i64,
    pub category_slug: String,
    pub category_title: String,
    pub request_count: usize,
    pub offer_count: usize,
    pub shortage_ratio: f64,
    pub severity_score: f64,
    pub is_shortage: bool,
    /// Distinct request locations, in first-seen order
    pub request_locations: Vec<String>,
    /// Most frequent request location
    pub primary_location: Option<String>,
}

impl CategoryBalance {
    /// `request_locations` holds one entry per request that had a location.
    pub fn compute(
        category_id: i64,
        category_slug: &str,
        category_title: &str,
        request_count: usize,
        offer_count: usize,
        request_locations: Vec<String>,
        thresholds: &ShortageThresholds,
    ) -> Self {
        let primary_location = most_frequent(request_locations.iter().map(String::as_str));
        let mut distinct: Vec<String> = Vec::new();
        for location in request_locations {
            if !distinct.contains(&location) {
                distinct.push(location);
            }
        }
        Self {
            category_id,
            category_slug: category_slug.to_string(),
            category_title: category_title.to_string(),
            request_count,
            offer_count,
            shortage_ratio: shortage_ratio(request_count, offer_count),
            severity_score: severity_score(request_count, offer_count),
            is_shortage: is_shortage(request_count, offer_count, thresholds),
            request_locations: distinct,
            primary_location,
        }
    }
}
