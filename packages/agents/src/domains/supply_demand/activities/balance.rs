//! Supply/demand balancing.
//!
//! Pipeline:
//! 1. Partition open posts per category into requests and offers
//! 2. Raise a 48-hour TopNeed for each shortage category
//! 3. Pick providers and organizations to notify

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domains::community::{Category, Organization, Post, Profile, ROLE_PROVIDER};
use crate::domains::org_sync::OrgSyncReport;
use crate::domains::supply_demand::models::{
    CategoryBalance, OrganizationContact, ProviderContact,
};
use crate::domains::supply_demand::utils::ShortageThresholds;
use crate::domains::top_needs::{TopNeed, UNKNOWN_LOCATION};
use crate::kernel::StageStore;
use crate::pipeline::StageName;

pub struct Balances {
    pub categories: Vec<CategoryBalance>,
    pub requests: usize,
    pub offers: usize,
    pub uncategorized: usize,
}

/// Per-category balance over open posts. Pure.
pub fn balance_categories(
    categories: &[Category],
    posts: &[Post],
    thresholds: &ShortageThresholds,
) -> Balances {
    let mut uncategorized = 0;
    let mut tallies: Vec<(usize, usize, Vec<String>)> = vec![(0, 0, Vec::new()); categories.len()];

    for post in posts {
        let index = post
            .category
            .as_deref()
            .and_then(|key| categories.iter().position(|c| c.matches_key(key)));
        let Some(index) = index else {
            uncategorized += 1;
            continue;
        };
        let tally = &mut tallies[index];
        if post.is_request() {
            tally.0 += 1;
            if let Some(location) = post.location_text.as_deref() {
                tally.2.push(location.to_string());
            }
        } else {
            tally.1 += 1;
        }
    }

    let requests = posts.iter().filter(|p| p.is_request()).count();
    let categories = categories
        .iter()
        .zip(tallies)
        .map(|(category, (requests, offers, locations))| {
            CategoryBalance::compute(
                category.id,
                &category.slug,
                &category.title,
                requests,
                offers,
                locations,
                thresholds,
            )
        })
        .collect();

    Balances {
        categories,
        requests,
        offers: posts.len() - requests,
        uncategorized,
    }
}

pub async fn create_shortage_need(
    balance: &CategoryBalance,
    thresholds: &ShortageThresholds,
    window_hours: i64,
    now: DateTime<Utc>,
    store: &StageStore<'_>,
) -> Option<TopNeed> {
    let details = json!({
        "category_slug": balance.category_slug,
        "category_title": balance.category_title,
        "request_count": balance.request_count,
        "offer_count": balance.offer_count,
        "shortage_ratio": balance.shortage_ratio,
        "severity_score": balance.severity_score,
        "min_requests": thresholds.min_requests,
        "shortage_threshold": thresholds.threshold,
        "request_locations": balance.request_locations,
        "source": StageName::SupplyDemand.as_str(),
    });
    TopNeed::new(
        balance.primary_location.as_deref().unwrap_or(UNKNOWN_LOCATION),
        balance.category_id,
        balance.severity_score,
        details,
        window_hours,
        now,
    )
    .create(store)
    .await
}

/// Providers whose skills or offered categories name the category.
pub fn select_providers(profiles: &[Profile], slug: &str, limit: usize) -> Vec<ProviderContact> {
    let slug = slug.to_lowercase();
    profiles
        .iter()
        .filter(|p| p.has_role(ROLE_PROVIDER))
        .filter(|p| {
            p.skills
                .iter()
                .chain(&p.offered_categories)
                .any(|s| s.to_lowercase() == slug)
        })
        .take(limit)
        .map(|p| ProviderContact {
            profile_id: p.id.clone(),
            display_name: p.display_label(),
            email: p.email.clone(),
        })
        .collect()
}

/// Organizations with an urgent need in the category first, then organizations serving it.
pub fn select_organizations(
    org_sync: Option<&OrgSyncReport>,
    organizations: &[Organization],
    slug: &str,
    limit: usize,
) -> Vec<OrganizationContact> {
    let mut contacts: Vec<OrganizationContact> = Vec::new();

    if let Some(report) = org_sync {
        for need in report.urgent_needs_for(slug) {
            if !contacts.iter().any(|c| c.org_id == need.org_id) {
                contacts.push(OrganizationContact {
                    org_id: need.org_id.clone(),
                    name: need.org_name.clone(),
                    has_urgent_need: true,
                });
            }
        }
    }

    for org in organizations.iter().filter(|o| o.serves(slug)) {
        let org_id = org.id.to_string();
        if !contacts.iter().any(|c| c.org_id == org_id) {
            contacts.push(OrganizationContact {
                org_id,
                name: org.name.clone(),
                has_urgent_need: false,
            });
        }
    }

    contacts.truncate(limit);
    contacts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::into_record;
    use serde_json::Value;

    fn categories() -> Vec<Category> {
        [json!({"id": 1, "slug": "food", "title": "Food"}), json!({"id": 2, "slug": "housing"})]
            .into_iter()
            .filter_map(|v| Category::from_record(&into_record(v)))
            .collect()
    }

    fn post(id: &str, category: Value, is_free: bool, location: Option<&str>) -> Post {
        Post::from_record(&into_record(json!({
            "id": id,
            "categories": category,
            "is_free": is_free,
            "location_text": location,
        })))
        .unwrap()
    }

    fn profile(value: Value) -> Profile {
        Profile::from_record(&into_record(value)).unwrap()
    }

    #[test]
    fn test_balance_partitions_by_slug_or_id() {
        let posts = vec![
            post("1", json!("food"), false, Some("Downtown")),
            post("2", json!(1), false, Some("Downtown")),
            post("3", json!("food"), false, None),
            post("4", json!("food"), true, None),
            post("5", json!("food"), true, None),
            post("6", json!("toys"), false, None),
            post("7", Value::Null, true, None),
        ];
        let balances = balance_categories(&categories(), &posts, &ShortageThresholds::default());
        assert_eq!(balances.requests, 4);
        assert_eq!(balances.offers, 3);
        assert_eq!(balances.uncategorized, 2);

        let food = &balances.categories[0];
        assert_eq!((food.request_count, food.offer_count), (3, 2));
        assert_eq!(food.shortage_ratio, 0.5);
        assert!(food.is_shortage);
        assert_eq!(food.primary_location.as_deref(), Some("Downtown"));

        let housing = &balances.categories[1];
        assert_eq!((housing.request_count, housing.offer_count), (0, 0));
        assert!(!housing.is_shortage);
    }

    #[test]
    fn test_select_providers_matches_skill_or_offered_category() {
        let profiles = vec![
            profile(json!({"id": "a", "roles": ["provider"], "skills": ["Food"]})),
            profile(json!({"id": "b", "roles": ["provider"], "offered_categories": ["food"]})),
            profile(json!({"id": "c", "roles": ["seeker"], "skills": ["food"]})),
            profile(json!({"id": "d", "roles": ["provider"], "skills": ["housing"]})),
        ];
        let providers = select_providers(&profiles, "food", 5);
        let ids: Vec<String> = providers.iter().map(|p| p.profile_id.to_string()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(providers[0].display_name, "Anonymous");
    }

    #[test]
    fn test_select_providers_respects_limit() {
        let profiles: Vec<Profile> = (0..8)
            .map(|i| profile(json!({"id": format!("p{i}"), "roles": ["provider"], "skills": ["food"]})))
            .collect();
        assert_eq!(select_providers(&profiles, "food", 5).len(), 5);
    }

    #[test]
    fn test_select_organizations_without_org_sync() {
        let orgs: Vec<Organization> = [
            json!({"id": "o1", "name": "Pantry", "types": ["food"]}),
            json!({"id": "o2", "name": "Shelter", "type": "housing"}),
        ]
        .into_iter()
        .filter_map(|v| Organization::from_record(&into_record(v)))
        .collect();
        let contacts = select_organizations(None, &orgs, "food", 5);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].org_id, "o1");
        assert!(!contacts[0].has_urgent_need);
    }
}
