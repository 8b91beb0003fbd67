//! PostgresStore against a real database. Requires Docker:
//! `cargo test --test postgres_store_tests -- --ignored --test-threads=1`

mod common;

use agents_core::common::{into_record, RecordExt};
use agents_core::kernel::{BaseStore, Filters, PostgresStore, StoreError, Table};
use common::TestHarness;
use serde_json::json;
use test_context::test_context;

fn store(ctx: &TestHarness) -> PostgresStore {
    PostgresStore::new(ctx.db_pool.clone())
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn test_insert_then_select_by_filter(ctx: &TestHarness) {
    ctx.reset().await.unwrap();
    let store = store(ctx);

    let inserted = store
        .insert(
            Table::Organization,
            into_record(json!({
                "id": "foodbank-001",
                "name": "Community Food Bank",
                "types": ["food"],
                "capacity_percent": 25,
            })),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(inserted.str_field("id"), Some("foodbank-001"));
    assert_eq!(inserted["types"], json!(["food"]));
    assert!(inserted.datetime_field("created_at").is_some());

    let rows = store
        .select(Table::Organization, &Filters::new().eq("id", "foodbank-001"))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].f64_field("capacity_percent"), Some(25.0));

    let none = store
        .select(Table::Organization, &Filters::new().eq("id", "missing"))
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn test_update_returns_changed_rows(ctx: &TestHarness) {
    ctx.reset().await.unwrap();
    let store = store(ctx);
    store
        .insert(
            Table::Organization,
            into_record(json!({"id": "shelter-001", "name": "Shelter", "capacity_percent": 60})),
        )
        .await
        .unwrap();

    let updated = store
        .update(
            Table::Organization,
            into_record(json!({"capacity_percent": 15, "shortages": ["blankets"]})),
            &Filters::new().eq("id", "shelter-001"),
        )
        .await
        .unwrap();
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].f64_field("capacity_percent"), Some(15.0));
    assert_eq!(updated[0].str_list("shortages"), vec!["blankets"]);
    assert_eq!(updated[0].str_field("name"), Some("Shelter"));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn test_update_without_filters_is_rejected(ctx: &TestHarness) {
    let result = store(ctx)
        .update(
            Table::Organization,
            into_record(json!({"name": "x"})),
            &Filters::new(),
        )
        .await;
    assert!(matches!(result, Err(StoreError::UnfilteredUpdate { .. })));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn test_upsert_on_unique_slug(ctx: &TestHarness) {
    ctx.reset().await.unwrap();
    let store = store(ctx);

    let first = store
        .upsert(
            Table::Categories,
            into_record(json!({"slug": "food", "title": "Food"})),
            &["slug"],
        )
        .await
        .unwrap()
        .unwrap();
    let second = store
        .upsert(
            Table::Categories,
            into_record(json!({"slug": "food", "title": "Food & Groceries"})),
            &["slug"],
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(first.i64_field("id"), second.i64_field("id"));
    assert_eq!(second.str_field("title"), Some("Food & Groceries"));
    assert_eq!(store.select(Table::Categories, &Filters::new()).await.unwrap().len(), 1);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn test_top_need_score_round_trips(ctx: &TestHarness) {
    ctx.reset().await.unwrap();
    let store = store(ctx);
    let row = store
        .insert(
            Table::TopNeeds,
            into_record(json!({
                "location": "Downtown",
                "window_start": "2025-03-01T12:00:00+00:00",
                "window_end": "2025-03-03T12:00:00+00:00",
                "category_id": 1,
                "score": 1.0 / 3.0,
                "details": {"source": "supply_demand_balancer", "shortage_ratio": 0.5},
            })),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.f64_field("score"), Some(1.0 / 3.0));
    assert_eq!(row["details"]["shortage_ratio"], json!(0.5));
    assert!(row.id_field("id").is_some());
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn test_out_of_range_score_is_a_database_error(ctx: &TestHarness) {
    let result = store(ctx)
        .insert(
            Table::TopNeeds,
            into_record(json!({
                "location": "Downtown",
                "window_start": "2025-03-01T12:00:00+00:00",
                "window_end": "2025-03-03T12:00:00+00:00",
                "category_id": 1,
                "score": 1.5,
            })),
        )
        .await;
    assert!(matches!(result, Err(StoreError::Database { .. })));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires Docker"]
async fn test_invalid_column_is_rejected_before_query(ctx: &TestHarness) {
    let result = store(ctx)
        .select(
            Table::Posts,
            &Filters::new().eq("status; DROP TABLE posts", "open"),
        )
        .await;
    assert!(matches!(result, Err(StoreError::InvalidColumn { .. })));
}
