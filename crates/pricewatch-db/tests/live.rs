//! Live integration tests for pricewatch-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/pricewatch-db/`), so `"../../migrations"` resolves to the
//! workspace migration directory.

use std::str::FromStr;

use pricewatch_core::{ScrapedProduct, SourceKind, StoreConfig};
use pricewatch_db::{
    add_shopping_list_item, complete_ingest_run, create_ingest_run, create_sale_alert,
    create_shopping_list, create_user, fail_ingest_run, get_ingest_run,
    list_price_history, list_product_offers, list_user_notifications, process_scraped_data,
    record_search, search_products, seed_categories, seed_stores, shopping_list_cost,
    start_ingest_run, store_data_counts, upsert_product_record, DbError, IngestRunCounts,
    ProductFields, ResolveAction, RunStatus, SaleAlertInput,
};
use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Insert a minimal store row and return its generated `id`.
async fn insert_test_store(pool: &sqlx::PgPool, name: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO stores (name, slug, source_kind, base_url) \
         VALUES ($1, $2, 'json_catalog', $3) RETURNING id",
    )
    .bind(name)
    .bind(name.to_lowercase())
    .bind(format!("https://{}.example", name.to_lowercase()))
    .fetch_one(pool)
    .await
    .unwrap_or_else(|e| panic!("insert_test_store failed for '{name}': {e}"))
}

fn record(api_id: Option<i64>, name: &str, price: &str) -> ScrapedProduct {
    let mut r = ScrapedProduct::new(name, d(price));
    r.api_product_id = api_id;
    r.source_product_id = api_id.map(|id| id.to_string());
    r
}

async fn count(pool: &sqlx::PgPool, sql: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(sql)
        .fetch_one(pool)
        .await
        .unwrap_or_else(|e| panic!("count query failed ({sql}): {e}"))
}

// ---------------------------------------------------------------------------
// Section 1: Ingest Run Lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn ingest_run_lifecycle_queued_to_partial(pool: sqlx::PgPool) {
    let store_id = insert_test_store(&pool, "Spar").await;
    let run = create_ingest_run(&pool, Some(store_id), "cli")
        .await
        .expect("create_ingest_run failed");

    assert_eq!(run.status, "queued");
    assert_eq!(run.store_slug.as_deref(), Some("spar"));
    assert!(run.started_at.is_none());

    start_ingest_run(&pool, run.id)
        .await
        .expect("start_ingest_run failed");

    let counts = IngestRunCounts {
        processed: 10,
        created: 4,
        updated: 3,
        skipped: 2,
    };
    complete_ingest_run(&pool, run.id, RunStatus::Partial, counts, Some("1 segment failed"))
        .await
        .expect("complete_ingest_run failed");

    let fetched = get_ingest_run(&pool, run.id).await.expect("get failed");
    assert_eq!(fetched.status, "partial");
    assert!(fetched.completed_at.is_some());
    assert_eq!(fetched.records_processed, 10);
    assert_eq!(fetched.records_created, 4);
    assert_eq!(fetched.records_skipped, 2);
    assert_eq!(fetched.error_message.as_deref(), Some("1 segment failed"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn ingest_run_cannot_complete_directly_from_queued(pool: sqlx::PgPool) {
    let run = create_ingest_run(&pool, None, "scheduler")
        .await
        .expect("create failed");

    let err = complete_ingest_run(
        &pool,
        run.id,
        RunStatus::Succeeded,
        IngestRunCounts::default(),
        None,
    )
    .await
    .expect_err("completing a queued run should fail");

    assert!(matches!(
        err,
        DbError::InvalidIngestRunTransition {
            expected_status: "running",
            ..
        }
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn ingest_run_can_fail_before_starting(pool: sqlx::PgPool) {
    let run = create_ingest_run(&pool, None, "api").await.expect("create failed");

    fail_ingest_run(&pool, run.id, IngestRunCounts::default(), "store listing failed")
        .await
        .expect("fail failed");

    let fetched = get_ingest_run(&pool, run.id).await.expect("get failed");
    assert_eq!(fetched.status, "failed");
    assert!(fetched.started_at.is_some());
    assert!(fetched.completed_at.is_some());

    let err = fail_ingest_run(&pool, run.id, IngestRunCounts::default(), "again")
        .await
        .expect_err("a finished run cannot fail again");
    assert!(matches!(err, DbError::InvalidIngestRunTransition { .. }));
}

#[sqlx::test(migrations = "../../migrations")]
async fn complete_rejects_non_terminal_target(pool: sqlx::PgPool) {
    let run = create_ingest_run(&pool, None, "cli").await.expect("create failed");
    start_ingest_run(&pool, run.id).await.expect("start failed");

    let err = complete_ingest_run(
        &pool,
        run.id,
        RunStatus::Running,
        IngestRunCounts::default(),
        None,
    )
    .await
    .expect_err("running is not a completion status");
    assert!(matches!(err, DbError::InvalidRunStatus(_)));
}

// ---------------------------------------------------------------------------
// Section 2: Key Resolution
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn api_id_tracks_product_across_renames(pool: sqlx::PgPool) {
    let store_id = insert_test_store(&pool, "Spar").await;

    let first = process_scraped_data(&pool, store_id, None, &[record(Some(501), "Sante Milk", "2.50")])
        .await
        .expect("first batch");
    assert_eq!(first.created, 1);

    let second = process_scraped_data(
        &pool,
        store_id,
        None,
        &[record(Some(501), "Sante Milk 3.2% 1L", "2.50")],
    )
    .await
    .expect("second batch");
    assert_eq!(second.created, 0);
    assert_eq!(second.updated, 1);

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM products").await, 1);
    let name: String = sqlx::query_scalar("SELECT name FROM products WHERE api_product_id = 501")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(name, "Sante Milk 3.2% 1L");
}

#[sqlx::test(migrations = "../../migrations")]
async fn natural_key_matches_without_api_id(pool: sqlx::PgPool) {
    let spar = insert_test_store(&pool, "Spar").await;
    let nabiji = insert_test_store(&pool, "Nabiji").await;

    let mut a = record(None, "Dish Soap", "3.10");
    a.brand = Some("Fairy".to_string());
    let mut b = record(None, "  Dish   Soap ", "2.95");
    b.brand = Some("Fairy".to_string());
    b.image_url = Some("https://cdn.example/soap.png".to_string());

    process_scraped_data(&pool, spar, None, &[a]).await.expect("spar batch");
    let outcome = process_scraped_data(&pool, nabiji, None, &[b])
        .await
        .expect("nabiji batch");

    assert_eq!(outcome.created, 0);
    assert_eq!(outcome.updated, 1, "image_url was supplied and differs");
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM products").await, 1);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM prices").await, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn different_brand_is_a_different_product(pool: sqlx::PgPool) {
    let store_id = insert_test_store(&pool, "Spar").await;

    let mut a = record(None, "Butter 82%", "6.00");
    a.brand = Some("Sante".to_string());
    let b = record(None, "Butter 82%", "5.50");

    let outcome = process_scraped_data(&pool, store_id, None, &[a, b])
        .await
        .expect("batch");
    assert_eq!(outcome.created, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn api_upsert_uses_the_same_resolver(pool: sqlx::PgPool) {
    let fields = ProductFields {
        name: "Rye Bread".to_string(),
        brand: Some("Lomi".to_string()),
        ..ProductFields::default()
    };

    let (created, action) = upsert_product_record(&pool, &fields).await.expect("create");
    assert_eq!(action, ResolveAction::Created);
    assert_eq!(created.category_name.as_deref(), Some("Bakery"));

    let (again, action) = upsert_product_record(&pool, &fields).await.expect("again");
    assert_eq!(action, ResolveAction::Unchanged);
    assert_eq!(again.id, created.id);

    let blank = ProductFields {
        name: "   ".to_string(),
        ..ProductFields::default()
    };
    let err = upsert_product_record(&pool, &blank)
        .await
        .expect_err("blank name rejected");
    assert!(matches!(err, DbError::InvalidInput(_)));
}

// ---------------------------------------------------------------------------
// Section 3: Batch Committer
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn reingesting_identical_batch_creates_nothing(pool: sqlx::PgPool) {
    let store_id = insert_test_store(&pool, "Spar").await;
    let batch = vec![
        record(Some(1), "Cola 0.5L", "1.80"),
        record(Some(2), "Chips Paprika", "3.40"),
    ];

    let first = process_scraped_data(&pool, store_id, None, &batch).await.expect("first");
    assert_eq!(first.created, 2);
    assert_eq!(first.price_changes.len(), 2);

    let second = process_scraped_data(&pool, store_id, None, &batch).await.expect("second");
    assert_eq!(second.created, 0);
    assert_eq!(second.updated, 0);
    assert_eq!(second.unchanged, 2);
    assert!(second.price_changes.is_empty());

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM products").await, 2);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM price_history").await, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn price_change_appends_exactly_one_history_row(pool: sqlx::PgPool) {
    let store_id = insert_test_store(&pool, "Spar").await;
    let run = create_ingest_run(&pool, Some(store_id), "cli").await.expect("run");

    process_scraped_data(&pool, store_id, Some(run.id), &[record(Some(9), "Coffee Beans", "18.00")])
        .await
        .expect("first");

    let mut discounted = record(Some(9), "Coffee Beans", "14.50");
    discounted.previous_price = Some(d("18.00"));
    let outcome = process_scraped_data(&pool, store_id, Some(run.id), &[discounted])
        .await
        .expect("second");
    assert_eq!(outcome.price_changes.len(), 1);

    let product_id: i64 = sqlx::query_scalar("SELECT id FROM products WHERE api_product_id = 9")
        .fetch_one(&pool)
        .await
        .unwrap();
    let history = list_price_history(&pool, product_id, None, 10).await.expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].price, d("18.00"));
    assert_eq!(history[0].sale_price, Some(d("14.50")));
    assert!(history[0].is_on_sale);
    assert_eq!(history[0].ingest_run_id, Some(run.id));

    let offers = list_product_offers(&pool, product_id).await.expect("offers");
    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0].effective_price, d("14.50"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn blank_record_is_skipped_and_siblings_commit(pool: sqlx::PgPool) {
    let store_id = insert_test_store(&pool, "Spar").await;
    let batch = vec![
        record(Some(1), "Yogurt", "1.20"),
        record(Some(2), "   ", "9.99"),
        record(Some(3), "Kefir", "2.10"),
    ];

    let outcome = process_scraped_data(&pool, store_id, None, &batch).await.expect("batch");
    assert_eq!(outcome.skipped, 1);
    assert_eq!(outcome.processed, 2);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM products").await, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn record_failing_in_sql_rolls_back_alone(pool: sqlx::PgPool) {
    let store_id = insert_test_store(&pool, "Spar").await;
    // Built directly so the amount skips parse_price's range check.
    let batch = vec![
        record(Some(1), "Milk", "2.50"),
        record(Some(2), "Typo", "123456789"),
        record(Some(3), "Bread", "1.00"),
    ];

    let outcome = process_scraped_data(&pool, store_id, None, &batch)
        .await
        .expect("batch commits despite one bad record");
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.processed, 2);
    assert_eq!(outcome.created, 2);
    assert_eq!(outcome.price_changes.len(), 2);

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM products").await, 2);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM prices").await, 2);
    assert_eq!(
        count(&pool, "SELECT COUNT(*) FROM products WHERE name = 'Typo'").await,
        0
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn key_change_onto_another_product_is_not_applied(pool: sqlx::PgPool) {
    let store_id = insert_test_store(&pool, "Spar").await;

    process_scraped_data(&pool, store_id, None, &[record(Some(1), "Cola", "1.50")])
        .await
        .expect("api-id cola");
    let mut branded = record(None, "Cola", "1.60");
    branded.brand = Some("Coca".to_string());
    process_scraped_data(&pool, store_id, None, &[branded])
        .await
        .expect("branded cola");

    // Product 1 now claims the brand that makes it collide with the second.
    let mut moved = record(Some(1), "Cola", "1.50");
    moved.brand = Some("Coca".to_string());
    let outcome = process_scraped_data(
        &pool,
        store_id,
        None,
        &[record(None, "Bread", "1.00"), moved],
    )
    .await
    .expect("batch");
    assert_eq!(outcome.failed, 0);
    assert_eq!(outcome.created, 1);
    assert_eq!(outcome.unchanged, 1);

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM products").await, 3);
    let brand: Option<String> =
        sqlx::query_scalar("SELECT brand FROM products WHERE api_product_id = 1")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(brand, None);
}

#[sqlx::test(migrations = "../../migrations")]
async fn duplicates_in_a_batch_collapse_last_wins(pool: sqlx::PgPool) {
    let store_id = insert_test_store(&pool, "Spar").await;
    let batch = vec![
        record(Some(4), "Eggs 10pc", "4.00"),
        record(Some(4), "Eggs 10pc", "4.40"),
    ];

    let outcome = process_scraped_data(&pool, store_id, None, &batch).await.expect("batch");
    assert_eq!(outcome.duplicates, 1);
    assert_eq!(outcome.created, 1);

    let price: Decimal = sqlx::query_scalar("SELECT price FROM prices")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(price, d("4.40"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn unknown_store_rolls_back_the_batch(pool: sqlx::PgPool) {
    let err = process_scraped_data(&pool, 424_242, None, &[record(Some(1), "Milk", "2.00")])
        .await
        .expect_err("unknown store");
    assert!(matches!(err, DbError::NotFound));
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM products").await, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn taxonomy_is_resolved_or_guessed(pool: sqlx::PgPool) {
    let store_id = insert_test_store(&pool, "Spar").await;

    let mut supplied = record(Some(1), "Gouda", "12.00");
    supplied.category = Some("Cheese".to_string());
    supplied.subcategory = Some("Hard Cheese".to_string());
    let guessed = record(Some(2), "Chicken Wings", "9.00");

    process_scraped_data(&pool, store_id, None, &[supplied, guessed])
        .await
        .expect("batch");

    let rows: Vec<(String, Option<String>)> = sqlx::query_as(
        "SELECT c.name, s.name FROM products p \
         JOIN categories c ON c.id = p.category_id \
         LEFT JOIN subcategories s ON s.id = p.subcategory_id \
         ORDER BY p.api_product_id",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert_eq!(rows[0], ("Cheese".to_string(), Some("Hard Cheese".to_string())));
    assert_eq!(rows[1], ("Meat & Fish".to_string(), None));
}

#[sqlx::test(migrations = "../../migrations")]
async fn quantity_increase_marks_restock(pool: sqlx::PgPool) {
    let store_id = insert_test_store(&pool, "Spar").await;

    let mut r = record(Some(5), "Water 1.5L", "0.90");
    r.quantity = Some(3);
    let first = process_scraped_data(&pool, store_id, None, &[r.clone()]).await.expect("first");
    assert_eq!(first.restocks, 1);

    r.quantity = Some(1);
    let second = process_scraped_data(&pool, store_id, None, &[r.clone()]).await.expect("second");
    assert_eq!(second.inventory_updates, 1);
    assert_eq!(second.restocks, 0);

    r.quantity = Some(8);
    let third = process_scraped_data(&pool, store_id, None, &[r]).await.expect("third");
    assert_eq!(third.restocks, 1);

    let qty: i32 = sqlx::query_scalar("SELECT quantity FROM inventory")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(qty, 8);
}

// ---------------------------------------------------------------------------
// Section 4: Sale Alerts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn sale_alert_fires_once_within_cooldown(pool: sqlx::PgPool) {
    let store_id = insert_test_store(&pool, "Spar").await;
    let user = create_user(&pool, "Shopper@Example.com", Some("Shopper"))
        .await
        .expect("user");
    assert_eq!(user.email, "shopper@example.com");

    process_scraped_data(&pool, store_id, None, &[record(Some(11), "Olive Oil", "20.00")])
        .await
        .expect("seed price");
    let product_id: i64 = sqlx::query_scalar("SELECT id FROM products WHERE api_product_id = 11")
        .fetch_one(&pool)
        .await
        .unwrap();

    create_sale_alert(
        &pool,
        &SaleAlertInput {
            user_id: user.id,
            product_id,
            store_id: None,
            target_price: Some(d("18.00")),
        },
    )
    .await
    .expect("alert");

    let first = process_scraped_data(&pool, store_id, None, &[record(Some(11), "Olive Oil", "17.50")])
        .await
        .expect("drop");
    assert_eq!(first.notifications, 1);

    let second = process_scraped_data(&pool, store_id, None, &[record(Some(11), "Olive Oil", "16.00")])
        .await
        .expect("drop again");
    assert_eq!(second.notifications, 0, "cooldown suppresses a second alert");

    let notes = list_user_notifications(&pool, user.id, true, 10).await.expect("notes");
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].message, "Olive Oil is now 17.50 at Spar");
}

#[sqlx::test(migrations = "../../migrations")]
async fn sale_alert_ignores_prices_above_target(pool: sqlx::PgPool) {
    let store_id = insert_test_store(&pool, "Spar").await;
    let user = create_user(&pool, "a@example.com", None).await.expect("user");
    process_scraped_data(&pool, store_id, None, &[record(Some(12), "Tea", "5.00")])
        .await
        .expect("seed");
    let product_id: i64 = sqlx::query_scalar("SELECT id FROM products")
        .fetch_one(&pool)
        .await
        .unwrap();

    create_sale_alert(
        &pool,
        &SaleAlertInput {
            user_id: user.id,
            product_id,
            store_id: Some(store_id),
            target_price: Some(d("3.00")),
        },
    )
    .await
    .expect("alert");

    let outcome = process_scraped_data(&pool, store_id, None, &[record(Some(12), "Tea", "4.50")])
        .await
        .expect("change");
    assert_eq!(outcome.price_changes.len(), 1);
    assert_eq!(outcome.notifications, 0);
}

// ---------------------------------------------------------------------------
// Section 5: Shopping, Search, Seed, Verification
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn shopping_list_cost_counts_missing_items(pool: sqlx::PgPool) {
    let spar = insert_test_store(&pool, "Spar").await;
    let nabiji = insert_test_store(&pool, "Nabiji").await;

    process_scraped_data(
        &pool,
        spar,
        None,
        &[record(Some(1), "Milk", "2.00"), record(Some(2), "Bread", "1.00")],
    )
    .await
    .expect("spar");
    process_scraped_data(&pool, nabiji, None, &[record(Some(1), "Milk", "1.50")])
        .await
        .expect("nabiji");

    let user = create_user(&pool, "list@example.com", None).await.expect("user");
    let list = create_shopping_list(&pool, user.id, "Weekly").await.expect("list");
    let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM products ORDER BY api_product_id")
        .fetch_all(&pool)
        .await
        .unwrap();
    add_shopping_list_item(&pool, list.id, ids[0], 2).await.expect("milk");
    add_shopping_list_item(&pool, list.id, ids[1], 1).await.expect("bread");

    let cost = shopping_list_cost(&pool, list.id).await.expect("cost");
    assert_eq!(cost.len(), 2);
    assert_eq!(cost[0].store_name, "Spar");
    assert_eq!(cost[0].total, d("5.00"));
    assert_eq!(cost[0].missing_items, 0);
    assert_eq!(cost[1].store_name, "Nabiji");
    assert_eq!(cost[1].total, d("3.00"));
    assert_eq!(cost[1].missing_items, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn search_matches_name_brand_and_barcode(pool: sqlx::PgPool) {
    let store_id = insert_test_store(&pool, "Spar").await;
    let mut a = record(Some(1), "Orange Juice", "3.00");
    a.bar_code = Some("4860012345".to_string());
    let mut b = record(Some(2), "Apple Juice", "2.80");
    b.brand = Some("Orangina".to_string());
    process_scraped_data(&pool, store_id, None, &[a, b, record(Some(3), "Salt", "0.50")])
        .await
        .expect("batch");

    let hits = search_products(&pool, "orange", 10).await.expect("search");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].name, "Orange Juice", "prefix matches rank first");

    let by_code = search_products(&pool, "486001", 10).await.expect("barcode");
    assert_eq!(by_code.len(), 1);

    record_search(&pool, None, "orange", hits.len()).await.expect("history");
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM search_history").await, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn seeding_is_idempotent(pool: sqlx::PgPool) {
    let stores = vec![StoreConfig {
        name: "Spar".to_string(),
        source: SourceKind::JsonCatalog,
        base_url: "https://spar.example/".to_string(),
        enabled: true,
    }];

    assert_eq!(seed_stores(&pool, &stores).await.expect("seed"), 1);
    assert_eq!(seed_stores(&pool, &stores).await.expect("reseed"), 1);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM stores").await, 1);

    let base_url: String = sqlx::query_scalar("SELECT base_url FROM stores")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(base_url, "https://spar.example");

    assert_eq!(seed_categories(&pool).await.expect("categories"), 11);
    assert_eq!(seed_categories(&pool).await.expect("again"), 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn verification_counts_reflect_fresh_ingest(pool: sqlx::PgPool) {
    let store_id = insert_test_store(&pool, "Spar").await;
    process_scraped_data(
        &pool,
        store_id,
        None,
        &[record(Some(1), "Milk", "2.00"), record(Some(2), "Cola", "1.50")],
    )
    .await
    .expect("batch");

    let counts = store_data_counts(&pool, store_id, 60).await.expect("counts");
    assert_eq!(counts.recent_products, 2);
    assert_eq!(counts.recent_price_updates, 2);
    assert_eq!(counts.store_price_rows, 2);
    assert_eq!(counts.total_products, 2);
    assert_eq!(counts.category_count, 2);

    let quiet = insert_test_store(&pool, "Nabiji").await;
    let empty = store_data_counts(&pool, quiet, 60).await.expect("counts");
    assert_eq!(empty.store_price_rows, 0);
    assert_eq!(empty.recent_price_updates, 0);
}
