//! Offline unit tests for pricewatch-db pool configuration and row types.
//! These tests do not require a live database connection.

use pricewatch_core::{AppConfig, Environment, ScrapedProduct};
use pricewatch_db::{BatchOutcome, IngestRunCounts, IngestRunRow, PoolConfig, ProductFields};
use rust_decimal::Decimal;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        stores_path: PathBuf::from("./config/stores.yaml"),
        db_require_tls: false,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        scraper_request_timeout_secs: 30,
        scraper_user_agent: "ua".to_string(),
        scraper_page_size: 50,
        scraper_inter_request_delay_ms: 250,
        scraper_max_retries: 3,
        scraper_retry_backoff_base_secs: 2,
        scraper_batch_size: 100,
        scraper_max_concurrent_stores: 1,
        ingest_cron: "0 0 3 * * *".to_string(),
        verify_cron: "0 30 4 * * *".to_string(),
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`IngestRunRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn ingest_run_row_has_expected_fields() {
    use chrono::Utc;
    use uuid::Uuid;

    let row = IngestRunRow {
        id: 1_i64,
        public_id: Uuid::new_v4(),
        store_id: Some(3),
        store_slug: Some("spar".to_string()),
        trigger_source: "cli".to_string(),
        status: "queued".to_string(),
        started_at: None,
        completed_at: None,
        records_processed: 0_i32,
        records_created: 0_i32,
        records_updated: 0_i32,
        records_skipped: 0_i32,
        error_message: None,
        created_at: Utc::now(),
    };

    assert_eq!(row.status, "queued");
    assert_eq!(row.store_slug.as_deref(), Some("spar"));
    assert!(row.started_at.is_none());
    assert_eq!(IngestRunCounts::default().processed, 0);
}

#[test]
fn product_fields_carry_scraped_identity() {
    let mut record = ScrapedProduct::new("  Sante   Milk 1L ", Decimal::new(250, 2));
    record.api_product_id = Some(77);
    record.brand = Some("Sante".to_string());
    record.category = Some("Milk & Dairy".to_string());

    let fields = ProductFields::from(&record)
        .normalized()
        .expect("non-blank name");
    assert_eq!(fields.name, "Sante Milk 1L");
    assert_eq!(fields.api_product_id, Some(77));
    assert_eq!(fields.category_name(), "Milk & Dairy");
}

#[test]
fn batch_outcome_starts_empty() {
    let outcome = BatchOutcome::default();
    assert_eq!(outcome.processed, 0);
    assert!(outcome.price_changes.is_empty());
}
