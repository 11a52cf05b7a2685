use pricewatch_core::AppConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/pricewatch-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,
    #[error("record not found")]
    NotFound,
    #[error("ingest run {id} is not in the expected '{expected_status}' status")]
    InvalidIngestRunTransition {
        id: i64,
        expected_status: &'static str,
    },
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("invalid ingest run status '{0}'")]
    InvalidRunStatus(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl DbError {
    /// `true` when the underlying Postgres error is a unique violation (`23505`).
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Sqlx(sqlx::Error::Database(db)) => db.code().as_deref() == Some("23505"),
            _ => false,
        }
    }

    /// `true` when the underlying Postgres error is a foreign key violation (`23503`).
    #[must_use]
    pub fn is_foreign_key_violation(&self) -> bool {
        match self {
            Self::Sqlx(sqlx::Error::Database(db)) => db.code().as_deref() == Some("23503"),
            _ => false,
        }
    }
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Connect using the URL and pool settings carried by an [`AppConfig`].
///
/// # Errors
///
/// Returns [`DbError::MissingDatabaseUrl`] if the URL is blank, or
/// [`DbError::Sqlx`] if the connection cannot be established.
pub async fn connect_pool_from_config(config: &AppConfig) -> Result<PgPool, DbError> {
    if config.database_url.trim().is_empty() {
        return Err(DbError::MissingDatabaseUrl);
    }
    connect_pool(
        &config.effective_database_url(),
        PoolConfig::from_app_config(config),
    )
    .await
    .map_err(DbError::from)
}

/// Run all pending migrations against the pool.
///
/// Returns the number of migrations that were applied.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    // _sqlx_migrations does not exist on a fresh database; treat absence as zero.
    let applied_before: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    MIGRATOR.run(pool).await?;

    let applied_after: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
            .fetch_one(pool)
            .await
            .unwrap_or(0);

    let delta = (applied_after - applied_before).max(0);
    Ok(usize::try_from(delta).unwrap_or(0))
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// Run a full health check: ping the pool and return a typed error on failure.
///
/// # Errors
///
/// Returns [`DbError`] if the ping fails.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    ping(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_config_has_sane_defaults() {
        let config = PoolConfig::default();

        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.min_connections, DEFAULT_MIN_CONNECTIONS);
        assert_eq!(config.acquire_timeout_secs, DEFAULT_ACQUIRE_TIMEOUT_SECS);
    }

    #[test]
    fn not_found_is_not_a_unique_violation() {
        assert!(!DbError::NotFound.is_unique_violation());
        assert!(!DbError::MissingDatabaseUrl.is_foreign_key_violation());
    }
}

pub mod catalog;
pub mod favorites;
pub mod ingest;
pub mod ingest_runs;
pub mod inventory;
pub mod notifications;
pub mod prices;
pub mod products;
pub mod resolve;
pub mod sale_alerts;
pub mod search;
pub mod seed;
pub mod shopping_lists;
pub mod stores;
pub mod users;
pub mod verification;

pub use catalog::{
    create_category, create_subcategory, delete_category, delete_subcategory, get_category,
    get_or_create_category, get_or_create_subcategory, get_subcategory, list_categories,
    list_subcategories, update_category, update_subcategory, CategoryInput, CategoryRow,
    SubcategoryInput, SubcategoryPatch, SubcategoryRow,
};
pub use favorites::{add_favorite, delete_favorite, list_user_favorites, FavoriteRow};
pub use ingest::{process_scraped_data, BatchOutcome, PriceChange};
pub use ingest_runs::{
    complete_ingest_run, create_ingest_run, fail_ingest_run, get_ingest_run, list_ingest_runs,
    start_ingest_run, IngestRunCounts, IngestRunRow, RunStatus,
};
pub use inventory::{
    apply_inventory, delete_inventory, get_inventory, list_inventory, upsert_inventory,
    InventoryFilters, InventoryRow,
};
pub use notifications::{list_user_notifications, mark_notification_read, NotificationRow};
pub use prices::{
    apply_price, delete_price, get_price, list_price_history, list_prices, upsert_price,
    PriceFilters, PriceHistoryRow, PriceRow, PriceUpsert,
};
pub use products::{
    delete_product, get_product, list_product_offers, list_products, upsert_product_record,
    OfferRow, ProductFilters, ProductRow,
};
pub use resolve::{resolve_product, ProductFields, ResolveAction, ResolvedProduct};
pub use sale_alerts::{
    alert_message, create_sale_alert, delete_sale_alert, fire_sale_alerts, list_user_sale_alerts,
    SaleAlertInput, SaleAlertRow, ALERT_COOLDOWN_HOURS,
};
pub use search::{record_search, search_products};
pub use seed::{seed_categories, seed_stores};
pub use shopping_lists::{
    add_shopping_list_item, create_shopping_list, delete_shopping_list,
    delete_shopping_list_item, get_shopping_list, list_shopping_list_items,
    list_user_shopping_lists, shopping_list_cost, update_shopping_list_item, ShoppingListItemRow,
    ShoppingListRow, StoreCostRow,
};
pub use stores::{
    create_store, get_store, get_store_by_slug, list_active_stores, list_stores, StoreInput,
    StoreRow,
};
pub use users::{create_user, delete_user, get_user, list_users, UserRow};
pub use verification::{store_data_counts, StoreDataCounts};
