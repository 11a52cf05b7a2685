//! Read-only counts used to check that ingest is keeping a store's data fresh.

use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct StoreDataCounts {
    /// Products created or changed within the window that this store prices.
    pub recent_products: i64,
    /// This store's price rows refreshed within the window.
    pub recent_price_updates: i64,
    /// All price rows this store has.
    pub store_price_rows: i64,
    pub category_count: i64,
    pub total_products: i64,
}

/// Counts for `store_id` over the last `window_minutes`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn store_data_counts(
    pool: &PgPool,
    store_id: i64,
    window_minutes: i32,
) -> Result<StoreDataCounts, DbError> {
    let counts = sqlx::query_as::<_, StoreDataCounts>(
        "SELECT \
             (SELECT COUNT(*) FROM products p \
              JOIN prices pr ON pr.product_id = p.id AND pr.store_id = $1 \
              WHERE p.updated_at >= NOW() - make_interval(mins => $2)) AS recent_products, \
             (SELECT COUNT(*) FROM prices \
              WHERE store_id = $1 AND updated_at >= NOW() - make_interval(mins => $2)) \
                 AS recent_price_updates, \
             (SELECT COUNT(*) FROM prices WHERE store_id = $1) AS store_price_rows, \
             (SELECT COUNT(*) FROM categories) AS category_count, \
             (SELECT COUNT(*) FROM products) AS total_products",
    )
    .bind(store_id)
    .bind(window_minutes)
    .fetch_one(pool)
    .await?;

    Ok(counts)
}
