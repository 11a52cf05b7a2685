//! Database operations for `inventory`.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InventoryRow {
    pub id: i64,
    pub store_id: i64,
    pub store_name: String,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub last_restocked: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct InventoryFilters {
    pub store_id: Option<i64>,
    pub product_id: Option<i64>,
    /// Only rows with `quantity > 0`.
    pub in_stock_only: bool,
    pub limit: i64,
    pub offset: i64,
}

const INVENTORY_SELECT: &str = "SELECT i.id, i.store_id, s.name AS store_name, \
            i.product_id, p.name AS product_name, \
            i.quantity, i.last_restocked, i.updated_at \
     FROM inventory i \
     JOIN stores s ON s.id = i.store_id \
     JOIN products p ON p.id = i.product_id";

/// Upserts the stock level of `(store, product)`.
///
/// A quantity higher than the stored one, or a first sighting with stock,
/// stamps `last_restocked`. Returns `true` when that happened.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn apply_inventory(
    conn: &mut PgConnection,
    store_id: i64,
    product_id: i64,
    quantity: i32,
) -> Result<bool, DbError> {
    let quantity = quantity.max(0);
    let previous = sqlx::query_scalar::<_, i32>(
        "SELECT quantity FROM inventory \
         WHERE store_id = $1 AND product_id = $2 \
         FOR UPDATE",
    )
    .bind(store_id)
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;

    let restocked = is_restock(previous, quantity);

    sqlx::query(
        "INSERT INTO inventory (store_id, product_id, quantity, last_restocked) \
         VALUES ($1, $2, $3, CASE WHEN $4 THEN NOW() END) \
         ON CONFLICT (store_id, product_id) DO UPDATE SET \
             quantity       = EXCLUDED.quantity, \
             last_restocked = CASE WHEN $4 THEN NOW() ELSE inventory.last_restocked END, \
             updated_at     = NOW()",
    )
    .bind(store_id)
    .bind(product_id)
    .bind(quantity)
    .bind(restocked)
    .execute(&mut *conn)
    .await?;

    Ok(restocked)
}

fn is_restock(previous: Option<i32>, quantity: i32) -> bool {
    match previous {
        Some(prev) => quantity > prev,
        None => quantity > 0,
    }
}

/// Sets a stock level outside of an ingest run.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails, including a foreign key
/// violation for an unknown store or product.
pub async fn upsert_inventory(
    pool: &PgPool,
    store_id: i64,
    product_id: i64,
    quantity: i32,
) -> Result<InventoryRow, DbError> {
    let mut tx = pool.begin().await?;
    apply_inventory(&mut *tx, store_id, product_id, quantity).await?;
    tx.commit().await?;

    sqlx::query_as::<_, InventoryRow>(&format!(
        "{INVENTORY_SELECT} WHERE i.store_id = $1 AND i.product_id = $2"
    ))
    .bind(store_id)
    .bind(product_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no inventory row has this `id`.
pub async fn get_inventory(pool: &PgPool, id: i64) -> Result<InventoryRow, DbError> {
    sqlx::query_as::<_, InventoryRow>(&format!("{INVENTORY_SELECT} WHERE i.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_inventory(
    pool: &PgPool,
    filters: &InventoryFilters,
) -> Result<Vec<InventoryRow>, DbError> {
    let rows = sqlx::query_as::<_, InventoryRow>(&format!(
        "{INVENTORY_SELECT} \
         WHERE ($1::BIGINT IS NULL OR i.store_id = $1) \
           AND ($2::BIGINT IS NULL OR i.product_id = $2) \
           AND (NOT $3 OR i.quantity > 0) \
         ORDER BY i.updated_at DESC, i.id DESC \
         LIMIT $4 OFFSET $5"
    ))
    .bind(filters.store_id)
    .bind(filters.product_id)
    .bind(filters.in_stock_only)
    .bind(filters.limit)
    .bind(filters.offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no inventory row has this `id`.
pub async fn delete_inventory(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM inventory WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::is_restock;

    #[test]
    fn restock_means_quantity_went_up() {
        assert!(is_restock(Some(2), 5));
        assert!(!is_restock(Some(5), 5));
        assert!(!is_restock(Some(5), 0));
    }

    #[test]
    fn first_sighting_counts_only_with_stock() {
        assert!(is_restock(None, 3));
        assert!(!is_restock(None, 0));
    }
}
