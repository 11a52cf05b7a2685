//! Database operations for `shopping_lists`, their items, and per-store
//! basket cost.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::products::EFFECTIVE_PRICE_SQL;
use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShoppingListRow {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShoppingListItemRow {
    pub id: i64,
    pub shopping_list_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub is_checked: bool,
    pub created_at: DateTime<Utc>,
}

/// What a list costs at one store.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoreCostRow {
    pub store_id: i64,
    pub store_name: String,
    /// Sum of effective price times quantity over the items this store prices.
    pub total: Decimal,
    pub priced_items: i64,
    /// Items on the list this store has no price for.
    pub missing_items: i64,
}

const LIST_SELECT: &str = "SELECT l.id, l.user_id, l.name, \
            (SELECT COUNT(*) FROM shopping_list_items i WHERE i.shopping_list_id = l.id) AS item_count, \
            l.created_at, l.updated_at \
     FROM shopping_lists l";

const ITEM_SELECT: &str = "SELECT i.id, i.shopping_list_id, i.product_id, p.name AS product_name, \
            i.quantity, i.is_checked, i.created_at \
     FROM shopping_list_items i \
     JOIN products p ON p.id = i.product_id";

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including a foreign key
/// violation for an unknown user.
pub async fn create_shopping_list(
    pool: &PgPool,
    user_id: i64,
    name: &str,
) -> Result<ShoppingListRow, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO shopping_lists (user_id, name) VALUES ($1, $2) RETURNING id",
    )
    .bind(user_id)
    .bind(name.trim())
    .fetch_one(pool)
    .await?;

    get_shopping_list(pool, id).await
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no list has this `id`.
pub async fn get_shopping_list(pool: &PgPool, id: i64) -> Result<ShoppingListRow, DbError> {
    sqlx::query_as::<_, ShoppingListRow>(&format!("{LIST_SELECT} WHERE l.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_user_shopping_lists(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<ShoppingListRow>, DbError> {
    let rows = sqlx::query_as::<_, ShoppingListRow>(&format!(
        "{LIST_SELECT} WHERE l.user_id = $1 ORDER BY l.updated_at DESC, l.id DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no list has this `id`.
pub async fn delete_shopping_list(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM shopping_lists WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_shopping_list_items(
    pool: &PgPool,
    list_id: i64,
) -> Result<Vec<ShoppingListItemRow>, DbError> {
    let rows = sqlx::query_as::<_, ShoppingListItemRow>(&format!(
        "{ITEM_SELECT} WHERE i.shopping_list_id = $1 ORDER BY i.created_at, i.id"
    ))
    .bind(list_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Adds a product to a list. Adding a product already on the list adds to
/// its quantity.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails, including a foreign key
/// violation for an unknown list or product.
pub async fn add_shopping_list_item(
    pool: &PgPool,
    list_id: i64,
    product_id: i64,
    quantity: i32,
) -> Result<ShoppingListItemRow, DbError> {
    let mut tx = pool.begin().await?;
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO shopping_list_items (shopping_list_id, product_id, quantity) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (shopping_list_id, product_id) DO UPDATE SET \
             quantity = shopping_list_items.quantity + EXCLUDED.quantity \
         RETURNING id",
    )
    .bind(list_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(&mut *tx)
    .await?;
    touch_list(&mut *tx, list_id).await?;
    tx.commit().await?;

    get_item(pool, id).await
}

/// Changes an item's quantity and/or checked state.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the item does not exist on this list.
pub async fn update_shopping_list_item(
    pool: &PgPool,
    list_id: i64,
    item_id: i64,
    quantity: Option<i32>,
    is_checked: Option<bool>,
) -> Result<ShoppingListItemRow, DbError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        "UPDATE shopping_list_items SET \
             quantity   = COALESCE($1, quantity), \
             is_checked = COALESCE($2, is_checked) \
         WHERE id = $3 AND shopping_list_id = $4",
    )
    .bind(quantity)
    .bind(is_checked)
    .bind(item_id)
    .bind(list_id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    touch_list(&mut *tx, list_id).await?;
    tx.commit().await?;

    get_item(pool, item_id).await
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if the item does not exist on this list.
pub async fn delete_shopping_list_item(
    pool: &PgPool,
    list_id: i64,
    item_id: i64,
) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        "DELETE FROM shopping_list_items WHERE id = $1 AND shopping_list_id = $2",
    )
    .bind(item_id)
    .bind(list_id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    touch_list(&mut *tx, list_id).await?;
    tx.commit().await?;
    Ok(())
}

async fn get_item(pool: &PgPool, id: i64) -> Result<ShoppingListItemRow, DbError> {
    sqlx::query_as::<_, ShoppingListItemRow>(&format!("{ITEM_SELECT} WHERE i.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

async fn touch_list(conn: &mut sqlx::PgConnection, list_id: i64) -> Result<(), DbError> {
    sqlx::query("UPDATE shopping_lists SET updated_at = NOW() WHERE id = $1")
        .bind(list_id)
        .execute(conn)
        .await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Cost
// ---------------------------------------------------------------------------

/// Prices a list at every active store, most complete then cheapest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn shopping_list_cost(pool: &PgPool, list_id: i64) -> Result<Vec<StoreCostRow>, DbError> {
    let rows = sqlx::query_as::<_, StoreCostRow>(&format!(
        "SELECT s.id AS store_id, s.name AS store_name, \
                COALESCE(SUM(({EFFECTIVE_PRICE_SQL}) * i.quantity), 0)::NUMERIC(12, 2) AS total, \
                COUNT(pr.id) AS priced_items, \
                COUNT(*) - COUNT(pr.id) AS missing_items \
         FROM stores s \
         CROSS JOIN shopping_list_items i \
         LEFT JOIN prices pr ON pr.store_id = s.id AND pr.product_id = i.product_id \
         WHERE i.shopping_list_id = $1 AND s.is_active \
         GROUP BY s.id, s.name \
         ORDER BY missing_items ASC, total ASC, s.name"
    ))
    .bind(list_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
