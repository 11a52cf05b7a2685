//! Database operations for `favorites`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::products::EFFECTIVE_PRICE_SQL;
use crate::DbError;

/// A favorite with the product's name and cheapest current price.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FavoriteRow {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub min_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

fn favorite_select() -> String {
    format!(
        "SELECT f.id, f.user_id, f.product_id, p.name AS product_name, \
                (SELECT MIN({EFFECTIVE_PRICE_SQL}) FROM prices pr WHERE pr.product_id = f.product_id) AS min_price, \
                f.created_at \
         FROM favorites f \
         JOIN products p ON p.id = f.product_id"
    )
}

/// Marks a product as a user's favorite. Adding an existing favorite
/// returns the existing row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including a foreign key
/// violation for an unknown user or product.
pub async fn add_favorite(pool: &PgPool, user_id: i64, product_id: i64) -> Result<FavoriteRow, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO favorites (user_id, product_id) VALUES ($1, $2) \
         ON CONFLICT (user_id, product_id) DO UPDATE SET user_id = EXCLUDED.user_id \
         RETURNING id",
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_one(pool)
    .await?;

    sqlx::query_as::<_, FavoriteRow>(&format!("{} WHERE f.id = $1", favorite_select()))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// A user's favorites, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_user_favorites(pool: &PgPool, user_id: i64) -> Result<Vec<FavoriteRow>, DbError> {
    let rows = sqlx::query_as::<_, FavoriteRow>(&format!(
        "{} WHERE f.user_id = $1 ORDER BY f.created_at DESC, f.id DESC",
        favorite_select()
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no favorite has this `id`.
pub async fn delete_favorite(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM favorites WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
