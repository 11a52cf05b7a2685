//! Database operations for `products` and the per-store offer view.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::resolve::{resolve_product, ProductFields, ResolveAction};
use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A product with its taxonomy names and cheapest current offer.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub api_product_id: Option<i64>,
    pub bar_code: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub subcategory_id: Option<i64>,
    pub subcategory_name: Option<String>,
    /// Lowest effective price across stores; `NULL` when no store prices it.
    pub min_price: Option<Decimal>,
    pub store_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One store's offer for a product.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OfferRow {
    pub store_id: i64,
    pub store_name: String,
    pub store_slug: String,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub is_on_sale: bool,
    pub effective_price: Decimal,
    pub quantity: Option<i32>,
    pub source_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Input filters for product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductFilters<'a> {
    /// Exact category name, case-insensitive.
    pub category_name: Option<&'a str>,
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
    pub limit: i64,
    pub offset: i64,
}

/// Effective price of a `prices` row aliased `pr`.
pub(crate) const EFFECTIVE_PRICE_SQL: &str =
    "CASE WHEN pr.is_on_sale AND pr.sale_price IS NOT NULL THEN pr.sale_price ELSE pr.price END";

pub(crate) fn product_select() -> String {
    format!(
        "SELECT p.id, p.name, p.brand, p.api_product_id, p.bar_code, p.image_url, \
                p.category_id, c.name AS category_name, \
                p.subcategory_id, s.name AS subcategory_name, \
                (SELECT MIN({EFFECTIVE_PRICE_SQL}) FROM prices pr WHERE pr.product_id = p.id) AS min_price, \
                (SELECT COUNT(*) FROM prices pr WHERE pr.product_id = p.id) AS store_count, \
                p.created_at, p.updated_at \
         FROM products p \
         LEFT JOIN categories c ON c.id = p.category_id \
         LEFT JOIN subcategories s ON s.id = p.subcategory_id"
    )
}

// ---------------------------------------------------------------------------
// products operations
// ---------------------------------------------------------------------------

/// Creates or updates a product through the same key resolution the batch
/// committer uses, in its own transaction.
///
/// # Errors
///
/// Returns [`DbError::InvalidInput`] if the name is blank, or
/// [`DbError::Sqlx`] if any statement fails.
pub async fn upsert_product_record(
    pool: &PgPool,
    fields: &ProductFields,
) -> Result<(ProductRow, ResolveAction), DbError> {
    let fields = fields
        .normalized()
        .ok_or(DbError::InvalidInput("product name must not be blank"))?;

    let mut tx = pool.begin().await?;
    let resolved = resolve_product(&mut *tx, &fields).await?;
    tx.commit().await?;

    let row = get_product(pool, resolved.product_id).await?;
    Ok((row, resolved.action))
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has this `id`.
pub async fn get_product(pool: &PgPool, id: i64) -> Result<ProductRow, DbError> {
    sqlx::query_as::<_, ProductRow>(&format!("{} WHERE p.id = $1", product_select()))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Products ordered by name, filtered by taxonomy.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products(
    pool: &PgPool,
    filters: ProductFilters<'_>,
) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "{} \
         WHERE ($1::TEXT IS NULL OR LOWER(c.name) = LOWER($1)) \
           AND ($2::BIGINT IS NULL OR p.category_id = $2) \
           AND ($3::BIGINT IS NULL OR p.subcategory_id = $3) \
         ORDER BY p.name, p.id \
         LIMIT $4 OFFSET $5",
        product_select()
    ))
    .bind(filters.category_name)
    .bind(filters.category_id)
    .bind(filters.subcategory_id)
    .bind(filters.limit)
    .bind(filters.offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Deletes a product along with its prices, stock and history.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has this `id`.
pub async fn delete_product(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Every store's current offer for a product, cheapest effective price first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_product_offers(pool: &PgPool, product_id: i64) -> Result<Vec<OfferRow>, DbError> {
    let rows = sqlx::query_as::<_, OfferRow>(&format!(
        "SELECT s.id AS store_id, s.name AS store_name, s.slug AS store_slug, \
                pr.price, pr.sale_price, pr.is_on_sale, \
                {EFFECTIVE_PRICE_SQL} AS effective_price, \
                i.quantity, pr.source_url, pr.updated_at \
         FROM prices pr \
         JOIN stores s ON s.id = pr.store_id \
         LEFT JOIN inventory i ON i.store_id = pr.store_id AND i.product_id = pr.product_id \
         WHERE pr.product_id = $1 \
         ORDER BY effective_price ASC, s.name"
    ))
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
