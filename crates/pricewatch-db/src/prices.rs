//! Database operations for `prices` and `price_history`.

use chrono::{DateTime, Utc};
use pricewatch_core::{PriceObservation, PriceOutcome};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row and input types
// ---------------------------------------------------------------------------

/// A row from the `prices` table with store and product names.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PriceRow {
    pub id: i64,
    pub store_id: i64,
    pub store_name: String,
    pub product_id: i64,
    pub product_name: String,
    /// Regular (undiscounted) price.
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub is_on_sale: bool,
    pub sale_start: Option<DateTime<Utc>>,
    pub sale_end: Option<DateTime<Utc>>,
    pub source_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// A row from the `price_history` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PriceHistoryRow {
    pub id: i64,
    pub store_id: i64,
    pub store_name: String,
    pub product_id: i64,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub is_on_sale: bool,
    pub ingest_run_id: Option<i64>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct PriceFilters {
    pub store_id: Option<i64>,
    pub product_id: Option<i64>,
    pub on_sale_only: bool,
    pub limit: i64,
    pub offset: i64,
}

/// A manually submitted price.
#[derive(Debug, Clone)]
pub struct PriceUpsert {
    pub store_id: i64,
    pub product_id: i64,
    pub price: Decimal,
    /// Discounted price; ignored unless lower than `price`.
    pub sale_price: Option<Decimal>,
    pub sale_start: Option<DateTime<Utc>>,
    pub sale_end: Option<DateTime<Utc>>,
    pub source_url: Option<String>,
}

impl PriceUpsert {
    #[must_use]
    pub fn observation(&self) -> PriceObservation {
        let price = self.price.round_dp(2);
        let sale_price = self
            .sale_price
            .map(|s| s.round_dp(2))
            .filter(|s| *s < price);
        PriceObservation {
            price,
            sale_price,
            is_on_sale: sale_price.is_some(),
        }
    }
}

const PRICE_SELECT: &str = "SELECT pr.id, pr.store_id, s.name AS store_name, \
            pr.product_id, p.name AS product_name, \
            pr.price, pr.sale_price, pr.is_on_sale, pr.sale_start, pr.sale_end, \
            pr.source_url, pr.updated_at \
     FROM prices pr \
     JOIN stores s ON s.id = pr.store_id \
     JOIN products p ON p.id = pr.product_id";

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Upserts the `(store, product)` price row and appends a `price_history`
/// row when the observation is new or differs from the stored one.
///
/// The stored row is locked for the rest of the caller's transaction.
/// `updated_at` is refreshed even when nothing changed, recording that the
/// price was seen.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails.
pub async fn apply_price(
    conn: &mut PgConnection,
    store_id: i64,
    product_id: i64,
    observation: &PriceObservation,
    source_url: Option<&str>,
    ingest_run_id: Option<i64>,
) -> Result<PriceOutcome, DbError> {
    let previous = sqlx::query_as::<_, (Decimal, Option<Decimal>, bool)>(
        "SELECT price, sale_price, is_on_sale FROM prices \
         WHERE store_id = $1 AND product_id = $2 \
         FOR UPDATE",
    )
    .bind(store_id)
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?
    .map(|(price, sale_price, is_on_sale)| PriceObservation {
        price,
        sale_price,
        is_on_sale,
    });

    let outcome = observation.classify(previous.as_ref());

    sqlx::query(
        "INSERT INTO prices \
             (store_id, product_id, price, sale_price, is_on_sale, sale_start, source_url) \
         VALUES ($1, $2, $3, $4, $5, CASE WHEN $5 THEN NOW() END, $6) \
         ON CONFLICT (store_id, product_id) DO UPDATE SET \
             price      = EXCLUDED.price, \
             sale_price = EXCLUDED.sale_price, \
             is_on_sale = EXCLUDED.is_on_sale, \
             sale_start = CASE \
                 WHEN NOT EXCLUDED.is_on_sale THEN NULL \
                 WHEN prices.is_on_sale THEN prices.sale_start \
                 ELSE NOW() END, \
             source_url = COALESCE(EXCLUDED.source_url, prices.source_url), \
             updated_at = NOW()",
    )
    .bind(store_id)
    .bind(product_id)
    .bind(observation.price)
    .bind(observation.sale_price)
    .bind(observation.is_on_sale)
    .bind(source_url)
    .execute(&mut *conn)
    .await?;

    if outcome != PriceOutcome::Unchanged {
        sqlx::query(
            "INSERT INTO price_history \
                 (store_id, product_id, price, sale_price, is_on_sale, ingest_run_id) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(store_id)
        .bind(product_id)
        .bind(observation.price)
        .bind(observation.sale_price)
        .bind(observation.is_on_sale)
        .bind(ingest_run_id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(outcome)
}

/// Records a manually submitted price, with history, in one transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails, including a foreign key
/// violation for an unknown store or product.
pub async fn upsert_price(
    pool: &PgPool,
    input: &PriceUpsert,
) -> Result<(PriceRow, PriceOutcome), DbError> {
    let mut tx = pool.begin().await?;
    let outcome = apply_price(
        &mut *tx,
        input.store_id,
        input.product_id,
        &input.observation(),
        input.source_url.as_deref(),
        None,
    )
    .await?;

    let id = sqlx::query_scalar::<_, i64>(
        "UPDATE prices SET \
             sale_start = COALESCE($1, sale_start), \
             sale_end   = $2 \
         WHERE store_id = $3 AND product_id = $4 \
         RETURNING id",
    )
    .bind(input.sale_start)
    .bind(input.sale_end)
    .bind(input.store_id)
    .bind(input.product_id)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok((get_price(pool, id).await?, outcome))
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no price row has this `id`.
pub async fn delete_price(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM prices WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns [`DbError::NotFound`] if no price row has this `id`.
pub async fn get_price(pool: &PgPool, id: i64) -> Result<PriceRow, DbError> {
    sqlx::query_as::<_, PriceRow>(&format!("{PRICE_SELECT} WHERE pr.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Price rows, most recently refreshed first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_prices(pool: &PgPool, filters: &PriceFilters) -> Result<Vec<PriceRow>, DbError> {
    let rows = sqlx::query_as::<_, PriceRow>(&format!(
        "{PRICE_SELECT} \
         WHERE ($1::BIGINT IS NULL OR pr.store_id = $1) \
           AND ($2::BIGINT IS NULL OR pr.product_id = $2) \
           AND (NOT $3 OR pr.is_on_sale) \
         ORDER BY pr.updated_at DESC, pr.id DESC \
         LIMIT $4 OFFSET $5"
    ))
    .bind(filters.store_id)
    .bind(filters.product_id)
    .bind(filters.on_sale_only)
    .bind(filters.limit)
    .bind(filters.offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Recorded price changes for a product, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_price_history(
    pool: &PgPool,
    product_id: i64,
    store_id: Option<i64>,
    limit: i64,
) -> Result<Vec<PriceHistoryRow>, DbError> {
    let rows = sqlx::query_as::<_, PriceHistoryRow>(
        "SELECT h.id, h.store_id, s.name AS store_name, h.product_id, \
                h.price, h.sale_price, h.is_on_sale, h.ingest_run_id, h.recorded_at \
         FROM price_history h \
         JOIN stores s ON s.id = h.store_id \
         WHERE h.product_id = $1 \
           AND ($2::BIGINT IS NULL OR h.store_id = $2) \
         ORDER BY h.recorded_at DESC, h.id DESC \
         LIMIT $3",
    )
    .bind(product_id)
    .bind(store_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn upsert(price: &str, sale: Option<&str>) -> PriceUpsert {
        PriceUpsert {
            store_id: 1,
            product_id: 2,
            price: d(price),
            sale_price: sale.map(d),
            sale_start: None,
            sale_end: None,
            source_url: None,
        }
    }

    #[test]
    fn observation_ignores_sale_price_not_below_regular() {
        let obs = upsert("3.00", Some("3.00")).observation();
        assert!(!obs.is_on_sale);
        assert_eq!(obs.sale_price, None);
        assert_eq!(obs.effective_price(), d("3.00"));
    }

    #[test]
    fn observation_rounds_and_marks_sale() {
        let obs = upsert("4.999", Some("3.494")).observation();
        assert_eq!(obs.price, d("5.00"));
        assert_eq!(obs.sale_price, Some(d("3.49")));
        assert!(obs.is_on_sale);
        assert_eq!(obs.effective_price(), d("3.49"));
    }
}
