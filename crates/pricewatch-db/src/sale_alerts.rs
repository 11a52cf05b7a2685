//! Database operations for `sale_alerts`, including firing them into
//! `notifications` when a price changes.

use chrono::{DateTime, Utc};
use pricewatch_core::PriceObservation;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::DbError;

/// An alert does not fire again for the same product within this window.
pub const ALERT_COOLDOWN_HOURS: i32 = 24;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SaleAlertRow {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub product_name: String,
    /// `NULL` watches every store.
    pub store_id: Option<i64>,
    /// `NULL` fires on any sale.
    pub target_price: Option<Decimal>,
    pub is_active: bool,
    pub last_notified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SaleAlertInput {
    pub user_id: i64,
    pub product_id: i64,
    pub store_id: Option<i64>,
    pub target_price: Option<Decimal>,
}

const ALERT_SELECT: &str = "SELECT a.id, a.user_id, a.product_id, p.name AS product_name, \
            a.store_id, a.target_price, a.is_active, a.last_notified_at, a.created_at \
     FROM sale_alerts a \
     JOIN products p ON p.id = a.product_id";

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including a foreign key
/// violation for an unknown user, product or store.
pub async fn create_sale_alert(pool: &PgPool, input: &SaleAlertInput) -> Result<SaleAlertRow, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO sale_alerts (user_id, product_id, store_id, target_price) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(input.user_id)
    .bind(input.product_id)
    .bind(input.store_id)
    .bind(input.target_price.map(|p| p.round_dp(2)))
    .fetch_one(pool)
    .await?;

    sqlx::query_as::<_, SaleAlertRow>(&format!("{ALERT_SELECT} WHERE a.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_user_sale_alerts(pool: &PgPool, user_id: i64) -> Result<Vec<SaleAlertRow>, DbError> {
    let rows = sqlx::query_as::<_, SaleAlertRow>(&format!(
        "{ALERT_SELECT} WHERE a.user_id = $1 ORDER BY a.created_at DESC, a.id DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no alert has this `id`.
pub async fn delete_sale_alert(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM sale_alerts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Fires the active alerts on `product_id` that match a new observation at
/// `store_id`.
///
/// An alert matches when it watches this store (or every store), is outside
/// its cooldown, and either the product is on sale or the effective price is
/// at or below its target. Each match gets a notification carrying
/// `message` and has `last_notified_at` stamped. Returns the number of
/// notifications written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn fire_sale_alerts(
    conn: &mut PgConnection,
    store_id: i64,
    product_id: i64,
    observation: &PriceObservation,
    message: &str,
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "WITH fired AS ( \
             UPDATE sale_alerts SET last_notified_at = NOW() \
             WHERE product_id = $1 \
               AND is_active \
               AND (store_id IS NULL OR store_id = $2) \
               AND (last_notified_at IS NULL \
                    OR last_notified_at < NOW() - make_interval(hours => $3)) \
               AND ($4 OR (target_price IS NOT NULL AND $5 <= target_price)) \
             RETURNING id, user_id, product_id \
         ) \
         INSERT INTO notifications (user_id, sale_alert_id, product_id, message) \
         SELECT user_id, id, product_id, $6 FROM fired",
    )
    .bind(product_id)
    .bind(store_id)
    .bind(ALERT_COOLDOWN_HOURS)
    .bind(observation.is_on_sale)
    .bind(observation.effective_price())
    .bind(message)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Notification text for a price change that fired an alert.
#[must_use]
pub fn alert_message(product_name: &str, store_name: &str, observation: &PriceObservation) -> String {
    if observation.is_on_sale {
        format!(
            "{product_name} is on sale at {store_name}: {} (was {})",
            observation.effective_price(),
            observation.price
        )
    } else {
        format!(
            "{product_name} is now {} at {store_name}",
            observation.effective_price()
        )
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn sale_message_shows_both_prices() {
        let obs = PriceObservation {
            price: d("4.20"),
            sale_price: Some(d("3.15")),
            is_on_sale: true,
        };
        assert_eq!(
            alert_message("Sante Milk", "Spar", &obs),
            "Sante Milk is on sale at Spar: 3.15 (was 4.20)"
        );
    }

    #[test]
    fn regular_message_shows_effective_price() {
        let obs = PriceObservation {
            price: d("2.99"),
            sale_price: None,
            is_on_sale: false,
        };
        assert_eq!(
            alert_message("Bread", "Nabiji", &obs),
            "Bread is now 2.99 at Nabiji"
        );
    }
}
