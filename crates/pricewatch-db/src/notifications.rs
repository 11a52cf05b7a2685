//! Database operations for `notifications`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NotificationRow {
    pub id: i64,
    pub user_id: i64,
    pub sale_alert_id: Option<i64>,
    pub product_id: Option<i64>,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, sale_alert_id, product_id, message, is_read, created_at";

/// A user's notifications, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_user_notifications(
    pool: &PgPool,
    user_id: i64,
    unread_only: bool,
    limit: i64,
) -> Result<Vec<NotificationRow>, DbError> {
    let rows = sqlx::query_as::<_, NotificationRow>(&format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications \
         WHERE user_id = $1 AND (NOT $2 OR NOT is_read) \
         ORDER BY created_at DESC, id DESC \
         LIMIT $3"
    ))
    .bind(user_id)
    .bind(unread_only)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Marks a notification as read. Idempotent.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no notification has this `id`.
pub async fn mark_notification_read(pool: &PgPool, id: i64) -> Result<NotificationRow, DbError> {
    sqlx::query_as::<_, NotificationRow>(&format!(
        "UPDATE notifications SET is_read = true WHERE id = $1 \
         RETURNING {NOTIFICATION_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}
