use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ok, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct NotificationItem {
    id: i64,
    user_id: i64,
    sale_alert_id: Option<i64>,
    product_id: Option<i64>,
    message: String,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl From<pricewatch_db::NotificationRow> for NotificationItem {
    fn from(row: pricewatch_db::NotificationRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            sale_alert_id: row.sale_alert_id,
            product_id: row.product_id,
            message: row.message,
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
}

pub(super) async fn list_user_notifications(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(user_id): Path<i64>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<ApiResponse<Vec<NotificationItem>>>, ApiError> {
    let rows = pricewatch_db::list_user_notifications(
        &state.pool,
        user_id,
        query.unread_only,
        normalize_limit(query.limit),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, rows.into_iter().map(NotificationItem::from).collect()))
}

pub(super) async fn mark_read(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<NotificationItem>>, ApiError> {
    let row = pricewatch_db::mark_notification_read(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, row.into()))
}
