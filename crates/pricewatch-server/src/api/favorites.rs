use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{created, map_db_error, ok, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct FavoriteItem {
    id: i64,
    user_id: i64,
    product_id: i64,
    product_name: String,
    min_price: Option<Decimal>,
    created_at: DateTime<Utc>,
}

impl From<pricewatch_db::FavoriteRow> for FavoriteItem {
    fn from(row: pricewatch_db::FavoriteRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            product_name: row.product_name,
            min_price: row.min_price,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct AddFavoriteRequest {
    pub user_id: i64,
    pub product_id: i64,
}

/// Idempotent: favoriting twice returns the existing row.
pub(super) async fn add_favorite(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<AddFavoriteRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FavoriteItem>>), ApiError> {
    let row = pricewatch_db::add_favorite(&state.pool, body.user_id, body.product_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(created(req_id, row.into()))
}

pub(super) async fn list_user_favorites(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<FavoriteItem>>>, ApiError> {
    let rows = pricewatch_db::list_user_favorites(&state.pool, user_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, rows.into_iter().map(FavoriteItem::from).collect()))
}

pub(super) async fn delete_favorite(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    pricewatch_db::delete_favorite(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, serde_json::json!({ "deleted": true })))
}
