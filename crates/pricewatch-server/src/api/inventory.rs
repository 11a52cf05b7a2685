use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, normalize_offset, ok, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct InventoryItem {
    id: i64,
    store_id: i64,
    store_name: String,
    product_id: i64,
    product_name: String,
    quantity: i32,
    last_restocked: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl From<pricewatch_db::InventoryRow> for InventoryItem {
    fn from(row: pricewatch_db::InventoryRow) -> Self {
        Self {
            id: row.id,
            store_id: row.store_id,
            store_name: row.store_name,
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
            last_restocked: row.last_restocked,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct InventoryQuery {
    pub store_id: Option<i64>,
    pub product_id: Option<i64>,
    #[serde(default)]
    pub in_stock: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpsertInventoryRequest {
    pub store_id: i64,
    pub product_id: i64,
    pub quantity: i32,
}

pub(super) async fn list_inventory(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<InventoryQuery>,
) -> Result<Json<ApiResponse<Vec<InventoryItem>>>, ApiError> {
    let filters = pricewatch_db::InventoryFilters {
        store_id: query.store_id,
        product_id: query.product_id,
        in_stock_only: query.in_stock,
        limit: normalize_limit(query.limit),
        offset: normalize_offset(query.offset),
    };
    let rows = pricewatch_db::list_inventory(&state.pool, &filters)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(ok(req_id, rows.into_iter().map(InventoryItem::from).collect()))
}

pub(super) async fn upsert_inventory(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<UpsertInventoryRequest>,
) -> Result<Json<ApiResponse<InventoryItem>>, ApiError> {
    if body.quantity < 0 {
        return Err(ApiError::new(
            &req_id.0,
            "validation_error",
            "quantity must not be negative",
        ));
    }

    let row =
        pricewatch_db::upsert_inventory(&state.pool, body.store_id, body.product_id, body.quantity)
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, row.into()))
}

pub(super) async fn get_inventory(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<InventoryItem>>, ApiError> {
    let row = pricewatch_db::get_inventory(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, row.into()))
}

pub(super) async fn delete_inventory(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    pricewatch_db::delete_inventory(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, serde_json::json!({ "deleted": true })))
}
