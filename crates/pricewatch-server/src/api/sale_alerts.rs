use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{created, map_db_error, ok, require_price, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct SaleAlertItem {
    id: i64,
    user_id: i64,
    product_id: i64,
    product_name: String,
    store_id: Option<i64>,
    target_price: Option<Decimal>,
    is_active: bool,
    last_notified_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<pricewatch_db::SaleAlertRow> for SaleAlertItem {
    fn from(row: pricewatch_db::SaleAlertRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            product_name: row.product_name,
            store_id: row.store_id,
            target_price: row.target_price,
            is_active: row.is_active,
            last_notified_at: row.last_notified_at,
            created_at: row.created_at,
        }
    }
}

/// `store_id` omitted watches every store; `target_price` omitted fires on
/// any sale.
#[derive(Debug, Deserialize)]
pub(super) struct CreateSaleAlertRequest {
    pub user_id: i64,
    pub product_id: i64,
    pub store_id: Option<i64>,
    pub target_price: Option<Decimal>,
}

pub(super) async fn create_sale_alert(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateSaleAlertRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SaleAlertItem>>), ApiError> {
    if let Some(target) = body.target_price {
        require_price(&req_id.0, "target_price", target)?;
    }

    let input = pricewatch_db::SaleAlertInput {
        user_id: body.user_id,
        product_id: body.product_id,
        store_id: body.store_id,
        target_price: body.target_price,
    };
    let row = pricewatch_db::create_sale_alert(&state.pool, &input)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(created(req_id, row.into()))
}

pub(super) async fn list_user_sale_alerts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<SaleAlertItem>>>, ApiError> {
    let rows = pricewatch_db::list_user_sale_alerts(&state.pool, user_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, rows.into_iter().map(SaleAlertItem::from).collect()))
}

pub(super) async fn delete_sale_alert(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    pricewatch_db::delete_sale_alert(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, serde_json::json!({ "deleted": true })))
}
