use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use pricewatch_core::PriceOutcome;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    map_db_error, normalize_limit, normalize_offset, ok, require_price, ApiError,
    ApiResponse, AppState,
};

#[derive(Debug, Serialize)]
pub(super) struct PriceItem {
    id: i64,
    store_id: i64,
    store_name: String,
    product_id: i64,
    product_name: String,
    price: Decimal,
    sale_price: Option<Decimal>,
    is_on_sale: bool,
    sale_start: Option<DateTime<Utc>>,
    sale_end: Option<DateTime<Utc>>,
    source_url: Option<String>,
    updated_at: DateTime<Utc>,
}

impl From<pricewatch_db::PriceRow> for PriceItem {
    fn from(row: pricewatch_db::PriceRow) -> Self {
        Self {
            id: row.id,
            store_id: row.store_id,
            store_name: row.store_name,
            product_id: row.product_id,
            product_name: row.product_name,
            price: row.price,
            sale_price: row.sale_price,
            is_on_sale: row.is_on_sale,
            sale_start: row.sale_start,
            sale_end: row.sale_end,
            source_url: row.source_url,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct UpsertPriceResponse {
    outcome: &'static str,
    price: PriceItem,
}

#[derive(Debug, Deserialize)]
pub(super) struct PriceQuery {
    pub store_id: Option<i64>,
    pub product_id: Option<i64>,
    #[serde(default)]
    pub on_sale: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpsertPriceRequest {
    pub store_id: i64,
    pub product_id: i64,
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub sale_start: Option<DateTime<Utc>>,
    pub sale_end: Option<DateTime<Utc>>,
    pub source_url: Option<String>,
}

pub(super) async fn list_prices(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<PriceQuery>,
) -> Result<Json<ApiResponse<Vec<PriceItem>>>, ApiError> {
    let filters = pricewatch_db::PriceFilters {
        store_id: query.store_id,
        product_id: query.product_id,
        on_sale_only: query.on_sale,
        limit: normalize_limit(query.limit),
        offset: normalize_offset(query.offset),
    };
    let rows = pricewatch_db::list_prices(&state.pool, &filters)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(ok(req_id, rows.into_iter().map(PriceItem::from).collect()))
}

/// Records a price the same way ingest does, appending history when it
/// changed. 201 for a new `(store, product)` pair.
pub(super) async fn upsert_price(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<UpsertPriceRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UpsertPriceResponse>>), ApiError> {
    let rid = &req_id.0;
    require_price(rid, "price", body.price)?;
    if let Some(sale) = body.sale_price {
        require_price(rid, "sale_price", sale)?;
    }
    if let (Some(start), Some(end)) = (body.sale_start, body.sale_end) {
        if end < start {
            return Err(ApiError::new(
                rid,
                "validation_error",
                "sale_end must not be before sale_start",
            ));
        }
    }

    let input = pricewatch_db::PriceUpsert {
        store_id: body.store_id,
        product_id: body.product_id,
        price: body.price,
        sale_price: body.sale_price,
        sale_start: body.sale_start,
        sale_end: body.sale_end,
        source_url: body.source_url,
    };
    let (row, outcome) = pricewatch_db::upsert_price(&state.pool, &input)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let (status, outcome) = match outcome {
        PriceOutcome::New => (StatusCode::CREATED, "new"),
        PriceOutcome::Changed => (StatusCode::OK, "changed"),
        PriceOutcome::Unchanged => (StatusCode::OK, "unchanged"),
    };
    Ok((
        status,
        ok(
            req_id,
            UpsertPriceResponse {
                outcome,
                price: row.into(),
            },
        ),
    ))
}

pub(super) async fn get_price(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PriceItem>>, ApiError> {
    let row = pricewatch_db::get_price(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, row.into()))
}

pub(super) async fn delete_price(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    pricewatch_db::delete_price(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, serde_json::json!({ "deleted": true })))
}
