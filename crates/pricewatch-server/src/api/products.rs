use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use pricewatch_db::{ProductFields, ResolveAction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    map_db_error, normalize_limit, normalize_offset, ok, require_text, ApiError, ApiResponse,
    AppState,
};

#[derive(Debug, Serialize)]
pub(super) struct ProductItem {
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
    pub min_price: Option<Decimal>,
    pub store_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<pricewatch_db::ProductRow> for ProductItem {
    fn from(row: pricewatch_db::ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            brand: row.brand,
            api_product_id: row.api_product_id,
            bar_code: row.bar_code,
            image_url: row.image_url,
            category_id: row.category_id,
            category_name: row.category_name,
            subcategory_id: row.subcategory_id,
            subcategory_name: row.subcategory_name,
            min_price: row.min_price,
            store_count: row.store_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct OfferItem {
    store_id: i64,
    store_name: String,
    store_slug: String,
    price: Decimal,
    sale_price: Option<Decimal>,
    is_on_sale: bool,
    effective_price: Decimal,
    quantity: Option<i32>,
    source_url: Option<String>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct PriceHistoryItem {
    id: i64,
    store_id: i64,
    store_name: String,
    price: Decimal,
    sale_price: Option<Decimal>,
    is_on_sale: bool,
    ingest_run_id: Option<i64>,
    recorded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct UpsertProductResponse {
    action: &'static str,
    product: ProductItem,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProductQuery {
    pub category: Option<String>,
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PriceHistoryQuery {
    pub store_id: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpsertProductRequest {
    pub name: String,
    pub brand: Option<String>,
    pub bar_code: Option<String>,
    pub image_url: Option<String>,
    pub api_product_id: Option<i64>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ApiResponse<Vec<ProductItem>>>, ApiError> {
    let rows = pricewatch_db::list_products(
        &state.pool,
        pricewatch_db::ProductFilters {
            category_name: query.category.as_deref(),
            category_id: query.category_id,
            subcategory_id: query.subcategory_id,
            limit: normalize_limit(query.limit),
            offset: normalize_offset(query.offset),
        },
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(ok(req_id, rows.into_iter().map(ProductItem::from).collect()))
}

/// POST /api/v1/products: create a product or update the one it matches.
///
/// Matching follows ingest: upstream id first, then name, brand and barcode.
/// Responds 201 when a product was created, 200 otherwise.
pub(super) async fn upsert_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<UpsertProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UpsertProductResponse>>), ApiError> {
    let name = require_text(&req_id.0, "name", &body.name, 500)?;
    let fields = ProductFields {
        api_product_id: body.api_product_id,
        name,
        brand: body.brand,
        bar_code: body.bar_code,
        image_url: body.image_url,
        category: body.category,
        subcategory: body.subcategory,
    };

    let (row, action) = pricewatch_db::upsert_product_record(&state.pool, &fields)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let (status, action) = match action {
        ResolveAction::Created => (StatusCode::CREATED, "created"),
        ResolveAction::Updated => (StatusCode::OK, "updated"),
        ResolveAction::Unchanged => (StatusCode::OK, "unchanged"),
    };

    Ok((
        status,
        ok(
            req_id,
            UpsertProductResponse {
                action,
                product: row.into(),
            },
        ),
    ))
}

pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProductItem>>, ApiError> {
    let row = pricewatch_db::get_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, row.into()))
}

pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    pricewatch_db::delete_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, serde_json::json!({ "deleted": true })))
}

/// GET /api/v1/products/{id}/offers: every store's price, cheapest first.
pub(super) async fn list_product_offers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<OfferItem>>>, ApiError> {
    // 404 for an unknown product rather than an empty list.
    pricewatch_db::get_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let rows = pricewatch_db::list_product_offers(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| OfferItem {
            store_id: row.store_id,
            store_name: row.store_name,
            store_slug: row.store_slug,
            price: row.price,
            sale_price: row.sale_price,
            is_on_sale: row.is_on_sale,
            effective_price: row.effective_price,
            quantity: row.quantity,
            source_url: row.source_url,
            updated_at: row.updated_at,
        })
        .collect();

    Ok(ok(req_id, data))
}

pub(super) async fn list_price_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Query(query): Query<PriceHistoryQuery>,
) -> Result<Json<ApiResponse<Vec<PriceHistoryItem>>>, ApiError> {
    let rows = pricewatch_db::list_price_history(
        &state.pool,
        id,
        query.store_id,
        normalize_limit(query.limit),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| PriceHistoryItem {
            id: row.id,
            store_id: row.store_id,
            store_name: row.store_name,
            price: row.price,
            sale_price: row.sale_price,
            is_on_sale: row.is_on_sale,
            ingest_run_id: row.ingest_run_id,
            recorded_at: row.recorded_at,
        })
        .collect();

    Ok(ok(req_id, data))
}
