use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{created, map_db_error, ok, require_text, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct ShoppingListItem {
    id: i64,
    user_id: i64,
    name: String,
    item_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<pricewatch_db::ShoppingListRow> for ShoppingListItem {
    fn from(row: pricewatch_db::ShoppingListRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            item_count: row.item_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ListEntryItem {
    id: i64,
    shopping_list_id: i64,
    product_id: i64,
    product_name: String,
    quantity: i32,
    is_checked: bool,
    created_at: DateTime<Utc>,
}

impl From<pricewatch_db::ShoppingListItemRow> for ListEntryItem {
    fn from(row: pricewatch_db::ShoppingListItemRow) -> Self {
        Self {
            id: row.id,
            shopping_list_id: row.shopping_list_id,
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
            is_checked: row.is_checked,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ShoppingListDetail {
    #[serde(flatten)]
    list: ShoppingListItem,
    items: Vec<ListEntryItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct StoreCostItem {
    store_id: i64,
    store_name: String,
    total: Decimal,
    priced_items: i64,
    missing_items: i64,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateShoppingListRequest {
    pub user_id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct AddItemRequest {
    pub product_id: i64,
    pub quantity: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateItemRequest {
    pub quantity: Option<i32>,
    pub is_checked: Option<bool>,
}

fn require_positive_quantity(req_id: &str, quantity: i32) -> Result<(), ApiError> {
    if quantity < 1 {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "quantity must be at least 1",
        ));
    }
    Ok(())
}

pub(super) async fn create_shopping_list(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateShoppingListRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ShoppingListItem>>), ApiError> {
    let name = require_text(&req_id.0, "name", &body.name, 200)?;
    let row = pricewatch_db::create_shopping_list(&state.pool, body.user_id, &name)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(created(req_id, row.into()))
}

pub(super) async fn list_user_shopping_lists(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<ShoppingListItem>>>, ApiError> {
    let rows = pricewatch_db::list_user_shopping_lists(&state.pool, user_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, rows.into_iter().map(ShoppingListItem::from).collect()))
}

/// GET /api/v1/shopping-lists/{id}: the list with its items.
pub(super) async fn get_shopping_list(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ShoppingListDetail>>, ApiError> {
    let list = pricewatch_db::get_shopping_list(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let items = pricewatch_db::list_shopping_list_items(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(ok(
        req_id,
        ShoppingListDetail {
            list: list.into(),
            items: items.into_iter().map(ListEntryItem::from).collect(),
        },
    ))
}

pub(super) async fn delete_shopping_list(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    pricewatch_db::delete_shopping_list(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, serde_json::json!({ "deleted": true })))
}

/// Adding a product already on the list increases its quantity.
pub(super) async fn add_item(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(list_id): Path<i64>,
    Json(body): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ListEntryItem>>), ApiError> {
    let quantity = body.quantity.unwrap_or(1);
    require_positive_quantity(&req_id.0, quantity)?;

    // Unknown list is a 404 rather than a foreign key 400.
    pricewatch_db::get_shopping_list(&state.pool, list_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let row = pricewatch_db::add_shopping_list_item(&state.pool, list_id, body.product_id, quantity)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(created(req_id, row.into()))
}

pub(super) async fn update_item(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((list_id, item_id)): Path<(i64, i64)>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<ApiResponse<ListEntryItem>>, ApiError> {
    if let Some(quantity) = body.quantity {
        require_positive_quantity(&req_id.0, quantity)?;
    }
    if body.quantity.is_none() && body.is_checked.is_none() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "nothing to update: set quantity or is_checked",
        ));
    }

    let row = pricewatch_db::update_shopping_list_item(
        &state.pool,
        list_id,
        item_id,
        body.quantity,
        body.is_checked,
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, row.into()))
}

pub(super) async fn delete_item(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((list_id, item_id)): Path<(i64, i64)>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    pricewatch_db::delete_shopping_list_item(&state.pool, list_id, item_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, serde_json::json!({ "deleted": true })))
}

/// GET /api/v1/shopping-lists/{id}/cost: what the list costs at each store.
pub(super) async fn list_cost(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(list_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<StoreCostItem>>>, ApiError> {
    pricewatch_db::get_shopping_list(&state.pool, list_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let rows = pricewatch_db::shopping_list_cost(&state.pool, list_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let items = rows
        .into_iter()
        .map(|row| StoreCostItem {
            store_id: row.store_id,
            store_name: row.store_name,
            total: row.total,
            priced_items: row.priced_items,
            missing_items: row.missing_items,
        })
        .collect();
    Ok(ok(req_id, items))
}
