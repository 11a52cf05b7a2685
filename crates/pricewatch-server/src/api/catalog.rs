use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use pricewatch_db::{CategoryInput, ProductFilters, SubcategoryInput, SubcategoryPatch};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    created, map_db_error, normalize_limit, normalize_offset, ok, products::ProductItem,
    require_text, ApiError, ApiResponse, AppState, PageQuery,
};

const MAX_NAME_CHARS: usize = 200;

#[derive(Debug, Serialize)]
pub(super) struct CategoryItem {
    id: i64,
    name: String,
    name_ka: Option<String>,
    name_en: Option<String>,
    name_ru: Option<String>,
    icon: Option<String>,
    product_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<pricewatch_db::CategoryRow> for CategoryItem {
    fn from(row: pricewatch_db::CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            name_ka: row.name_ka,
            name_en: row.name_en,
            name_ru: row.name_ru,
            icon: row.icon,
            product_count: row.product_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SubcategoryItem {
    id: i64,
    category_id: i64,
    name: String,
    name_ka: Option<String>,
    name_en: Option<String>,
    name_ru: Option<String>,
    icon: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<pricewatch_db::SubcategoryRow> for SubcategoryItem {
    fn from(row: pricewatch_db::SubcategoryRow) -> Self {
        Self {
            id: row.id,
            category_id: row.category_id,
            name: row.name,
            name_ka: row.name_ka,
            name_en: row.name_en,
            name_ru: row.name_ru,
            icon: row.icon,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Create and full-replace body for categories.
#[derive(Debug, Deserialize)]
pub(super) struct CategoryRequest {
    pub name: String,
    pub name_ka: Option<String>,
    pub name_en: Option<String>,
    pub name_ru: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateSubcategoryRequest {
    pub category_id: i64,
    pub name: String,
    pub name_ka: Option<String>,
    pub name_en: Option<String>,
    pub name_ru: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct PatchSubcategoryRequest {
    pub category_id: Option<i64>,
    pub name: Option<String>,
    pub name_ka: Option<String>,
    pub name_en: Option<String>,
    pub name_ru: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SubcategoryQuery {
    pub category_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl CategoryRequest {
    fn into_input(self, req_id: &str) -> Result<CategoryInput, ApiError> {
        Ok(CategoryInput {
            name: require_text(req_id, "name", &self.name, MAX_NAME_CHARS)?,
            name_ka: self.name_ka,
            name_en: self.name_en,
            name_ru: self.name_ru,
            icon: self.icon,
        })
    }
}

// ---------------------------------------------------------------------------
// Product browsing
// ---------------------------------------------------------------------------

pub(super) async fn list_catalog(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<ProductItem>>>, ApiError> {
    let rows = pricewatch_db::list_products(
        &state.pool,
        ProductFilters {
            limit: normalize_limit(page.limit),
            offset: normalize_offset(page.offset),
            ..ProductFilters::default()
        },
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, rows.into_iter().map(ProductItem::from).collect()))
}

/// GET /api/v1/catalog/category/{name}: 404 when nothing is filed there.
pub(super) async fn list_catalog_by_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(name): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<ProductItem>>>, ApiError> {
    let rows = pricewatch_db::list_products(
        &state.pool,
        ProductFilters {
            category_name: Some(name.as_str()),
            limit: normalize_limit(page.limit),
            offset: normalize_offset(page.offset),
            ..ProductFilters::default()
        },
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    if rows.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("no products found in category '{name}'"),
        ));
    }
    Ok(ok(req_id, rows.into_iter().map(ProductItem::from).collect()))
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

pub(super) async fn list_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<CategoryItem>>>, ApiError> {
    let rows = pricewatch_db::list_categories(
        &state.pool,
        normalize_limit(page.limit),
        normalize_offset(page.offset),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, rows.into_iter().map(CategoryItem::from).collect()))
}

pub(super) async fn create_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryItem>>), ApiError> {
    let input = body.into_input(&req_id.0)?;
    let row = pricewatch_db::create_category(&state.pool, &input)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(created(req_id, row.into()))
}

pub(super) async fn get_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CategoryItem>>, ApiError> {
    let row = pricewatch_db::get_category(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, row.into()))
}

pub(super) async fn update_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<CategoryRequest>,
) -> Result<Json<ApiResponse<CategoryItem>>, ApiError> {
    let input = body.into_input(&req_id.0)?;
    let row = pricewatch_db::update_category(&state.pool, id, &input)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, row.into()))
}

pub(super) async fn delete_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    pricewatch_db::delete_category(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, serde_json::json!({ "deleted": true })))
}

pub(super) async fn list_category_subcategories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<SubcategoryItem>>>, ApiError> {
    pricewatch_db::get_category(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let rows = pricewatch_db::list_subcategories(
        &state.pool,
        Some(id),
        normalize_limit(page.limit),
        normalize_offset(page.offset),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, rows.into_iter().map(SubcategoryItem::from).collect()))
}

// ---------------------------------------------------------------------------
// Subcategories
// ---------------------------------------------------------------------------

pub(super) async fn list_subcategories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SubcategoryQuery>,
) -> Result<Json<ApiResponse<Vec<SubcategoryItem>>>, ApiError> {
    let rows = pricewatch_db::list_subcategories(
        &state.pool,
        query.category_id,
        normalize_limit(query.limit),
        normalize_offset(query.offset),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, rows.into_iter().map(SubcategoryItem::from).collect()))
}

pub(super) async fn create_subcategory(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateSubcategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SubcategoryItem>>), ApiError> {
    let input = SubcategoryInput {
        category_id: body.category_id,
        name: require_text(&req_id.0, "name", &body.name, MAX_NAME_CHARS)?,
        name_ka: body.name_ka,
        name_en: body.name_en,
        name_ru: body.name_ru,
        icon: body.icon,
    };
    let row = pricewatch_db::create_subcategory(&state.pool, &input)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(created(req_id, row.into()))
}

pub(super) async fn get_subcategory(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<SubcategoryItem>>, ApiError> {
    let row = pricewatch_db::get_subcategory(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, row.into()))
}

pub(super) async fn update_subcategory(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(body): Json<PatchSubcategoryRequest>,
) -> Result<Json<ApiResponse<SubcategoryItem>>, ApiError> {
    let name = body
        .name
        .as_deref()
        .map(|n| require_text(&req_id.0, "name", n, MAX_NAME_CHARS))
        .transpose()?;
    let patch = SubcategoryPatch {
        category_id: body.category_id,
        name,
        name_ka: body.name_ka,
        name_en: body.name_en,
        name_ru: body.name_ru,
        icon: body.icon,
    };
    let row = pricewatch_db::update_subcategory(&state.pool, id, &patch)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, row.into()))
}

pub(super) async fn delete_subcategory(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    pricewatch_db::delete_subcategory(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, serde_json::json!({ "deleted": true })))
}
