mod catalog;
mod data_collection;
mod favorites;
mod inventory;
mod notifications;
mod prices;
mod products;
mod sale_alerts;
mod search;
mod shopping_lists;
mod stores;
mod users;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use pricewatch_db::DbError;
use pricewatch_ingest::IngestSettings;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// Settings for ingest runs started through the API.
    pub ingest: Arc<IngestSettings>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

/// `limit`/`offset` query parameters shared by list endpoints.
#[derive(Debug, Default, Deserialize)]
pub(super) struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn ok<T: Serialize>(req_id: RequestId, data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) fn created<T: Serialize>(
    req_id: RequestId,
    data: T,
) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, ok(req_id, data))
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn normalize_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

/// Maps a [`DbError`] onto the API error vocabulary. Only unexpected
/// failures are logged.
pub(super) fn map_db_error(request_id: String, error: &DbError) -> ApiError {
    match error {
        DbError::NotFound => ApiError::new(request_id, "not_found", "resource not found"),
        DbError::InvalidInput(message) => ApiError::new(request_id, "validation_error", *message),
        e if e.is_unique_violation() => {
            ApiError::new(request_id, "conflict", "resource already exists")
        }
        e if e.is_foreign_key_violation() => ApiError::new(
            request_id,
            "bad_request",
            "a referenced resource does not exist",
        ),
        _ => {
            tracing::error!(error = %error, "database query failed");
            ApiError::new(request_id, "internal_error", "database query failed")
        }
    }
}

/// Trimmed, non-empty, at most `max_len` characters.
pub(super) fn require_text(
    req_id: &str,
    field: &str,
    value: &str,
    max_len: usize,
) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().count() > max_len {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            format!("{field} must be 1-{max_len} characters"),
        ));
    }
    Ok(trimmed.to_owned())
}

/// Non-negative and no larger than the price columns hold.
pub(super) fn require_price(
    req_id: &str,
    field: &str,
    value: rust_decimal::Decimal,
) -> Result<(), ApiError> {
    if pricewatch_core::in_price_range(value).is_none() {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            format!(
                "{field} must be between 0 and {}",
                pricewatch_core::MAX_PRICE
            ),
        ));
    }
    Ok(())
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        // Products
        .route(
            "/api/v1/products",
            get(products::list_products).post(products::upsert_product),
        )
        .route(
            "/api/v1/products/{id}",
            get(products::get_product).delete(products::delete_product),
        )
        .route(
            "/api/v1/products/{id}/offers",
            get(products::list_product_offers),
        )
        .route(
            "/api/v1/products/{id}/price-history",
            get(products::list_price_history),
        )
        // Prices and stock
        .route(
            "/api/v1/prices",
            get(prices::list_prices).post(prices::upsert_price),
        )
        .route(
            "/api/v1/prices/{id}",
            get(prices::get_price).delete(prices::delete_price),
        )
        .route(
            "/api/v1/inventory",
            get(inventory::list_inventory).post(inventory::upsert_inventory),
        )
        .route(
            "/api/v1/inventory/{id}",
            get(inventory::get_inventory).delete(inventory::delete_inventory),
        )
        // Stores
        .route(
            "/api/v1/stores",
            get(stores::list_stores).post(stores::create_store),
        )
        .route("/api/v1/stores/{id}", get(stores::get_store))
        // Users and their resources
        .route(
            "/api/v1/users",
            get(users::list_users).post(users::create_user),
        )
        .route(
            "/api/v1/users/{id}",
            get(users::get_user).delete(users::delete_user),
        )
        .route(
            "/api/v1/users/{id}/shopping-lists",
            get(shopping_lists::list_user_shopping_lists),
        )
        .route(
            "/api/v1/users/{id}/favorites",
            get(favorites::list_user_favorites),
        )
        .route(
            "/api/v1/users/{id}/sale-alerts",
            get(sale_alerts::list_user_sale_alerts),
        )
        .route(
            "/api/v1/users/{id}/notifications",
            get(notifications::list_user_notifications),
        )
        .route(
            "/api/v1/shopping-lists",
            post(shopping_lists::create_shopping_list),
        )
        .route(
            "/api/v1/shopping-lists/{id}",
            get(shopping_lists::get_shopping_list).delete(shopping_lists::delete_shopping_list),
        )
        .route(
            "/api/v1/shopping-lists/{id}/items",
            post(shopping_lists::add_item),
        )
        .route(
            "/api/v1/shopping-lists/{id}/items/{item_id}",
            axum::routing::patch(shopping_lists::update_item).delete(shopping_lists::delete_item),
        )
        .route(
            "/api/v1/shopping-lists/{id}/cost",
            get(shopping_lists::list_cost),
        )
        .route("/api/v1/favorites", post(favorites::add_favorite))
        .route(
            "/api/v1/favorites/{id}",
            axum::routing::delete(favorites::delete_favorite),
        )
        .route("/api/v1/sale-alerts", post(sale_alerts::create_sale_alert))
        .route(
            "/api/v1/sale-alerts/{id}",
            axum::routing::delete(sale_alerts::delete_sale_alert),
        )
        .route(
            "/api/v1/notifications/{id}/read",
            post(notifications::mark_read),
        )
        // Search
        .route("/api/v1/search", get(search::search_products))
        // Ingest runs
        .route(
            "/api/v1/data-collection/runs",
            get(data_collection::list_runs).post(data_collection::start_run),
        )
        .route(
            "/api/v1/data-collection/runs/{id}",
            get(data_collection::get_run),
        )
        // Catalog
        .route("/api/v1/catalog", get(catalog::list_catalog))
        .route(
            "/api/v1/catalog/category/{name}",
            get(catalog::list_catalog_by_category),
        )
        .route(
            "/api/v1/catalog/categories",
            get(catalog::list_categories).post(catalog::create_category),
        )
        .route(
            "/api/v1/catalog/categories/{id}",
            get(catalog::get_category)
                .put(catalog::update_category)
                .delete(catalog::delete_category),
        )
        .route(
            "/api/v1/catalog/categories/{id}/subcategories",
            get(catalog::list_category_subcategories),
        )
        .route(
            "/api/v1/catalog/subcategories",
            get(catalog::list_subcategories).post(catalog::create_subcategory),
        )
        .route(
            "/api/v1/catalog/subcategories/{id}",
            get(catalog::get_subcategory)
                .patch(catalog::update_subcategory)
                .delete(catalog::delete_subcategory),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Price Comparison API is running!" }))
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match pricewatch_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
