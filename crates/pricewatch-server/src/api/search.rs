use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{
    map_db_error, normalize_limit, ok, products::ProductItem, ApiError, ApiResponse, AppState,
};

const MAX_QUERY_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
pub(super) struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<i64>,
    pub user_id: Option<i64>,
}

/// GET /api/v1/search: substring match on name, brand and barcode.
///
/// Each search is appended to `search_history`. A failure to record it is
/// logged and does not fail the request.
pub(super) async fn search_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<ProductItem>>>, ApiError> {
    let q = query.q.as_deref().map(str::trim).unwrap_or_default();
    if q.is_empty() || q.chars().count() > MAX_QUERY_CHARS {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!("q must be 1-{MAX_QUERY_CHARS} characters"),
        ));
    }

    let rows = pricewatch_db::search_products(&state.pool, q, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    if let Err(e) = pricewatch_db::record_search(&state.pool, query.user_id, q, rows.len()).await {
        tracing::warn!(error = %e, "failed to record search history");
    }

    Ok(ok(req_id, rows.into_iter().map(ProductItem::from).collect()))
}
