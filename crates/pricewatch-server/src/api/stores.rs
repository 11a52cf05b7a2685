use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use pricewatch_core::SourceKind;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{created, map_db_error, ok, require_text, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct StoreItem {
    id: i64,
    name: String,
    slug: String,
    source_kind: String,
    base_url: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<pricewatch_db::StoreRow> for StoreItem {
    fn from(row: pricewatch_db::StoreRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            source_kind: row.source_kind,
            base_url: row.base_url,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateStoreRequest {
    pub name: String,
    pub base_url: String,
    pub source_kind: Option<String>,
    pub is_active: Option<bool>,
}

pub(super) async fn list_stores(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<StoreItem>>>, ApiError> {
    let rows = pricewatch_db::list_stores(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, rows.into_iter().map(StoreItem::from).collect()))
}

pub(super) async fn create_store(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateStoreRequest>,
) -> Result<(StatusCode, Json<ApiResponse<StoreItem>>), ApiError> {
    let rid = &req_id.0;
    let name = require_text(rid, "name", &body.name, 200)?;
    if pricewatch_core::slugify(&name).is_empty() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "name must contain at least one ASCII letter or digit",
        ));
    }

    let base_url = body.base_url.trim();
    if !pricewatch_core::is_origin_url(base_url) {
        return Err(ApiError::new(
            rid,
            "validation_error",
            format!("base_url must be an http(s) origin with no path, got '{base_url}'"),
        ));
    }

    let source_kind = match body.source_kind.as_deref() {
        None => SourceKind::JsonCatalog,
        Some(raw) => raw.parse::<SourceKind>().map_err(|_| {
            ApiError::new(
                rid,
                "validation_error",
                format!("source_kind must be 'json_catalog' or 'graphql', got '{raw}'"),
            )
        })?,
    };

    let input = pricewatch_db::StoreInput {
        name,
        source_kind,
        base_url: base_url.to_owned(),
        is_active: body.is_active.unwrap_or(true),
    };
    let row = pricewatch_db::create_store(&state.pool, &input)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(created(req_id, row.into()))
}

pub(super) async fn get_store(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<StoreItem>>, ApiError> {
    let row = pricewatch_db::get_store(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, row.into()))
}
