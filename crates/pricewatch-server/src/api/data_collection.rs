use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use pricewatch_ingest::IngestError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ok, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct IngestRunItem {
    id: i64,
    public_id: Uuid,
    store_id: Option<i64>,
    store_slug: Option<String>,
    trigger_source: String,
    status: String,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    records_processed: i32,
    records_created: i32,
    records_updated: i32,
    records_skipped: i32,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<pricewatch_db::IngestRunRow> for IngestRunItem {
    fn from(row: pricewatch_db::IngestRunRow) -> Self {
        Self {
            id: row.id,
            public_id: row.public_id,
            store_id: row.store_id,
            store_slug: row.store_slug,
            trigger_source: row.trigger_source,
            status: row.status,
            started_at: row.started_at,
            completed_at: row.completed_at,
            records_processed: row.records_processed,
            records_created: row.records_created,
            records_updated: row.records_updated,
            records_skipped: row.records_skipped,
            error_message: row.error_message,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct RunListQuery {
    pub limit: Option<i64>,
}

/// Body of `POST /data-collection/runs`; omit `store` to ingest every
/// active store.
#[derive(Debug, Default, Deserialize)]
pub(super) struct StartRunRequest {
    pub store: Option<String>,
}

fn map_ingest_error(request_id: String, error: &IngestError) -> ApiError {
    match error {
        IngestError::StoreNotFound(slug) => {
            ApiError::new(request_id, "not_found", format!("store '{slug}' not found"))
        }
        IngestError::StoreInactive(slug) => ApiError::new(
            request_id,
            "bad_request",
            format!("store '{slug}' is inactive"),
        ),
        IngestError::Db(db) => map_db_error(request_id, db),
        other => {
            tracing::error!(error = %other, "failed to queue ingest");
            ApiError::new(request_id, "internal_error", "failed to queue ingest")
        }
    }
}

pub(super) async fn list_runs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<RunListQuery>,
) -> Result<Json<ApiResponse<Vec<IngestRunItem>>>, ApiError> {
    let rows = pricewatch_db::list_ingest_runs(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, rows.into_iter().map(IngestRunItem::from).collect()))
}

pub(super) async fn get_run(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<IngestRunItem>>, ApiError> {
    let row = pricewatch_db::get_ingest_run(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, row.into()))
}

/// POST /api/v1/data-collection/runs: queue runs and execute them in the
/// background.
///
/// Responds 202 with the queued run rows; poll `GET /data-collection/runs/{id}`
/// for their outcome.
pub(super) async fn start_run(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Option<Json<StartRunRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<IngestRunItem>>>), ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let store = body.store.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let queued = pricewatch_ingest::queue_ingest(&state.pool, store, "api")
        .await
        .map_err(|e| map_ingest_error(req_id.0.clone(), &e))?;

    let items: Vec<IngestRunItem> = queued.iter().map(|q| q.run.clone().into()).collect();
    let run_ids: Vec<i64> = items.iter().map(|item| item.id).collect();
    tracing::info!(?run_ids, "ingest runs queued via API");

    let pool = state.pool.clone();
    let settings = state.ingest.clone();
    tokio::spawn(async move {
        match pricewatch_ingest::execute_queued(&pool, &settings, queued).await {
            Ok(summary) => tracing::info!(
                stores = summary.stores.len(),
                failed = summary.failed_count(),
                processed = summary.total_processed(),
                "background ingest finished"
            ),
            Err(e) => tracing::error!(error = %e, "background ingest failed"),
        }
    });

    Ok((StatusCode::ACCEPTED, ok(req_id, items)))
}
