use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    created, map_db_error, normalize_limit, normalize_offset, ok, ApiError, ApiResponse,
    AppState, PageQuery,
};

#[derive(Debug, Serialize)]
pub(super) struct UserItem {
    id: i64,
    public_id: Uuid,
    email: String,
    display_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<pricewatch_db::UserRow> for UserItem {
    fn from(row: pricewatch_db::UserRow) -> Self {
        Self {
            id: row.id,
            public_id: row.public_id,
            email: row.email,
            display_name: row.display_name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateUserRequest {
    pub email: String,
    pub display_name: Option<String>,
}

fn validate_email(req_id: &str, email: &str) -> Result<(), ApiError> {
    let valid = email.len() <= 320
        && email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if valid {
        Ok(())
    } else {
        Err(ApiError::new(
            req_id,
            "validation_error",
            format!("'{email}' is not a valid email address"),
        ))
    }
}

pub(super) async fn list_users(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<UserItem>>>, ApiError> {
    let rows = pricewatch_db::list_users(
        &state.pool,
        normalize_limit(page.limit),
        normalize_offset(page.offset),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, rows.into_iter().map(UserItem::from).collect()))
}

pub(super) async fn create_user(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserItem>>), ApiError> {
    let rid = &req_id.0;
    let email = body.email.trim();
    validate_email(rid, email)?;
    let display_name = body
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let row = pricewatch_db::create_user(&state.pool, email, display_name)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    Ok(created(req_id, row.into()))
}

pub(super) async fn get_user(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<UserItem>>, ApiError> {
    let row = pricewatch_db::get_user(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, row.into()))
}

pub(super) async fn delete_user(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    pricewatch_db::delete_user(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    Ok(ok(req_id, serde_json::json!({ "deleted": true })))
}

#[cfg(test)]
mod tests {
    use super::validate_email;

    #[test]
    fn email_validation_accepts_plain_addresses() {
        assert!(validate_email("r", "shopper@example.com").is_ok());
    }

    #[test]
    fn email_validation_rejects_malformed_addresses() {
        assert!(validate_email("r", "no-at-sign").is_err());
        assert!(validate_email("r", "@example.com").is_err());
        assert!(validate_email("r", "user@localhost").is_err());
    }
}
