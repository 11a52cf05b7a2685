//! Database operations for `stores`.

use chrono::{DateTime, Utc};
use pricewatch_core::{slugify, SourceKind, StoreConfig};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `stores` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoreRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    /// `json_catalog` or `graphql`; enforced by a CHECK constraint.
    pub source_kind: String,
    pub base_url: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoreRow {
    /// The fetcher-facing view of this row. `None` if `source_kind` is not a
    /// kind this build knows how to scrape.
    #[must_use]
    pub fn store_config(&self) -> Option<StoreConfig> {
        let source = self.source_kind.parse::<SourceKind>().ok()?;
        Some(StoreConfig {
            name: self.name.clone(),
            source,
            base_url: self.base_url.clone(),
            enabled: self.is_active,
        })
    }
}

/// Fields accepted when registering a store through the API.
#[derive(Debug, Clone)]
pub struct StoreInput {
    pub name: String,
    pub source_kind: SourceKind,
    pub base_url: String,
    pub is_active: bool,
}

const STORE_COLUMNS: &str = "id, name, slug, source_kind, base_url, is_active, created_at, updated_at";

/// Inserts a store; the slug is derived from the name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including unique
/// violations on `name` or `slug`.
pub async fn create_store(pool: &PgPool, input: &StoreInput) -> Result<StoreRow, DbError> {
    let row = sqlx::query_as::<_, StoreRow>(&format!(
        "INSERT INTO stores (name, slug, source_kind, base_url, is_active) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {STORE_COLUMNS}"
    ))
    .bind(input.name.trim())
    .bind(slugify(&input.name))
    .bind(input.source_kind.as_str())
    .bind(input.base_url.trim())
    .bind(input.is_active)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no store has this `id`.
pub async fn get_store(pool: &PgPool, id: i64) -> Result<StoreRow, DbError> {
    sqlx::query_as::<_, StoreRow>(&format!("SELECT {STORE_COLUMNS} FROM stores WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Returns the store with this slug, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_store_by_slug(pool: &PgPool, slug: &str) -> Result<Option<StoreRow>, DbError> {
    let row = sqlx::query_as::<_, StoreRow>(&format!(
        "SELECT {STORE_COLUMNS} FROM stores WHERE slug = $1"
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// All stores ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_stores(pool: &PgPool) -> Result<Vec<StoreRow>, DbError> {
    let rows = sqlx::query_as::<_, StoreRow>(&format!(
        "SELECT {STORE_COLUMNS} FROM stores ORDER BY name"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Stores with `is_active = true`, ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_stores(pool: &PgPool) -> Result<Vec<StoreRow>, DbError> {
    let rows = sqlx::query_as::<_, StoreRow>(&format!(
        "SELECT {STORE_COLUMNS} FROM stores WHERE is_active = true ORDER BY name"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
