//! Database operations for `ingest_runs`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// Lifecycle of an ingest run: `queued -> running -> succeeded | partial | failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Queued,
    Running,
    Succeeded,
    /// Finished, but some segments or batches failed.
    Partial,
    Failed,
}

impl RunStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Partial | Self::Failed)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RunStatus {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "running" => Ok(Self::Running),
            "succeeded" => Ok(Self::Succeeded),
            "partial" => Ok(Self::Partial),
            "failed" => Ok(Self::Failed),
            other => Err(DbError::InvalidRunStatus(other.to_string())),
        }
    }
}

/// A row from the `ingest_runs` table, with the store's slug when known.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IngestRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub store_id: Option<i64>,
    pub store_slug: Option<String>,
    pub trigger_source: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub records_processed: i32,
    pub records_created: i32,
    pub records_updated: i32,
    pub records_skipped: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Record counters written when a run finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestRunCounts {
    pub processed: i32,
    pub created: i32,
    pub updated: i32,
    pub skipped: i32,
}

const RUN_SELECT: &str = "SELECT r.id, r.public_id, r.store_id, s.slug AS store_slug, \
            r.trigger_source, r.status, r.started_at, r.completed_at, \
            r.records_processed, r.records_created, r.records_updated, r.records_skipped, \
            r.error_message, r.created_at \
     FROM ingest_runs r \
     LEFT JOIN stores s ON s.id = r.store_id";

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Creates a new run in `queued` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_ingest_run(
    pool: &PgPool,
    store_id: Option<i64>,
    trigger_source: &str,
) -> Result<IngestRunRow, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO ingest_runs (public_id, store_id, trigger_source, status) \
         VALUES ($1, $2, $3, 'queued') \
         RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(store_id)
    .bind(trigger_source)
    .fetch_one(pool)
    .await?;

    get_ingest_run(pool, id).await
}

/// Marks a run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidIngestRunTransition`] unless the run is `queued`.
pub async fn start_ingest_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE ingest_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidIngestRunTransition {
            id,
            expected_status: "queued",
        });
    }

    Ok(())
}

/// Finishes a running run as `succeeded` or `partial` with its counters.
/// `error_message` summarizes what went wrong in a partial run.
///
/// # Errors
///
/// Returns [`DbError::InvalidRunStatus`] for any other target status, or
/// [`DbError::InvalidIngestRunTransition`] unless the run is `running`.
pub async fn complete_ingest_run(
    pool: &PgPool,
    id: i64,
    status: RunStatus,
    counts: IngestRunCounts,
    error_message: Option<&str>,
) -> Result<(), DbError> {
    if !matches!(status, RunStatus::Succeeded | RunStatus::Partial) {
        return Err(DbError::InvalidRunStatus(status.to_string()));
    }

    let result = sqlx::query(
        "UPDATE ingest_runs \
         SET status = $1, completed_at = NOW(), \
             records_processed = $2, records_created = $3, \
             records_updated = $4, records_skipped = $5, \
             error_message = $6 \
         WHERE id = $7 AND status = 'running'",
    )
    .bind(status.as_str())
    .bind(counts.processed)
    .bind(counts.created)
    .bind(counts.updated)
    .bind(counts.skipped)
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidIngestRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a queued or running run as `failed`, keeping whatever counters it
/// reached.
///
/// # Errors
///
/// Returns [`DbError::InvalidIngestRunTransition`] if the run already
/// finished.
pub async fn fail_ingest_run(
    pool: &PgPool,
    id: i64,
    counts: IngestRunCounts,
    error_message: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE ingest_runs \
         SET status = 'failed', completed_at = NOW(), \
             started_at = COALESCE(started_at, NOW()), \
             records_processed = $1, records_created = $2, \
             records_updated = $3, records_skipped = $4, \
             error_message = $5 \
         WHERE id = $6 AND status IN ('queued', 'running')",
    )
    .bind(counts.processed)
    .bind(counts.created)
    .bind(counts.updated)
    .bind(counts.skipped)
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidIngestRunTransition {
            id,
            expected_status: "queued or running",
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns [`DbError::NotFound`] if no run has this `id`.
pub async fn get_ingest_run(pool: &PgPool, id: i64) -> Result<IngestRunRow, DbError> {
    sqlx::query_as::<_, IngestRunRow>(&format!("{RUN_SELECT} WHERE r.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// The most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_ingest_runs(pool: &PgPool, limit: i64) -> Result<Vec<IngestRunRow>, DbError> {
    let rows = sqlx::query_as::<_, IngestRunRow>(&format!(
        "{RUN_SELECT} ORDER BY r.created_at DESC, r.id DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
