//! Store ingest orchestration: segments -> normalize -> batches -> commit,
//! with one `ingest_runs` row per store.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use pricewatch_core::{collapse_duplicates, AppConfig, ScrapedProduct};
use pricewatch_db::{BatchOutcome, IngestRunCounts, IngestRunRow, RunStatus, StoreRow};
use pricewatch_scraper::client::extract_store_origin;
use pricewatch_scraper::{normalize_record, CatalogClient, ScraperError, SegmentContext};
use serde::Serialize;
use sqlx::PgPool;

use crate::IngestError;

/// The slice of [`AppConfig`] the pipeline reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSettings {
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
    pub page_size: u32,
    pub inter_request_delay_ms: u64,
    pub batch_size: usize,
    pub max_concurrent_stores: usize,
}

impl IngestSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            request_timeout_secs: config.scraper_request_timeout_secs,
            user_agent: config.scraper_user_agent.clone(),
            max_retries: config.scraper_max_retries,
            retry_backoff_base_secs: config.scraper_retry_backoff_base_secs,
            page_size: config.scraper_page_size,
            inter_request_delay_ms: config.scraper_inter_request_delay_ms,
            batch_size: config.scraper_batch_size.max(1),
            max_concurrent_stores: config.scraper_max_concurrent_stores.max(1),
        }
    }

    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn build_client(&self) -> Result<CatalogClient, ScraperError> {
        CatalogClient::new(
            self.request_timeout_secs,
            &self.user_agent,
            self.max_retries,
            self.retry_backoff_base_secs,
        )
    }
}

/// What ingesting one store did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreIngestReport {
    pub segments: usize,
    /// Segments that yielded nothing because their fetch failed.
    pub failed_segments: usize,
    /// Segments whose page walk stopped early; the pages fetched before the
    /// failure were still committed.
    pub partial_segments: usize,
    /// Raw records returned by the upstream.
    pub fetched: usize,
    /// Raw records the normalizer rejected.
    pub normalize_failures: usize,
    pub batches: usize,
    pub failed_batches: usize,
    /// Records that were in a batch that rolled back.
    pub lost_records: usize,
    /// Records rolled back on their own inside an otherwise committed batch.
    pub failed_records: usize,
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub duplicates: usize,
    pub price_changes: usize,
    pub restocks: usize,
    pub notifications: u64,
}

impl StoreIngestReport {
    fn absorb(&mut self, batch: &BatchOutcome) {
        self.processed += batch.processed;
        self.created += batch.created;
        self.updated += batch.updated;
        self.unchanged += batch.unchanged;
        self.skipped += batch.skipped;
        self.duplicates += batch.duplicates;
        self.failed_records += batch.failed;
        self.price_changes += batch.price_changes.len();
        self.restocks += batch.restocks;
        self.notifications += batch.notifications;
    }

    /// `Failed` when every segment failed, `Partial` when any segment was
    /// lost or cut short or any batch failed, otherwise `Succeeded`.
    #[must_use]
    pub fn run_status(&self) -> RunStatus {
        if self.segments > 0 && self.failed_segments == self.segments {
            RunStatus::Failed
        } else if self.has_failures() {
            RunStatus::Partial
        } else {
            RunStatus::Succeeded
        }
    }

    fn has_failures(&self) -> bool {
        self.failed_segments > 0 || self.partial_segments > 0 || self.failed_batches > 0
    }

    /// Records that never made it into the database: rejected by the
    /// normalizer, blank, or rolled back alone or with their batch.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.skipped + self.normalize_failures + self.lost_records + self.failed_records
    }

    /// Counters persisted on the `ingest_runs` row. Every dropped record
    /// counts as skipped.
    #[must_use]
    pub fn counts(&self) -> IngestRunCounts {
        IngestRunCounts {
            processed: saturating_i32(self.processed),
            created: saturating_i32(self.created),
            updated: saturating_i32(self.updated),
            skipped: saturating_i32(self.dropped()),
        }
    }

    /// Message stored on the run row when something went wrong.
    #[must_use]
    pub fn error_summary(&self) -> Option<String> {
        if !self.has_failures() {
            return None;
        }
        Some(format!(
            "{} of {} segments failed; {} cut short; {} of {} batches failed",
            self.failed_segments,
            self.segments,
            self.partial_segments,
            self.failed_batches,
            self.batches
        ))
    }
}

fn saturating_i32(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// Normalize raw records, dropping (and counting) the ones that fail.
fn normalize_segment(
    raw: &[serde_json::Value],
    ctx: &SegmentContext,
    store_slug: &str,
) -> (Vec<ScrapedProduct>, usize) {
    let mut failures = 0usize;
    let records = raw
        .iter()
        .filter_map(|value| match normalize_record(value, ctx) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!(store = %store_slug, error = %e, "skipping record: normalization failed");
                failures += 1;
                None
            }
        })
        .collect();
    (records, failures)
}

/// Ingests every segment of one store under an already-running run.
///
/// Segments are walked sequentially with `inter_request_delay_ms` between
/// them. A segment whose fetch fails and a batch whose commit fails are
/// logged and counted in the report; the remaining work continues. Pages a
/// segment fetched before failing are committed like any other.
///
/// # Errors
///
/// Returns [`IngestError::UnknownSourceKind`] if the store row names a
/// source this build cannot scrape, or [`IngestError::Scraper`] if the
/// store's base URL is invalid or its segments cannot be listed.
pub async fn run_store_ingest(
    pool: &PgPool,
    client: &CatalogClient,
    settings: &IngestSettings,
    store: &StoreRow,
    run_id: i64,
) -> Result<StoreIngestReport, IngestError> {
    let config = store
        .store_config()
        .ok_or_else(|| IngestError::UnknownSourceKind {
            slug: store.slug.clone(),
            source_kind: store.source_kind.clone(),
        })?;
    let origin = extract_store_origin(config.trimmed_base_url())?;
    let segments = client.list_segments(&config).await?;

    tracing::info!(store = %store.slug, run_id, segments = segments.len(), "ingesting store");

    let mut report = StoreIngestReport {
        segments: segments.len(),
        ..StoreIngestReport::default()
    };

    for (idx, segment) in segments.iter().enumerate() {
        if idx > 0 && settings.inter_request_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(settings.inter_request_delay_ms)).await;
        }

        let fetch = client
            .fetch_segment_products(
                &config,
                segment,
                settings.page_size,
                settings.inter_request_delay_ms,
            )
            .await;
        if let Some(e) = &fetch.error {
            if fetch.products.is_empty() {
                tracing::error!(
                    store = %store.slug,
                    segment = %segment.label(),
                    error = %e,
                    "segment fetch failed"
                );
                report.failed_segments += 1;
                continue;
            }
            tracing::warn!(
                store = %store.slug,
                segment = %segment.label(),
                kept = fetch.products.len(),
                error = %e,
                "segment fetch cut short; committing what was fetched"
            );
            report.partial_segments += 1;
        }
        let raw = fetch.products;
        report.fetched += raw.len();

        let (records, failures) = normalize_segment(&raw, &segment.context(&origin), &store.slug);
        report.normalize_failures += failures;

        let collapsed = collapse_duplicates(&records);
        report.duplicates += records.len() - collapsed.len();

        for chunk in collapsed.chunks(settings.batch_size.max(1)) {
            report.batches += 1;
            match pricewatch_db::process_scraped_data(pool, store.id, Some(run_id), chunk).await {
                Ok(outcome) => report.absorb(&outcome),
                Err(e) => {
                    tracing::error!(
                        store = %store.slug,
                        segment = %segment.label(),
                        records = chunk.len(),
                        error = %e,
                        "batch commit failed; continuing"
                    );
                    report.failed_batches += 1;
                    report.lost_records += chunk.len();
                }
            }
        }

        tracing::debug!(
            store = %store.slug,
            segment = %segment.label(),
            fetched = raw.len(),
            "segment done"
        );
    }

    Ok(report)
}

// ---------------------------------------------------------------------------
// Runs
// ---------------------------------------------------------------------------

/// A store paired with the `queued` run that will ingest it.
#[derive(Debug, Clone)]
pub struct QueuedRun {
    pub store: StoreRow,
    pub run: IngestRunRow,
}

/// Final state of one store's run.
#[derive(Debug, Clone)]
pub struct StoreRunSummary {
    pub store_slug: String,
    pub run_id: i64,
    pub status: RunStatus,
    pub report: StoreIngestReport,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    pub stores: Vec<StoreRunSummary>,
}

impl IngestSummary {
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.stores
            .iter()
            .filter(|s| s.status == RunStatus::Failed)
            .count()
    }

    #[must_use]
    pub fn all_failed(&self) -> bool {
        !self.stores.is_empty() && self.failed_count() == self.stores.len()
    }

    #[must_use]
    pub fn total_processed(&self) -> usize {
        self.stores.iter().map(|s| s.report.processed).sum()
    }
}

/// The stores a run should cover: the one matching `store_filter`, or every
/// active store.
///
/// # Errors
///
/// Returns [`IngestError::StoreNotFound`] or [`IngestError::StoreInactive`]
/// for a bad filter, or [`IngestError::Db`] if the lookup fails.
pub async fn resolve_stores(
    pool: &PgPool,
    store_filter: Option<&str>,
) -> Result<Vec<StoreRow>, IngestError> {
    let Some(slug) = store_filter else {
        return Ok(pricewatch_db::list_active_stores(pool).await?);
    };

    let store = pricewatch_db::get_store_by_slug(pool, slug)
        .await?
        .ok_or_else(|| IngestError::StoreNotFound(slug.to_string()))?;
    if !store.is_active {
        return Err(IngestError::StoreInactive(slug.to_string()));
    }
    Ok(vec![store])
}

/// Creates one `queued` run per selected store.
///
/// # Errors
///
/// See [`resolve_stores`]; also [`IngestError::Db`] if a run row cannot be
/// created.
pub async fn queue_ingest(
    pool: &PgPool,
    store_filter: Option<&str>,
    trigger_source: &str,
) -> Result<Vec<QueuedRun>, IngestError> {
    let stores = resolve_stores(pool, store_filter).await?;
    let mut queued = Vec::with_capacity(stores.len());
    for store in stores {
        let run = pricewatch_db::create_ingest_run(pool, Some(store.id), trigger_source).await?;
        queued.push(QueuedRun { store, run });
    }
    Ok(queued)
}

/// Executes queued runs with at most `max_concurrent_stores` in flight.
///
/// Every run ends in a terminal status; per-store errors are recorded on
/// the run row and in the summary rather than returned.
///
/// # Errors
///
/// Returns [`IngestError::Scraper`] if the HTTP client cannot be built. The
/// queued runs are marked failed first.
pub async fn execute_queued(
    pool: &PgPool,
    settings: &IngestSettings,
    queued: Vec<QueuedRun>,
) -> Result<IngestSummary, IngestError> {
    let client = match settings.build_client() {
        Ok(client) => client,
        Err(e) => {
            let message = format!("failed to build HTTP client: {e}");
            for q in &queued {
                fail_run_best_effort(pool, q.run.id, IngestRunCounts::default(), &message).await;
            }
            return Err(e.into());
        }
    };

    let stores: Vec<StoreRunSummary> = stream::iter(queued)
        .map(|q| ingest_one(pool, &client, settings, q))
        .buffer_unordered(settings.max_concurrent_stores.max(1))
        .collect()
        .await;

    let summary = IngestSummary { stores };
    let failed = summary.failed_count();
    if failed > 0 {
        tracing::warn!(
            failed_stores = failed,
            total_stores = summary.stores.len(),
            "some stores failed during ingest"
        );
    }
    Ok(summary)
}

async fn ingest_one(
    pool: &PgPool,
    client: &CatalogClient,
    settings: &IngestSettings,
    queued: QueuedRun,
) -> StoreRunSummary {
    let QueuedRun { store, run } = queued;
    let mut summary = StoreRunSummary {
        store_slug: store.slug.clone(),
        run_id: run.id,
        status: RunStatus::Failed,
        report: StoreIngestReport::default(),
        error: None,
    };

    if let Err(e) = pricewatch_db::start_ingest_run(pool, run.id).await {
        let message = format!("failed to start run: {e}");
        fail_run_best_effort(pool, run.id, IngestRunCounts::default(), &message).await;
        summary.error = Some(message);
        return summary;
    }

    match run_store_ingest(pool, client, settings, &store, run.id).await {
        Ok(report) => {
            let status = report.run_status();
            let error = report.error_summary();
            let counts = report.counts();
            let recorded = if status == RunStatus::Failed {
                pricewatch_db::fail_ingest_run(
                    pool,
                    run.id,
                    counts,
                    error.as_deref().unwrap_or("all segments failed"),
                )
                .await
            } else {
                pricewatch_db::complete_ingest_run(pool, run.id, status, counts, error.as_deref())
                    .await
            };

            match recorded {
                Ok(()) => summary.status = status,
                Err(e) => {
                    tracing::error!(run_id = run.id, error = %e, "failed to record run outcome");
                    fail_run_best_effort(pool, run.id, counts, &format!("{e}")).await;
                    summary.error = Some(e.to_string());
                }
            }
            if summary.error.is_none() {
                summary.error = error;
            }

            tracing::info!(
                store = %store.slug,
                run_id = run.id,
                status = %summary.status,
                processed = report.processed,
                created = report.created,
                updated = report.updated,
                price_changes = report.price_changes,
                "store ingest finished"
            );
            summary.report = report;
        }
        Err(e) => {
            let message = e.to_string();
            tracing::error!(store = %store.slug, run_id = run.id, error = %message, "store ingest failed");
            fail_run_best_effort(pool, run.id, IngestRunCounts::default(), &message).await;
            summary.error = Some(message);
        }
    }

    summary
}

/// Marks a run failed, logging instead of returning when that also fails.
pub async fn fail_run_best_effort(
    pool: &PgPool,
    run_id: i64,
    counts: IngestRunCounts,
    message: &str,
) {
    if let Err(e) = pricewatch_db::fail_ingest_run(pool, run_id, counts, message).await {
        tracing::error!(run_id, error = %e, "failed to mark ingest run as failed");
    }
}

/// Queues and executes a full ingest.
///
/// # Errors
///
/// Returns the errors of [`queue_ingest`] and [`execute_queued`], or
/// [`IngestError::AllStoresFailed`] when no store finished.
pub async fn run_ingest(
    pool: &PgPool,
    config: &AppConfig,
    store_filter: Option<&str>,
    trigger_source: &str,
) -> Result<IngestSummary, IngestError> {
    let queued = queue_ingest(pool, store_filter, trigger_source).await?;
    if queued.is_empty() {
        tracing::info!("no active stores to ingest");
        return Ok(IngestSummary::default());
    }

    let settings = IngestSettings::from_app_config(config);
    let summary = execute_queued(pool, &settings, queued).await?;
    if summary.all_failed() {
        return Err(IngestError::AllStoresFailed(summary.stores.len()));
    }
    Ok(summary)
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
