//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring ingest and verification jobs.

use std::sync::Arc;

use pricewatch_core::AppConfig;
use pricewatch_ingest::{DEFAULT_WINDOW_MINUTES, IngestError};
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_ingest_job(&scheduler, pool.clone(), Arc::clone(&config)).await?;
    register_verify_job(&scheduler, pool, &config.verify_cron).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Ingests every active store on `PRICEWATCH_INGEST_CRON`.
async fn register_ingest_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<AppConfig>,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);
    let cron = config.ingest_cron.clone();

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let config = Arc::clone(&config);

        Box::pin(async move {
            tracing::info!("scheduler: starting ingest run");
            match pricewatch_ingest::run_ingest(&pool, &config, None, "scheduler").await {
                Ok(summary) => tracing::info!(
                    stores = summary.stores.len(),
                    failed = summary.failed_count(),
                    processed = summary.total_processed(),
                    "scheduler: ingest run complete"
                ),
                Err(IngestError::AllStoresFailed(n)) => {
                    tracing::error!(stores = n, "scheduler: every store failed to ingest");
                }
                Err(e) => tracing::error!(error = %e, "scheduler: ingest run failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: ingest job registered");
    Ok(())
}

/// Logs a verification report per active store on `PRICEWATCH_VERIFY_CRON`.
async fn register_verify_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);

        Box::pin(async move {
            let reports =
                match pricewatch_ingest::verify_stores(&pool, None, DEFAULT_WINDOW_MINUTES).await {
                    Ok(reports) => reports,
                    Err(e) => {
                        tracing::error!(error = %e, "scheduler: verification failed");
                        return;
                    }
                };

            for report in &reports {
                if report.is_healthy() {
                    tracing::info!(
                        store = %report.store_slug,
                        price_rows = report.store_price_rows,
                        recent_price_updates = report.recent_price_updates,
                        "scheduler: store data verified"
                    );
                } else {
                    tracing::warn!(
                        store = %report.store_slug,
                        failures = ?report.failures(),
                        "scheduler: store data failed verification"
                    );
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: verify job registered");
    Ok(())
}
