//! `collect` subcommand: one ingest run per selected store.
//!
//! Per-store failures are recorded on that store's run and printed; the
//! command only fails when every store failed.

use pricewatch_ingest::{IngestSummary, StoreRunSummary};

/// # Errors
///
/// Returns an error if the store filter names an unknown or inactive store,
/// the HTTP client cannot be built, or every store run failed.
pub(crate) async fn run_collect(
    pool: &sqlx::PgPool,
    config: &pricewatch_core::AppConfig,
    store_filter: Option<&str>,
    dry_run: bool,
) -> anyhow::Result<()> {
    if dry_run {
        let stores = pricewatch_ingest::resolve_stores(pool, store_filter).await?;
        let slugs: Vec<&str> = stores.iter().map(|s| s.slug.as_str()).collect();
        println!(
            "dry-run: would collect {} stores: [{}]",
            stores.len(),
            slugs.join(", ")
        );
        return Ok(());
    }

    let summary = pricewatch_ingest::run_ingest(pool, config, store_filter, "cli").await?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &IngestSummary) {
    for store in &summary.stores {
        println!("{}", format_store_line(store));
    }
    println!(
        "{} stores, {} failed, {} records processed",
        summary.stores.len(),
        summary.failed_count(),
        summary.total_processed()
    );
}

fn format_store_line(store: &StoreRunSummary) -> String {
    let report = &store.report;
    let mut line = format!(
        "{} (run {}): {} processed={} created={} updated={} skipped={} notifications={}",
        store.store_slug,
        store.run_id,
        store.status.as_str(),
        report.processed,
        report.created,
        report.updated,
        report.dropped(),
        report.notifications,
    );
    if let Some(error) = &store.error {
        line.push_str(&format!(" error=\"{error}\""));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::format_store_line;
    use pricewatch_db::RunStatus;
    use pricewatch_ingest::{StoreIngestReport, StoreRunSummary};

    #[test]
    fn store_line_folds_every_skip_into_one_count() {
        let summary = StoreRunSummary {
            store_slug: "spar".to_string(),
            run_id: 7,
            status: RunStatus::Partial,
            report: StoreIngestReport {
                processed: 40,
                created: 3,
                updated: 5,
                skipped: 1,
                normalize_failures: 2,
                lost_records: 4,
                failed_records: 2,
                notifications: 1,
                ..StoreIngestReport::default()
            },
            error: Some("1 of 4 segments failed".to_string()),
        };

        let line = format_store_line(&summary);
        assert!(line.starts_with("spar (run 7): partial"));
        assert!(line.contains("skipped=9"));
        assert!(line.contains("error=\"1 of 4 segments failed\""));
    }
}
