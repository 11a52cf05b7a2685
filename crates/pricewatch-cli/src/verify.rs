//! `verify` subcommand: prints a health report per store.

use pricewatch_ingest::VerificationReport;

/// # Errors
///
/// Returns an error if the queries fail or any store is unhealthy.
pub(crate) async fn run_verify(
    pool: &sqlx::PgPool,
    store_filter: Option<&str>,
    window_minutes: i32,
    json: bool,
) -> anyhow::Result<()> {
    let reports = pricewatch_ingest::verify_stores(pool, store_filter, window_minutes).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!("{}", format_report(report));
        }
    }

    let unhealthy = reports.iter().filter(|r| !r.is_healthy()).count();
    if unhealthy > 0 {
        anyhow::bail!("{unhealthy} of {} stores failed verification", reports.len());
    }
    Ok(())
}

fn format_report(report: &VerificationReport) -> String {
    let verdict = if report.is_healthy() {
        "ok".to_string()
    } else {
        format!("FAILED ({})", report.failures().join(", "))
    };
    format!(
        "{}: {verdict}\n  price rows: {}\n  updated in last {} min: {}\n  \
         new products in last {} min: {}\n  categories: {}\n  products: {}",
        report.store_slug,
        report.store_price_rows,
        report.window_minutes,
        report.recent_price_updates,
        report.window_minutes,
        report.recent_products,
        report.category_count,
        report.total_products,
    )
}

#[cfg(test)]
mod tests {
    use super::format_report;
    use pricewatch_ingest::VerificationReport;

    fn report(store_id: Option<i64>, price_rows: i64) -> VerificationReport {
        VerificationReport {
            store_slug: "nabiji".to_string(),
            store_id,
            window_minutes: 10,
            recent_products: 2,
            recent_price_updates: 5,
            store_price_rows: price_rows,
            category_count: 4,
            total_products: 30,
        }
    }

    #[test]
    fn healthy_report_is_ok() {
        let text = format_report(&report(Some(1), 30));
        assert!(text.starts_with("nabiji: ok"));
        assert!(text.contains("updated in last 10 min: 5"));
    }

    #[test]
    fn failed_report_lists_failures() {
        let text = format_report(&report(None, 0));
        assert!(text.contains("FAILED (store not found, store has no prices)"));
    }
}
