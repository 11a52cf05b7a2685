//! Post-ingest health check for a store's data.

use serde::Serialize;
use sqlx::PgPool;

use crate::IngestError;

/// Window used when the caller does not pick one.
pub const DEFAULT_WINDOW_MINUTES: i32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub store_slug: String,
    /// `None` when no store has this slug.
    pub store_id: Option<i64>,
    pub window_minutes: i32,
    pub recent_products: i64,
    pub recent_price_updates: i64,
    pub store_price_rows: i64,
    pub category_count: i64,
    pub total_products: i64,
}

impl VerificationReport {
    fn missing_store(slug: &str, window_minutes: i32) -> Self {
        Self {
            store_slug: slug.to_string(),
            store_id: None,
            window_minutes,
            recent_products: 0,
            recent_price_updates: 0,
            store_price_rows: 0,
            category_count: 0,
            total_products: 0,
        }
    }

    /// Names of the checks that failed, in check order.
    #[must_use]
    pub fn failures(&self) -> Vec<&'static str> {
        let mut failed = Vec::new();
        if self.store_id.is_none() {
            failed.push("store not found");
        }
        if self.store_price_rows == 0 {
            failed.push("store has no prices");
        }
        if self.category_count == 0 {
            failed.push("no categories");
        }
        if self.total_products == 0 {
            failed.push("no products");
        }
        failed
    }

    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.failures().is_empty()
    }

    /// Whether any of the store's prices were refreshed within the window.
    /// Informational; a quiet window is not a failure.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.recent_price_updates > 0
    }
}

/// Builds the report for one store slug. An unknown slug yields an
/// unhealthy report rather than an error.
///
/// # Errors
///
/// Returns [`IngestError::Db`] if a query fails.
pub async fn verify_store_data(
    pool: &PgPool,
    slug: &str,
    window_minutes: i32,
) -> Result<VerificationReport, IngestError> {
    let window_minutes = window_minutes.max(1);
    let Some(store) = pricewatch_db::get_store_by_slug(pool, slug).await? else {
        tracing::warn!(store = %slug, "verification: store not found");
        return Ok(VerificationReport::missing_store(slug, window_minutes));
    };

    let counts = pricewatch_db::store_data_counts(pool, store.id, window_minutes).await?;
    let report = VerificationReport {
        store_slug: store.slug,
        store_id: Some(store.id),
        window_minutes,
        recent_products: counts.recent_products,
        recent_price_updates: counts.recent_price_updates,
        store_price_rows: counts.store_price_rows,
        category_count: counts.category_count,
        total_products: counts.total_products,
    };

    if report.is_healthy() {
        tracing::info!(
            store = %report.store_slug,
            recent_price_updates = report.recent_price_updates,
            total_products = report.total_products,
            "verification passed"
        );
    } else {
        tracing::warn!(
            store = %report.store_slug,
            failures = ?report.failures(),
            "verification failed"
        );
    }
    Ok(report)
}

/// Verifies `store_filter`, or every active store.
///
/// # Errors
///
/// Returns [`IngestError::Db`] if a query fails.
pub async fn verify_stores(
    pool: &PgPool,
    store_filter: Option<&str>,
    window_minutes: i32,
) -> Result<Vec<VerificationReport>, IngestError> {
    let slugs: Vec<String> = match store_filter {
        Some(slug) => vec![slug.to_string()],
        None => pricewatch_db::list_active_stores(pool)
            .await?
            .into_iter()
            .map(|s| s.slug)
            .collect(),
    };

    let mut reports = Vec::with_capacity(slugs.len());
    for slug in &slugs {
        reports.push(verify_store_data(pool, slug, window_minutes).await?);
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn healthy() -> VerificationReport {
        VerificationReport {
            store_slug: "spar".to_string(),
            store_id: Some(1),
            window_minutes: 10,
            recent_products: 3,
            recent_price_updates: 3,
            store_price_rows: 40,
            category_count: 11,
            total_products: 120,
        }
    }

    #[test]
    fn full_report_is_healthy() {
        let r = healthy();
        assert!(r.is_healthy());
        assert!(r.is_fresh());
    }

    #[test]
    fn quiet_window_is_stale_but_healthy() {
        let r = VerificationReport {
            recent_products: 0,
            recent_price_updates: 0,
            ..healthy()
        };
        assert!(r.is_healthy());
        assert!(!r.is_fresh());
    }

    #[test]
    fn missing_store_fails_every_check() {
        let r = VerificationReport::missing_store("ghost", 10);
        assert_eq!(
            r.failures(),
            vec!["store not found", "store has no prices", "no categories", "no products"]
        );
    }

    #[test]
    fn empty_catalog_is_unhealthy() {
        let r = VerificationReport {
            category_count: 0,
            ..healthy()
        };
        assert_eq!(r.failures(), vec!["no categories"]);
    }
}
