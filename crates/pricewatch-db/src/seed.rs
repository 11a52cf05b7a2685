use pricewatch_core::{known_categories, StoreConfig};
use sqlx::PgPool;

use crate::DbError;

/// Upsert stores from the registry into the database.
///
/// Returns the number of stores processed (inserted or updated). All upserts
/// run inside a single transaction; if any operation fails the entire batch
/// is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_stores(pool: &PgPool, stores: &[StoreConfig]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for store in stores {
        sqlx::query(
            "INSERT INTO stores (name, slug, source_kind, base_url, is_active) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (slug) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 source_kind = EXCLUDED.source_kind, \
                 base_url = EXCLUDED.base_url, \
                 is_active = EXCLUDED.is_active, \
                 updated_at = NOW()",
        )
        .bind(&store.name)
        .bind(store.slug())
        .bind(store.source.as_str())
        .bind(store.trimmed_base_url())
        .bind(store.enabled)
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    tracing::info!(count, "seeded stores");
    Ok(count)
}

/// Ensure every keyword-fallback category exists.
///
/// Returns the number of categories newly inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails.
pub async fn seed_categories(pool: &PgPool) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0usize;

    for name in known_categories() {
        let result =
            sqlx::query("INSERT INTO categories (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
                .bind(name)
                .execute(&mut *tx)
                .await?;
        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    tx.commit().await?;
    Ok(inserted)
}
