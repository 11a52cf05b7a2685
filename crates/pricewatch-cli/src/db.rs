//! `db` subcommand handlers.

use sqlx::PgPool;

pub(crate) async fn run_ping(pool: &PgPool) -> anyhow::Result<()> {
    pricewatch_db::ping(pool).await?;
    println!("database connection ok");
    Ok(())
}

pub(crate) async fn run_migrate(pool: &PgPool) -> anyhow::Result<()> {
    let applied = pricewatch_db::run_migrations(pool).await?;
    println!("applied {applied} migrations");
    Ok(())
}

/// Upserts every store in the registry (disabled ones as inactive) and
/// inserts any missing fallback categories.
///
/// # Errors
///
/// Returns an error if the registry cannot be loaded or validated, or if
/// either seeding transaction fails.
pub(crate) async fn run_seed(
    pool: &PgPool,
    config: &pricewatch_core::AppConfig,
) -> anyhow::Result<()> {
    let registry = pricewatch_core::load_stores(&config.stores_path)?;
    let stores = pricewatch_db::seed_stores(pool, &registry.stores).await?;
    let categories = pricewatch_db::seed_categories(pool).await?;
    println!(
        "seeded {stores} stores ({} enabled) and {categories} new categories",
        registry.enabled().count()
    );
    Ok(())
}
