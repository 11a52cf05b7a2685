//! The batch committer: applies one batch of scraped records to the
//! database in a single transaction.

use pricewatch_core::{collapse_duplicates, PriceObservation, PriceOutcome, ScrapedProduct};
use sqlx::{Acquire, PgConnection, PgPool};

use crate::inventory::apply_inventory;
use crate::prices::apply_price;
use crate::resolve::{resolve_product, ProductFields, ResolveAction};
use crate::sale_alerts::{alert_message, fire_sale_alerts};
use crate::DbError;

/// A price that was new or different in this batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceChange {
    pub store_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub outcome: PriceOutcome,
    pub observation: PriceObservation,
}

/// What one committed batch did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Records that reached the database (after duplicate collapsing).
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Records dropped before touching the database (blank name).
    pub skipped: usize,
    /// Input records folded into a later record with the same key.
    pub duplicates: usize,
    /// Records whose statements failed. Each was rolled back on its own;
    /// the rest of the batch still commits.
    pub failed: usize,
    pub inventory_updates: usize,
    pub restocks: usize,
    pub notifications: u64,
    pub price_changes: Vec<PriceChange>,
}

/// Upserts a batch of scraped records for one store.
///
/// Within one transaction, for each record: get-or-create its category and
/// subcategory, resolve the product by upstream id then natural key
/// (creating it or applying changed fields), upsert the store's price and
/// append history when it changed, upsert stock when a quantity is present.
/// Price changes then fire matching sale alerts.
///
/// Records sharing a lookup key are collapsed first, last one wins. Records
/// with a blank name are counted in [`BatchOutcome::skipped`]. Each record
/// runs under its own savepoint: a record whose statements fail is rolled
/// back alone and counted in [`BatchOutcome::failed`].
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if `store_id` does not exist, or
/// [`DbError::Sqlx`] when the transaction itself fails (begin, alert
/// evaluation, commit). Either way nothing from this batch is committed.
pub async fn process_scraped_data(
    pool: &PgPool,
    store_id: i64,
    ingest_run_id: Option<i64>,
    records: &[ScrapedProduct],
) -> Result<BatchOutcome, DbError> {
    let collapsed = collapse_duplicates(records);
    let mut outcome = BatchOutcome {
        duplicates: records.len() - collapsed.len(),
        ..BatchOutcome::default()
    };

    let prepared: Vec<(&ScrapedProduct, ProductFields)> = collapsed
        .iter()
        .filter_map(|record| {
            let fields = ProductFields::from(record).normalized();
            if fields.is_none() {
                outcome.skipped += 1;
            }
            fields.map(|f| (record, f))
        })
        .collect();

    if prepared.is_empty() {
        return Ok(outcome);
    }

    let mut tx = pool.begin().await?;

    let store_name = sqlx::query_scalar::<_, String>("SELECT name FROM stores WHERE id = $1")
        .bind(store_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::NotFound)?;

    for (record, fields) in &prepared {
        let mut savepoint = tx.begin().await?;
        match apply_record(&mut *savepoint, store_id, ingest_run_id, record, fields).await {
            Ok(applied) => {
                savepoint.commit().await?;
                outcome.tally(store_id, applied, fields);
            }
            Err(e) => {
                savepoint.rollback().await?;
                tracing::warn!(
                    store_id,
                    name = %fields.name,
                    api_product_id = ?fields.api_product_id,
                    error = %e,
                    "record rolled back; continuing with batch"
                );
                outcome.failed += 1;
            }
        }
    }

    for change in &outcome.price_changes {
        let message = alert_message(&change.product_name, &store_name, &change.observation);
        outcome.notifications += fire_sale_alerts(
            &mut *tx,
            store_id,
            change.product_id,
            &change.observation,
            &message,
        )
        .await?;
    }

    tx.commit().await?;

    tracing::debug!(
        store_id,
        processed = outcome.processed,
        failed = outcome.failed,
        created = outcome.created,
        updated = outcome.updated,
        skipped = outcome.skipped,
        price_changes = outcome.price_changes.len(),
        notifications = outcome.notifications,
        "batch committed"
    );

    Ok(outcome)
}

/// What one record did inside its savepoint.
#[derive(Debug)]
struct AppliedRecord {
    product_id: i64,
    action: ResolveAction,
    observation: PriceObservation,
    price_outcome: PriceOutcome,
    inventory_updated: bool,
    restocked: bool,
}

impl BatchOutcome {
    fn tally(&mut self, store_id: i64, applied: AppliedRecord, fields: &ProductFields) {
        match applied.action {
            ResolveAction::Created => self.created += 1,
            ResolveAction::Updated => self.updated += 1,
            ResolveAction::Unchanged => self.unchanged += 1,
        }
        if applied.price_outcome != PriceOutcome::Unchanged {
            self.price_changes.push(PriceChange {
                store_id,
                product_id: applied.product_id,
                product_name: fields.name.clone(),
                outcome: applied.price_outcome,
                observation: applied.observation,
            });
        }
        if applied.inventory_updated {
            self.inventory_updates += 1;
        }
        if applied.restocked {
            self.restocks += 1;
        }
        self.processed += 1;
    }
}

async fn apply_record(
    conn: &mut PgConnection,
    store_id: i64,
    ingest_run_id: Option<i64>,
    record: &ScrapedProduct,
    fields: &ProductFields,
) -> Result<AppliedRecord, DbError> {
    let resolved = resolve_product(&mut *conn, fields).await?;

    let observation = record.price_observation();
    let price_outcome = apply_price(
        &mut *conn,
        store_id,
        resolved.product_id,
        &observation,
        record.source_url.as_deref(),
        ingest_run_id,
    )
    .await?;

    let restocked = match record.quantity {
        Some(quantity) => {
            apply_inventory(&mut *conn, store_id, resolved.product_id, quantity).await?
        }
        None => false,
    };

    Ok(AppliedRecord {
        product_id: resolved.product_id,
        action: resolved.action,
        observation,
        price_outcome,
        inventory_updated: record.quantity.is_some(),
        restocked,
    })
}
