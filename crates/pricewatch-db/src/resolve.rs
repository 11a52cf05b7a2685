//! Key resolution: match an incoming product description to a stored
//! product, then create it or apply the fields it supplies.

use pricewatch_core::{categorize_product, normalize_key_text, ScrapedProduct};
use sqlx::PgConnection;

use crate::catalog::{get_or_create_category, get_or_create_subcategory};
use crate::DbError;

/// Identity and descriptive fields of a product, as supplied by a scrape or
/// an API client. Only `name` is required.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFields {
    pub api_product_id: Option<i64>,
    pub name: String,
    pub brand: Option<String>,
    pub bar_code: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

impl From<&ScrapedProduct> for ProductFields {
    fn from(record: &ScrapedProduct) -> Self {
        Self {
            api_product_id: record.api_product_id,
            name: record.name.clone(),
            brand: record.brand.clone(),
            bar_code: record.bar_code.clone(),
            image_url: record.image_url.clone(),
            category: record.category.clone(),
            subcategory: record.subcategory.clone(),
        }
    }
}

impl ProductFields {
    /// Copy with key text trimmed and whitespace-collapsed, blank optionals
    /// dropped. `None` when the name is blank.
    #[must_use]
    pub fn normalized(&self) -> Option<Self> {
        Some(Self {
            api_product_id: self.api_product_id,
            name: normalize_key_text(&self.name)?,
            brand: self.brand.as_deref().and_then(normalize_key_text),
            bar_code: self.bar_code.as_deref().and_then(normalize_key_text),
            image_url: self
                .image_url
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            category: self.category.as_deref().and_then(normalize_key_text),
            subcategory: self.subcategory.as_deref().and_then(normalize_key_text),
        })
    }

    /// The category to file the product under: the supplied one, else a
    /// keyword guess from the name.
    #[must_use]
    pub fn category_name(&self) -> String {
        self.category
            .clone()
            .unwrap_or_else(|| categorize_product(&self.name).to_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveAction {
    Created,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedProduct {
    pub product_id: i64,
    pub action: ResolveAction,
}

/// The columns the resolver compares against.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct StoredProduct {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub api_product_id: Option<i64>,
    pub bar_code: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
}

/// Resolved taxonomy ids for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Taxonomy {
    pub category_id: i64,
    pub subcategory_id: Option<i64>,
    /// `false` when the category came from the keyword fallback.
    pub category_supplied: bool,
}

/// Column values to write on an existing product. `None` leaves a column as
/// it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ProductChanges {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub api_product_id: Option<i64>,
    pub bar_code: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
    pub subcategory_id: Option<i64>,
}

impl ProductChanges {
    pub(crate) fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

const STORED_COLUMNS: &str =
    "id, name, brand, api_product_id, bar_code, image_url, category_id, subcategory_id";

/// Works out which supplied fields differ from the stored row.
///
/// A stored `api_product_id` is never overwritten. A keyword-guessed
/// category only fills an empty slot. `key_free` is `false` when the
/// updated `(name, brand, bar_code)` would collide with another product's
/// natural key; the stored key columns are then left alone.
pub(crate) fn plan_changes(
    stored: &StoredProduct,
    fields: &ProductFields,
    taxonomy: Taxonomy,
    key_free: bool,
) -> ProductChanges {
    fn differs<T: PartialEq + Clone>(supplied: Option<&T>, stored: Option<&T>) -> Option<T> {
        match supplied {
            Some(value) if stored != Some(value) => Some(value.clone()),
            _ => None,
        }
    }

    let category_id = if taxonomy.category_supplied || stored.category_id.is_none() {
        differs(Some(&taxonomy.category_id), stored.category_id.as_ref())
    } else {
        None
    };

    ProductChanges {
        name: (key_free && stored.name != fields.name).then(|| fields.name.clone()),
        brand: differs(fields.brand.as_ref(), stored.brand.as_ref()).filter(|_| key_free),
        api_product_id: if stored.api_product_id.is_none() {
            fields.api_product_id
        } else {
            None
        },
        bar_code: differs(fields.bar_code.as_ref(), stored.bar_code.as_ref()).filter(|_| key_free),
        image_url: differs(fields.image_url.as_ref(), stored.image_url.as_ref()),
        category_id,
        subcategory_id: differs(taxonomy.subcategory_id.as_ref(), stored.subcategory_id.as_ref()),
    }
}

/// Get-or-create the category and subcategory named by `fields`.
pub(crate) async fn resolve_taxonomy(
    conn: &mut PgConnection,
    fields: &ProductFields,
) -> Result<Taxonomy, DbError> {
    let category_id = get_or_create_category(conn, &fields.category_name()).await?;
    let subcategory_id = match fields.subcategory.as_deref() {
        Some(sub) => Some(get_or_create_subcategory(conn, category_id, sub).await?),
        None => None,
    };
    Ok(Taxonomy {
        category_id,
        subcategory_id,
        category_supplied: fields.category.is_some(),
    })
}

/// Finds the stored product for `fields`: by `api_product_id` first, then by
/// the natural key `(name, brand, bar_code)`.
pub(crate) async fn find_product(
    conn: &mut PgConnection,
    fields: &ProductFields,
) -> Result<Option<StoredProduct>, DbError> {
    if let Some(api_id) = fields.api_product_id {
        let by_id = sqlx::query_as::<_, StoredProduct>(&format!(
            "SELECT {STORED_COLUMNS} FROM products WHERE api_product_id = $1"
        ))
        .bind(api_id)
        .fetch_optional(&mut *conn)
        .await?;
        if by_id.is_some() {
            return Ok(by_id);
        }
    }

    find_by_natural_key(conn, &fields.name, fields.brand.as_deref(), fields.bar_code.as_deref())
        .await
}

async fn find_by_natural_key(
    conn: &mut PgConnection,
    name: &str,
    brand: Option<&str>,
    bar_code: Option<&str>,
) -> Result<Option<StoredProduct>, DbError> {
    let row = sqlx::query_as::<_, StoredProduct>(&format!(
        "SELECT {STORED_COLUMNS} FROM products \
         WHERE name = $1 \
           AND brand IS NOT DISTINCT FROM $2 \
           AND bar_code IS NOT DISTINCT FROM $3"
    ))
    .bind(name)
    .bind(brand)
    .bind(bar_code)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row)
}

/// Resolves `fields` to a product id, inserting or updating as needed.
///
/// `fields` must already be [`ProductFields::normalized`]. Runs on the
/// caller's connection so it joins the caller's transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails.
pub async fn resolve_product(
    conn: &mut PgConnection,
    fields: &ProductFields,
) -> Result<ResolvedProduct, DbError> {
    let taxonomy = resolve_taxonomy(conn, fields).await?;

    let Some(stored) = find_product(conn, fields).await? else {
        return insert_product(conn, fields, taxonomy).await;
    };

    // The key the row would carry after the update.
    let key_owner = find_by_natural_key(
        conn,
        &fields.name,
        fields.brand.as_deref().or(stored.brand.as_deref()),
        fields.bar_code.as_deref().or(stored.bar_code.as_deref()),
    )
    .await?;
    let key_free = key_owner.as_ref().is_none_or(|other| other.id == stored.id);
    if let Some(other) = key_owner.filter(|_| !key_free) {
        tracing::debug!(
            product_id = stored.id,
            other_product_id = other.id,
            name = %fields.name,
            "updated key would collide with another product; keeping stored name, brand and barcode"
        );
    }

    let changes = plan_changes(&stored, fields, taxonomy, key_free);
    if changes.is_empty() {
        return Ok(ResolvedProduct {
            product_id: stored.id,
            action: ResolveAction::Unchanged,
        });
    }

    sqlx::query(
        "UPDATE products SET \
             name           = COALESCE($1, name), \
             brand          = COALESCE($2, brand), \
             api_product_id = COALESCE($3, api_product_id), \
             bar_code       = COALESCE($4, bar_code), \
             image_url      = COALESCE($5, image_url), \
             category_id    = COALESCE($6, category_id), \
             subcategory_id = COALESCE($7, subcategory_id), \
             updated_at     = NOW() \
         WHERE id = $8",
    )
    .bind(changes.name)
    .bind(changes.brand)
    .bind(changes.api_product_id)
    .bind(changes.bar_code)
    .bind(changes.image_url)
    .bind(changes.category_id)
    .bind(changes.subcategory_id)
    .bind(stored.id)
    .execute(&mut *conn)
    .await?;

    Ok(ResolvedProduct {
        product_id: stored.id,
        action: ResolveAction::Updated,
    })
}

async fn insert_product(
    conn: &mut PgConnection,
    fields: &ProductFields,
    taxonomy: Taxonomy,
) -> Result<ResolvedProduct, DbError> {
    let inserted = sqlx::query_scalar::<_, i64>(
        "INSERT INTO products \
             (name, brand, api_product_id, bar_code, image_url, category_id, subcategory_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT DO NOTHING \
         RETURNING id",
    )
    .bind(&fields.name)
    .bind(&fields.brand)
    .bind(fields.api_product_id)
    .bind(&fields.bar_code)
    .bind(&fields.image_url)
    .bind(taxonomy.category_id)
    .bind(taxonomy.subcategory_id)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(product_id) = inserted {
        return Ok(ResolvedProduct {
            product_id,
            action: ResolveAction::Created,
        });
    }

    // Lost a race with a concurrent insert of the same key.
    let existing = find_product(conn, fields).await?.ok_or(DbError::NotFound)?;
    Ok(ResolvedProduct {
        product_id: existing.id,
        action: ResolveAction::Unchanged,
    })
}

#[cfg(test)]
#[path = "resolve_test.rs"]
mod tests;
