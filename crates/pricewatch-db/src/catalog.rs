//! Database operations for `categories` and `subcategories`.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row and input types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub name_ka: Option<String>,
    pub name_en: Option<String>,
    pub name_ru: Option<String>,
    pub icon: Option<String>,
    /// Number of products currently filed under this category.
    pub product_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubcategoryRow {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub name_ka: Option<String>,
    pub name_en: Option<String>,
    pub name_ru: Option<String>,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full set of writable category fields. `update_category` replaces all of
/// them.
#[derive(Debug, Clone, Default)]
pub struct CategoryInput {
    pub name: String,
    pub name_ka: Option<String>,
    pub name_en: Option<String>,
    pub name_ru: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SubcategoryInput {
    pub category_id: i64,
    pub name: String,
    pub name_ka: Option<String>,
    pub name_en: Option<String>,
    pub name_ru: Option<String>,
    pub icon: Option<String>,
}

/// Partial subcategory update; `None` leaves a column untouched.
#[derive(Debug, Clone, Default)]
pub struct SubcategoryPatch {
    pub category_id: Option<i64>,
    pub name: Option<String>,
    pub name_ka: Option<String>,
    pub name_en: Option<String>,
    pub name_ru: Option<String>,
    pub icon: Option<String>,
}

const CATEGORY_SELECT: &str = "SELECT c.id, c.name, c.name_ka, c.name_en, c.name_ru, c.icon, \
         (SELECT COUNT(*) FROM products p WHERE p.category_id = c.id) AS product_count, \
         c.created_at, c.updated_at \
     FROM categories c";

const SUBCATEGORY_COLUMNS: &str =
    "id, category_id, name, name_ka, name_en, name_ru, icon, created_at, updated_at";

// ---------------------------------------------------------------------------
// Resolution used by the batch committer
// ---------------------------------------------------------------------------

/// Returns the id of the category named `name`, inserting it first if absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn get_or_create_category(conn: &mut PgConnection, name: &str) -> Result<i64, DbError> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT id FROM categories WHERE name = $1")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;
    if let Some(id) = existing {
        return Ok(id);
    }

    // A concurrent ingest may have inserted the same name in between; the
    // no-op update makes RETURNING yield the existing id in that case.
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO categories (name) VALUES ($1) \
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
         RETURNING id",
    )
    .bind(name)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

/// Returns the id of subcategory `name` under `category_id`, inserting it if
/// absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn get_or_create_subcategory(
    conn: &mut PgConnection,
    category_id: i64,
    name: &str,
) -> Result<i64, DbError> {
    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM subcategories WHERE category_id = $1 AND name = $2",
    )
    .bind(category_id)
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;
    if let Some(id) = existing {
        return Ok(id);
    }

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO subcategories (category_id, name) VALUES ($1, $2) \
         ON CONFLICT (category_id, name) DO UPDATE SET name = EXCLUDED.name \
         RETURNING id",
    )
    .bind(category_id)
    .bind(name)
    .fetch_one(&mut *conn)
    .await?;

    Ok(id)
}

// ---------------------------------------------------------------------------
// categories CRUD
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (a duplicate name is a
/// unique violation).
pub async fn create_category(pool: &PgPool, input: &CategoryInput) -> Result<CategoryRow, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO categories (name, name_ka, name_en, name_ru, icon) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(input.name.trim())
    .bind(&input.name_ka)
    .bind(&input.name_en)
    .bind(&input.name_ru)
    .bind(&input.icon)
    .fetch_one(pool)
    .await?;

    get_category(pool, id).await
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no category has this `id`.
pub async fn get_category(pool: &PgPool, id: i64) -> Result<CategoryRow, DbError> {
    sqlx::query_as::<_, CategoryRow>(&format!("{CATEGORY_SELECT} WHERE c.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Categories ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_categories(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<Vec<CategoryRow>, DbError> {
    let rows = sqlx::query_as::<_, CategoryRow>(&format!(
        "{CATEGORY_SELECT} ORDER BY c.name LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Replaces every writable column of a category.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no category has this `id`.
pub async fn update_category(
    pool: &PgPool,
    id: i64,
    input: &CategoryInput,
) -> Result<CategoryRow, DbError> {
    let result = sqlx::query(
        "UPDATE categories SET \
             name = $1, name_ka = $2, name_en = $3, name_ru = $4, icon = $5, \
             updated_at = NOW() \
         WHERE id = $6",
    )
    .bind(input.name.trim())
    .bind(&input.name_ka)
    .bind(&input.name_en)
    .bind(&input.name_ru)
    .bind(&input.icon)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    get_category(pool, id).await
}

/// Deletes a category. Its subcategories go with it; products keep existing
/// with no category.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no category has this `id`.
pub async fn delete_category(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// subcategories CRUD
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including a foreign key
/// violation when the parent category does not exist.
pub async fn create_subcategory(
    pool: &PgPool,
    input: &SubcategoryInput,
) -> Result<SubcategoryRow, DbError> {
    let row = sqlx::query_as::<_, SubcategoryRow>(&format!(
        "INSERT INTO subcategories (category_id, name, name_ka, name_en, name_ru, icon) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {SUBCATEGORY_COLUMNS}"
    ))
    .bind(input.category_id)
    .bind(input.name.trim())
    .bind(&input.name_ka)
    .bind(&input.name_en)
    .bind(&input.name_ru)
    .bind(&input.icon)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no subcategory has this `id`.
pub async fn get_subcategory(pool: &PgPool, id: i64) -> Result<SubcategoryRow, DbError> {
    sqlx::query_as::<_, SubcategoryRow>(&format!(
        "SELECT {SUBCATEGORY_COLUMNS} FROM subcategories WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Subcategories ordered by name, optionally restricted to one category.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_subcategories(
    pool: &PgPool,
    category_id: Option<i64>,
    limit: i64,
    offset: i64,
) -> Result<Vec<SubcategoryRow>, DbError> {
    let rows = sqlx::query_as::<_, SubcategoryRow>(&format!(
        "SELECT {SUBCATEGORY_COLUMNS} FROM subcategories \
         WHERE ($1::BIGINT IS NULL OR category_id = $1) \
         ORDER BY name, id \
         LIMIT $2 OFFSET $3"
    ))
    .bind(category_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Applies the fields set in `patch`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no subcategory has this `id`.
pub async fn update_subcategory(
    pool: &PgPool,
    id: i64,
    patch: &SubcategoryPatch,
) -> Result<SubcategoryRow, DbError> {
    sqlx::query_as::<_, SubcategoryRow>(&format!(
        "UPDATE subcategories SET \
             category_id = COALESCE($1, category_id), \
             name        = COALESCE($2, name), \
             name_ka     = COALESCE($3, name_ka), \
             name_en     = COALESCE($4, name_en), \
             name_ru     = COALESCE($5, name_ru), \
             icon        = COALESCE($6, icon), \
             updated_at  = NOW() \
         WHERE id = $7 \
         RETURNING {SUBCATEGORY_COLUMNS}"
    ))
    .bind(patch.category_id)
    .bind(patch.name.as_deref().map(str::trim))
    .bind(&patch.name_ka)
    .bind(&patch.name_en)
    .bind(&patch.name_ru)
    .bind(&patch.icon)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no subcategory has this `id`.
pub async fn delete_subcategory(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM subcategories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
