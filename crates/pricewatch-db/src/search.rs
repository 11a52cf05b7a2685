//! Product search and `search_history`.

use sqlx::PgPool;

use crate::products::ProductRow;
use crate::DbError;

/// Escapes `%`, `_` and `\` so user input matches literally inside `ILIKE`.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Case-insensitive substring search over name, brand and barcode.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn search_products(
    pool: &PgPool,
    query: &str,
    limit: i64,
) -> Result<Vec<ProductRow>, DbError> {
    let pattern = format!("%{}%", escape_like(query.trim()));
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "{} \
         WHERE p.name ILIKE $1 OR p.brand ILIKE $1 OR p.bar_code ILIKE $1 \
         ORDER BY (p.name ILIKE $2) DESC, p.name, p.id \
         LIMIT $3",
        crate::products::product_select()
    ))
    .bind(&pattern)
    .bind(format!("{}%", escape_like(query.trim())))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Appends a `search_history` row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn record_search(
    pool: &PgPool,
    user_id: Option<i64>,
    query: &str,
    result_count: usize,
) -> Result<(), DbError> {
    sqlx::query("INSERT INTO search_history (user_id, query, result_count) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(query.trim())
        .bind(i32::try_from(result_count).unwrap_or(i32::MAX))
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("milk"), "milk");
    }
}
