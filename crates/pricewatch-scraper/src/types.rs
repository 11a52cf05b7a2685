//! Upstream response shapes.
//!
//! Category ids arrive as numbers from some stores and as strings from
//! others; [`CategoryRef`] keeps them as text. Product records stay as raw
//! [`serde_json::Value`] because their field names vary by store and are
//! resolved in [`crate::normalize`].

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ScraperError;

/// A category or subcategory as listed by the upstream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryRef {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// `GET /api/categories`
#[derive(Debug, Deserialize)]
pub struct CategoriesResponse {
    #[serde(default)]
    pub categories: Vec<CategoryRef>,
}

/// `GET /api/categories/{id}/subcategories`
#[derive(Debug, Deserialize)]
pub struct SubcategoriesResponse {
    #[serde(default)]
    pub subcategories: Vec<CategoryRef>,
}

/// `GET /api/products` body. `products` may be absent or `null` on the
/// last page.
#[derive(Debug, Deserialize)]
pub struct ProductsEnvelope {
    #[serde(default)]
    pub products: Option<Vec<Value>>,
}

/// One page of raw product records plus the next-page flag.
#[derive(Debug, Clone)]
pub struct ProductsPage {
    pub products: Vec<Value>,
    pub has_next: bool,
}

/// Standard GraphQL envelope.
#[derive(Debug, Deserialize)]
pub struct GraphqlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphqlErrorEntry>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlErrorEntry {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlCategories {
    #[serde(default)]
    pub categories: Vec<CategoryRef>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlCategoryProducts {
    pub category: Option<GraphqlProductList>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlProductList {
    #[serde(default)]
    pub products: Vec<Value>,
}

/// A listing walked page by page: one category, optionally narrowed to a
/// subcategory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub category: CategoryRef,
    pub subcategory: Option<CategoryRef>,
}

impl Segment {
    /// Human-readable label for logs, e.g. `"Dairy / Milk"`.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.subcategory {
            Some(sub) => format!("{} / {}", self.category.name, sub.name),
            None => self.category.name.clone(),
        }
    }

    /// Context handed to the normalizer for records in this segment.
    #[must_use]
    pub fn context(&self, origin: &str) -> SegmentContext {
        SegmentContext {
            category_name: non_empty(&self.category.name),
            subcategory_name: self.subcategory.as_ref().and_then(|s| non_empty(&s.name)),
            origin: Some(origin.trim_end_matches('/').to_string()),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}

/// Raw records of one segment. `error` is set when the walk stopped early;
/// `products` still holds every page fetched before that.
#[derive(Debug, Default)]
pub struct SegmentFetch {
    pub products: Vec<Value>,
    pub error: Option<ScraperError>,
}

impl SegmentFetch {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Strict view: any error wins over the records fetched before it.
    ///
    /// # Errors
    ///
    /// Returns the error that stopped the walk.
    pub fn into_result(self) -> Result<Vec<Value>, ScraperError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.products),
        }
    }
}

/// Defaults the normalizer falls back to when a record omits them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentContext {
    pub category_name: Option<String>,
    pub subcategory_name: Option<String>,
    /// Store origin (`https://host`), used to absolutize relative links.
    pub origin: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn category_ids_accept_numbers_and_strings() {
        let parsed: CategoriesResponse = serde_json::from_value(json!({
            "categories": [{"id": 12, "name": "Dairy"}, {"id": "abc", "name": "Bakery"}]
        }))
        .unwrap();
        assert_eq!(parsed.categories[0].id, "12");
        assert_eq!(parsed.categories[1].id, "abc");
    }

    #[test]
    fn category_id_rejects_other_types() {
        let result: Result<CategoryRef, _> = serde_json::from_value(json!({"id": [1]}));
        assert!(result.is_err());
    }

    #[test]
    fn segment_label_and_context() {
        let seg = Segment {
            category: CategoryRef {
                id: "1".into(),
                name: "Dairy".into(),
            },
            subcategory: Some(CategoryRef {
                id: "7".into(),
                name: " ".into(),
            }),
        };
        assert_eq!(seg.label(), "Dairy /  ");
        let ctx = seg.context("https://spar.example/");
        assert_eq!(ctx.category_name.as_deref(), Some("Dairy"));
        assert_eq!(ctx.subcategory_name, None);
        assert_eq!(ctx.origin.as_deref(), Some("https://spar.example"));
    }
}
