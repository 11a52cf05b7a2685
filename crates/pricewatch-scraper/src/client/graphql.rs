//! Queries against a store's `/graphql` endpoint.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::ScraperError;
use crate::types::{
    CategoryRef, GraphqlCategories, GraphqlCategoryProducts, GraphqlResponse,
};

use super::CatalogClient;

const CATEGORIES_QUERY: &str = "{ categories { id name } }";

const CATEGORY_PRODUCTS_QUERY: &str = "query getCategoryProducts($id: Int!) { \
     category(id: $id) { products { id name price image } } }";

impl CatalogClient {
    /// All top-level categories.
    ///
    /// # Errors
    ///
    /// Transport failures, or [`ScraperError::Graphql`] when the response
    /// carries errors and no data.
    pub async fn graphql_categories(
        &self,
        base_url: &str,
    ) -> Result<Vec<CategoryRef>, ScraperError> {
        let data: GraphqlCategories = self
            .graphql(base_url, &json!({ "query": CATEGORIES_QUERY }), "categories")
            .await?;
        Ok(data.categories)
    }

    /// Every product of one category. The endpoint is not paginated.
    ///
    /// # Errors
    ///
    /// Transport failures, or [`ScraperError::Graphql`] when the response
    /// carries errors and no data.
    pub async fn graphql_category_products(
        &self,
        base_url: &str,
        category_id: &str,
    ) -> Result<Vec<Value>, ScraperError> {
        let payload = json!({
            "query": CATEGORY_PRODUCTS_QUERY,
            "variables": { "id": graphql_id(category_id) },
        });
        let data: GraphqlCategoryProducts = self
            .graphql(base_url, &payload, "category products")
            .await?;
        Ok(data.category.map(|c| c.products).unwrap_or_default())
    }

    async fn graphql<T: DeserializeOwned>(
        &self,
        base_url: &str,
        payload: &Value,
        what: &str,
    ) -> Result<T, ScraperError> {
        let url = Self::api_url(base_url, &["graphql"])?;
        let response: GraphqlResponse<T> = self
            .post_json(&url, payload, &format!("GraphQL {what} from {base_url}"))
            .await?;

        match response.data {
            Some(data) => {
                if !response.errors.is_empty() {
                    tracing::warn!(
                        url = %url,
                        errors = response.errors.len(),
                        "GraphQL response carried partial errors"
                    );
                }
                Ok(data)
            }
            None => Err(ScraperError::Graphql {
                url,
                message: response
                    .errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
            }),
        }
    }
}

/// Numeric ids go out as JSON numbers to satisfy `Int!`.
fn graphql_id(id: &str) -> Value {
    id.parse::<i64>().map_or_else(|_| json!(id), |n| json!(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graphql_id_prefers_numbers() {
        assert_eq!(graphql_id("42"), json!(42));
        assert_eq!(graphql_id("cat-7"), json!("cat-7"));
    }
}
