//! Endpoints of the paginated JSON catalog upstream.

use serde_json::Value;

use crate::error::ScraperError;
use crate::pagination::has_next_page;
use crate::types::{
    CategoriesResponse, CategoryRef, ProductsEnvelope, ProductsPage, SubcategoriesResponse,
};

use super::{extract_store_origin, CatalogClient};

impl CatalogClient {
    /// `GET {origin}/api/categories`
    ///
    /// # Errors
    ///
    /// Any transport, status, or decode failure as [`ScraperError`].
    pub async fn fetch_categories(&self, base_url: &str) -> Result<Vec<CategoryRef>, ScraperError> {
        let url = Self::api_url(base_url, &["api", "categories"])?;
        let parsed: CategoriesResponse = self
            .get_json(&url, &format!("categories from {base_url}"))
            .await?;
        Ok(parsed.categories)
    }

    /// `GET {origin}/api/categories/{id}/subcategories`
    ///
    /// # Errors
    ///
    /// Any transport, status, or decode failure as [`ScraperError`].
    pub async fn fetch_subcategories(
        &self,
        base_url: &str,
        category_id: &str,
    ) -> Result<Vec<CategoryRef>, ScraperError> {
        let url = Self::api_url(
            base_url,
            &["api", "categories", category_id, "subcategories"],
        )?;
        let parsed: SubcategoriesResponse = self
            .get_json(
                &url,
                &format!("subcategories of {category_id} from {base_url}"),
            )
            .await?;
        Ok(parsed.subcategories)
    }

    /// One page of `GET {origin}/api/products`.
    ///
    /// # Errors
    ///
    /// Any transport, status, or decode failure as [`ScraperError`].
    pub async fn fetch_products_page(
        &self,
        base_url: &str,
        category_id: &str,
        subcategory_id: Option<&str>,
        page: usize,
        page_size: u32,
    ) -> Result<ProductsPage, ScraperError> {
        let url = Self::products_url(base_url, category_id, subcategory_id, page, page_size)?;
        let body: Value = self
            .get_json(&url, &format!("products page {page} from {base_url}"))
            .await?;
        let has_next = has_next_page(&body);
        let envelope: ProductsEnvelope =
            serde_json::from_value(body).map_err(|e| ScraperError::Deserialize {
                context: format!("products page {page} from {base_url}"),
                source: e,
            })?;
        let products = envelope.products.unwrap_or_default();
        Ok(ProductsPage { products, has_next })
    }

    pub(super) fn api_url(base_url: &str, segments: &[&str]) -> Result<String, ScraperError> {
        let origin = extract_store_origin(base_url)?;
        let mut url = reqwest::Url::parse(&origin).map_err(|e| ScraperError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        url.path_segments_mut()
            .map_err(|()| ScraperError::InvalidBaseUrl {
                base_url: base_url.to_owned(),
                reason: "URL cannot be a base".to_owned(),
            })?
            .clear()
            .extend(segments);
        Ok(url.to_string())
    }

    pub(super) fn products_url(
        base_url: &str,
        category_id: &str,
        subcategory_id: Option<&str>,
        page: usize,
        page_size: u32,
    ) -> Result<String, ScraperError> {
        let mut url = reqwest::Url::parse(&Self::api_url(base_url, &["api", "products"])?)
            .map_err(|e| ScraperError::InvalidBaseUrl {
                base_url: base_url.to_owned(),
                reason: e.to_string(),
            })?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("category", category_id);
            if let Some(sub) = subcategory_id {
                q.append_pair("subcategory", sub);
            }
            q.append_pair("page", &page.to_string());
            q.append_pair("pageSize", &page_size.to_string());
        }
        Ok(url.to_string())
    }
}
