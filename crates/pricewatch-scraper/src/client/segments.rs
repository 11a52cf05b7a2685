//! Segment enumeration and the page walk for one segment.

use std::time::Duration;

use pricewatch_core::{SourceKind, StoreConfig};
use serde_json::Value;

use crate::error::ScraperError;
use crate::types::{Segment, SegmentFetch};

use super::{CatalogClient, MAX_PAGES};

impl CatalogClient {
    /// Enumerates the `(category, subcategory?)` listings of a store.
    ///
    /// A category without subcategories yields one segment with none. If
    /// listing subcategories of one category fails, that category degrades to
    /// a single whole-category segment and the failure is logged.
    ///
    /// # Errors
    ///
    /// Returns the error from the top-level category listing.
    pub async fn list_segments(&self, store: &StoreConfig) -> Result<Vec<Segment>, ScraperError> {
        let base_url = store.trimmed_base_url();
        match store.source {
            SourceKind::Graphql => {
                let categories = self.graphql_categories(base_url).await?;
                Ok(categories
                    .into_iter()
                    .map(|category| Segment {
                        category,
                        subcategory: None,
                    })
                    .collect())
            }
            SourceKind::JsonCatalog => {
                let categories = self.fetch_categories(base_url).await?;
                let mut segments = Vec::new();
                for category in categories {
                    match self.fetch_subcategories(base_url, &category.id).await {
                        Ok(subs) if !subs.is_empty() => {
                            segments.extend(subs.into_iter().map(|sub| Segment {
                                category: category.clone(),
                                subcategory: Some(sub),
                            }));
                        }
                        Ok(_) => segments.push(Segment {
                            category,
                            subcategory: None,
                        }),
                        Err(e) => {
                            tracing::warn!(
                                store = %store.name,
                                category = %category.name,
                                error = %e,
                                "subcategory listing failed; walking whole category"
                            );
                            segments.push(Segment {
                                category,
                                subcategory: None,
                            });
                        }
                    }
                }
                Ok(segments)
            }
        }
    }

    /// Fetches every raw product record of one segment.
    ///
    /// JSON catalog segments are walked from page 1 until a page comes back
    /// empty or without a next-page flag, sleeping `inter_request_delay_ms`
    /// between pages (not before the first). GraphQL segments are a single
    /// request.
    ///
    /// A failing page ends the walk: the returned [`SegmentFetch`] keeps the
    /// pages fetched so far and carries the error. Walking past
    /// [`MAX_PAGES`] ends it with [`ScraperError::PaginationLimit`].
    pub async fn fetch_segment_products(
        &self,
        store: &StoreConfig,
        segment: &Segment,
        page_size: u32,
        inter_request_delay_ms: u64,
    ) -> SegmentFetch {
        let base_url = store.trimmed_base_url();

        if store.source == SourceKind::Graphql {
            return match self
                .graphql_category_products(base_url, &segment.category.id)
                .await
            {
                Ok(products) => SegmentFetch {
                    products,
                    error: None,
                },
                Err(e) => SegmentFetch {
                    products: Vec::new(),
                    error: Some(e),
                },
            };
        }

        let mut fetch = SegmentFetch::default();
        let mut page = 0usize;

        loop {
            page += 1;
            if page > MAX_PAGES {
                fetch.error = Some(ScraperError::PaginationLimit {
                    url: format!("{base_url} [{}]", segment.label()),
                    max_pages: MAX_PAGES,
                });
                break;
            }

            if page > 1 && inter_request_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(inter_request_delay_ms)).await;
            }

            let result = match self
                .fetch_products_page(
                    base_url,
                    &segment.category.id,
                    segment.subcategory.as_ref().map(|s| s.id.as_str()),
                    page,
                    page_size,
                )
                .await
            {
                Ok(result) => result,
                Err(e) => {
                    if page > 1 {
                        tracing::warn!(
                            store = %store.name,
                            segment = %segment.label(),
                            page,
                            kept = fetch.products.len(),
                            error = %e,
                            "page walk stopped early"
                        );
                    }
                    fetch.error = Some(e);
                    break;
                }
            };

            if result.products.is_empty() {
                break;
            }

            tracing::debug!(
                store = %store.name,
                segment = %segment.label(),
                page,
                count = result.products.len(),
                "fetched products page"
            );
            fetch.products.extend(result.products);

            if !result.has_next {
                break;
            }
        }

        fetch
    }
}
