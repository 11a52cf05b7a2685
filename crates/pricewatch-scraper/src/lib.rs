pub mod client;
pub mod error;
pub mod normalize;
pub mod pagination;
pub(crate) mod rate_limit;
pub mod types;

pub use client::{CatalogClient, MAX_PAGES};
pub use error::ScraperError;
pub use normalize::normalize_record;
pub use types::{CategoryRef, ProductsPage, Segment, SegmentContext, SegmentFetch};
