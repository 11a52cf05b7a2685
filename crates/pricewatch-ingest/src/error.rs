use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("scraper error: {0}")]
    Scraper(#[from] pricewatch_scraper::ScraperError),

    #[error("database error: {0}")]
    Db(#[from] pricewatch_db::DbError),

    #[error("store '{0}' not found")]
    StoreNotFound(String),

    #[error("store '{0}' is inactive")]
    StoreInactive(String),

    #[error("store '{slug}' has unknown source kind '{source_kind}'")]
    UnknownSourceKind { slug: String, source_kind: String },

    #[error("all {0} store runs failed")]
    AllStoresFailed(usize),
}
