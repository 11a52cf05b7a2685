pub mod app_config;
pub mod catalog;
pub mod categorize;
pub mod config;
pub mod pricing;
pub mod stores;

pub use app_config::{AppConfig, Environment};
pub use catalog::{
    collapse_duplicates, PriceObservation, PriceOutcome, ProductKey, ScrapedProduct,
};
pub use categorize::{categorize_product, known_categories, OTHER_CATEGORY};
pub use config::{load_app_config, load_app_config_from_env};
pub use pricing::{in_price_range, normalize_key_text, parse_price, parse_price_str, MAX_PRICE};
pub use stores::{is_origin_url, load_stores, slugify, SourceKind, StoreConfig, StoresFile};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read stores file {path}: {source}")]
    StoresFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse stores file: {0}")]
    StoresFileParse(#[source] serde_yaml::Error),

    #[error("stores config validation failed: {0}")]
    Validation(String),
}
