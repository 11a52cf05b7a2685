//! Scraped catalog records and the pure rules applied to them before they
//! reach the database.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pricing::normalize_key_text;

/// A single product listing as fetched from an upstream store, normalized
/// from whatever shape the upstream payload used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapedProduct {
    /// Upstream identifier as text, exactly as the source returned it.
    pub source_product_id: Option<String>,
    /// Upstream identifier when it is numeric. Used as the primary match key.
    pub api_product_id: Option<i64>,
    pub name: String,
    pub brand: Option<String>,
    pub bar_code: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    /// Current shelf price.
    pub price: Decimal,
    /// Price before the current discount, if the store shows one.
    pub previous_price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub source_url: Option<String>,
}

impl ScrapedProduct {
    /// Minimal record; optional fields start empty.
    #[must_use]
    pub fn new(name: impl Into<String>, price: Decimal) -> Self {
        Self {
            source_product_id: None,
            api_product_id: None,
            name: name.into(),
            brand: None,
            bar_code: None,
            image_url: None,
            category: None,
            subcategory: None,
            price,
            previous_price: None,
            quantity: None,
            source_url: None,
        }
    }

    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.previous_price.is_some_and(|prev| prev > self.price)
    }

    /// The undiscounted price: `previous_price` while on sale, else `price`.
    #[must_use]
    pub fn regular_price(&self) -> Decimal {
        match self.previous_price {
            Some(prev) if prev > self.price => prev,
            _ => self.price,
        }
    }

    #[must_use]
    pub fn sale_price(&self) -> Option<Decimal> {
        self.is_on_sale().then_some(self.price)
    }

    /// `true` when the record has no usable name and must be skipped.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        normalize_key_text(&self.name).is_none()
    }

    /// The natural key `(name, brand, bar_code)`, normalized. `None` for
    /// blank names.
    #[must_use]
    pub fn natural_key(&self) -> Option<ProductKey> {
        let name = normalize_key_text(&self.name)?;
        Some(ProductKey::Natural {
            name,
            brand: self.brand.as_deref().and_then(normalize_key_text),
            bar_code: self.bar_code.as_deref().and_then(normalize_key_text),
        })
    }

    /// Keys to try, in order, when resolving this record against stored
    /// products: the upstream id first, then the natural key.
    #[must_use]
    pub fn lookup_keys(&self) -> Vec<ProductKey> {
        let mut keys = Vec::with_capacity(2);
        if let Some(id) = self.api_product_id {
            keys.push(ProductKey::ApiId(id));
        }
        if let Some(natural) = self.natural_key() {
            keys.push(natural);
        }
        keys
    }

    #[must_use]
    pub fn price_observation(&self) -> PriceObservation {
        PriceObservation {
            price: self.regular_price(),
            sale_price: self.sale_price(),
            is_on_sale: self.is_on_sale(),
        }
    }
}

/// Identity used to match a scraped record to a stored product.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProductKey {
    ApiId(i64),
    Natural {
        name: String,
        brand: Option<String>,
        bar_code: Option<String>,
    },
}

/// Collapse records that share their primary lookup key, keeping the last
/// occurrence's contents at the first occurrence's position. Blank records
/// pass through untouched so the caller can count them.
#[must_use]
pub fn collapse_duplicates(records: &[ScrapedProduct]) -> Vec<ScrapedProduct> {
    let mut out: Vec<ScrapedProduct> = Vec::with_capacity(records.len());
    let mut positions: HashMap<ProductKey, usize> = HashMap::new();

    for record in records {
        let Some(key) = record.lookup_keys().into_iter().next() else {
            out.push(record.clone());
            continue;
        };
        if let Some(&idx) = positions.get(&key) {
            out[idx] = record.clone();
        } else {
            positions.insert(key, out.len());
            out.push(record.clone());
        }
    }

    out
}

/// The price facts compared between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub price: Decimal,
    pub sale_price: Option<Decimal>,
    pub is_on_sale: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceOutcome {
    New,
    Changed,
    Unchanged,
}

impl PriceObservation {
    /// What a shopper pays right now.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        match self.sale_price {
            Some(sale) if self.is_on_sale => sale,
            _ => self.price,
        }
    }

    #[must_use]
    pub fn classify(&self, previous: Option<&PriceObservation>) -> PriceOutcome {
        match previous {
            None => PriceOutcome::New,
            Some(prev) if prev == self => PriceOutcome::Unchanged,
            Some(_) => PriceOutcome::Changed,
        }
    }
}
