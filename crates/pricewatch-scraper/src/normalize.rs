//! Normalization from heterogeneous upstream records to
//! [`pricewatch_core::ScrapedProduct`].
//!
//! Stores name the same field differently (`name` vs `title` vs
//! `productName`, `price` vs `currentPrice`, ...). Each field is resolved
//! from a synonym list: top-level keys first, then one level down inside
//! wrapper objects such as `{"product": {...}}` or `{"pricing": {...}}`.

use pricewatch_core::{parse_price, ScrapedProduct};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::error::ScraperError;
use crate::types::SegmentContext;

const NAME_KEYS: &[&str] = &[
    "name",
    "title",
    "productName",
    "product_name",
    "caption",
    "label",
    "fullName",
    "displayName",
];
const PRICE_KEYS: &[&str] = &[
    "price",
    "currentPrice",
    "salePrice",
    "unitPrice",
    "priceValue",
    "amount",
    "value",
    "finalPrice",
];
const PREVIOUS_PRICE_KEYS: &[&str] = &[
    "previousPrice",
    "oldPrice",
    "regularPrice",
    "originalPrice",
    "compareAtPrice",
    "previous_price",
    "old_price",
];
const IMAGE_KEYS: &[&str] = &[
    "imageUrl",
    "image",
    "imageURL",
    "img",
    "thumbnail",
    "picture",
    "photo",
    "imageurl",
    "image_src",
];
const BARCODE_KEYS: &[&str] = &["barCode", "barcode", "bar_code", "ean", "gtin"];
const BRAND_KEYS: &[&str] = &["brand", "brandName", "brand_name", "manufacturer", "producer"];
const ID_KEYS: &[&str] = &["id", "productId", "product_id", "externalId"];
const QUANTITY_KEYS: &[&str] = &[
    "quantity",
    "stock",
    "stockQuantity",
    "availableQuantity",
    "qty",
];
const URL_KEYS: &[&str] = &["url", "productUrl", "link", "href"];
const CATEGORY_KEYS: &[&str] = &[
    "category",
    "categoryName",
    "category_name",
    "group",
    "groupName",
    "categoryTitle",
];
const SUBCATEGORY_KEYS: &[&str] = &[
    "subcategory",
    "subCategory",
    "subcategoryName",
    "sub_category_name",
    "subGroup",
    "subgroupName",
    "subCategoryTitle",
];

/// Every key that names a field directly. Objects under these keys are
/// values, not wrappers, and are never searched for other fields.
const FIELD_KEY_SETS: &[&[&str]] = &[
    NAME_KEYS,
    PRICE_KEYS,
    PREVIOUS_PRICE_KEYS,
    IMAGE_KEYS,
    BARCODE_KEYS,
    BRAND_KEYS,
    ID_KEYS,
    QUANTITY_KEYS,
    URL_KEYS,
    CATEGORY_KEYS,
    SUBCATEGORY_KEYS,
];

/// Normalizes one raw upstream record.
///
/// Category and subcategory fall back to the segment the record was listed
/// under. Relative image and product links are made absolute against the
/// store origin; when no product link is present one is derived from the id
/// as `{origin}/product/{id}`.
///
/// # Errors
///
/// Returns [`ScraperError::Normalization`] if the record is not an object or
/// has no usable name or price. Callers skip such records.
pub fn normalize_record(
    record: &Value,
    ctx: &SegmentContext,
) -> Result<ScrapedProduct, ScraperError> {
    let Some(obj) = record.as_object() else {
        return Err(ScraperError::Normalization {
            record_id: "<non-object>".to_string(),
            reason: "record is not a JSON object".to_string(),
        });
    };

    let source_product_id = find_value(obj, ID_KEYS).and_then(scalar_text);
    let record_id = source_product_id
        .clone()
        .unwrap_or_else(|| "<unknown>".to_string());

    let name = find_value(obj, NAME_KEYS)
        .and_then(text_of)
        .ok_or_else(|| ScraperError::Normalization {
            record_id: record_id.clone(),
            reason: "missing name".to_string(),
        })?;

    let price = find_value(obj, PRICE_KEYS)
        .and_then(price_of)
        .ok_or_else(|| ScraperError::Normalization {
            record_id: record_id.clone(),
            reason: format!("missing or unparseable price for '{name}'"),
        })?;

    let previous_price = find_value(obj, PREVIOUS_PRICE_KEYS).and_then(price_of);
    let api_product_id = source_product_id
        .as_deref()
        .and_then(|id| id.parse::<i64>().ok());

    let origin = ctx.origin.as_deref();
    let image_url = find_value(obj, IMAGE_KEYS)
        .and_then(text_of)
        .map(|u| absolutize(&u, origin));
    let source_url = find_value(obj, URL_KEYS)
        .and_then(text_of)
        .map(|u| absolutize(&u, origin))
        .or_else(|| {
            let id = source_product_id.as_deref()?;
            Some(format!("{}/product/{id}", origin?))
        });

    let category = find_value(obj, CATEGORY_KEYS)
        .and_then(text_of)
        .or_else(|| ctx.category_name.clone());
    let subcategory = find_value(obj, SUBCATEGORY_KEYS)
        .and_then(text_of)
        .or_else(|| ctx.subcategory_name.clone());

    Ok(ScrapedProduct {
        source_product_id,
        api_product_id,
        name,
        brand: find_value(obj, BRAND_KEYS).and_then(text_of),
        bar_code: find_value(obj, BARCODE_KEYS).and_then(scalar_text),
        image_url,
        category,
        subcategory,
        price,
        previous_price,
        quantity: find_value(obj, QUANTITY_KEYS).and_then(quantity_of),
        source_url,
    })
}

fn is_empty_value(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn first_present<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !is_empty_value(v))
}

fn is_field_key(key: &str) -> bool {
    FIELD_KEY_SETS.iter().any(|set| set.contains(&key))
}

/// Top-level lookup, then one level down into wrapper objects.
fn find_value<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    first_present(obj, keys).or_else(|| {
        obj.iter()
            .filter(|(k, _)| !is_field_key(k))
            .filter_map(|(_, v)| v.as_object())
            .find_map(|inner| first_present(inner, keys))
    })
}

/// Text from a string, a number, or an object's name field.
fn text_of(v: &Value) -> Option<String> {
    match v {
        Value::Object(inner) => first_present(inner, NAME_KEYS).and_then(scalar_text),
        other => scalar_text(other),
    }
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => {
            let t = s.trim();
            (!t.is_empty()).then(|| t.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Price from a scalar or from a `{"amount": ..}`-style object.
fn price_of(v: &Value) -> Option<Decimal> {
    match v {
        Value::Object(inner) => first_present(inner, PRICE_KEYS).and_then(parse_price),
        other => parse_price(other),
    }
}

fn quantity_of(v: &Value) -> Option<i32> {
    let n = match v {
        Value::Number(n) => n.as_i64().or_else(|| {
            #[allow(clippy::cast_possible_truncation)]
            n.as_f64().map(|f| f.trunc() as i64)
        })?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    if n < 0 {
        return None;
    }
    Some(i32::try_from(n).unwrap_or(i32::MAX))
}

fn absolutize(url: &str, origin: Option<&str>) -> String {
    match origin {
        Some(origin) if url.starts_with('/') && !url.starts_with("//") => {
            format!("{origin}{url}")
        }
        _ if url.starts_with("//") => format!("https:{url}"),
        _ => url.to_string(),
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
