use std::str::FromStr;

use serde_json::json;

use super::*;

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn ctx() -> SegmentContext {
    SegmentContext {
        category_name: Some("Dairy".to_string()),
        subcategory_name: Some("Milk".to_string()),
        origin: Some("https://spar.example".to_string()),
    }
}

// -----------------------------------------------------------------------
// JSON catalog shape
// -----------------------------------------------------------------------

#[test]
fn normalizes_json_catalog_record() {
    let raw = json!({
        "id": 1042,
        "name": "  Sante Milk 3.2% 1L ",
        "price": 2.95,
        "previousPrice": "3.45",
        "imageUrl": "/media/milk.jpg",
        "barCode": "4860019000123",
        "quantity": 14
    });
    let p = normalize_record(&raw, &ctx()).unwrap();
    assert_eq!(p.source_product_id.as_deref(), Some("1042"));
    assert_eq!(p.api_product_id, Some(1042));
    assert_eq!(p.name, "Sante Milk 3.2% 1L");
    assert_eq!(p.price, d("2.95"));
    assert_eq!(p.previous_price, Some(d("3.45")));
    assert!(p.is_on_sale());
    assert_eq!(p.image_url.as_deref(), Some("https://spar.example/media/milk.jpg"));
    assert_eq!(p.bar_code.as_deref(), Some("4860019000123"));
    assert_eq!(p.quantity, Some(14));
    assert_eq!(p.category.as_deref(), Some("Dairy"));
    assert_eq!(p.subcategory.as_deref(), Some("Milk"));
    assert_eq!(
        p.source_url.as_deref(),
        Some("https://spar.example/product/1042")
    );
}

#[test]
fn record_category_overrides_segment_context() {
    let raw = json!({
        "title": "Rye Bread",
        "currentPrice": "₾ 1,80",
        "category": {"id": 3, "name": "Bakery"},
        "subCategory": "Bread"
    });
    let p = normalize_record(&raw, &ctx()).unwrap();
    assert_eq!(p.name, "Rye Bread");
    assert_eq!(p.price, d("1.80"));
    assert_eq!(p.category.as_deref(), Some("Bakery"));
    assert_eq!(p.subcategory.as_deref(), Some("Bread"));
    assert_eq!(p.api_product_id, None);
    assert_eq!(p.source_url, None);
}

// -----------------------------------------------------------------------
// Synonyms and nesting
// -----------------------------------------------------------------------

#[test]
fn resolves_fields_inside_wrapper_objects() {
    let raw = json!({
        "product": {"productName": "Espresso Beans 250g", "brand": {"name": "Lavazza"}},
        "pricing": {"finalPrice": 18.5, "oldPrice": 21},
        "externalId": "EP-77"
    });
    let p = normalize_record(&raw, &SegmentContext::default()).unwrap();
    assert_eq!(p.name, "Espresso Beans 250g");
    assert_eq!(p.brand.as_deref(), Some("Lavazza"));
    assert_eq!(p.price, d("18.5"));
    assert_eq!(p.previous_price, Some(d("21")));
    assert_eq!(p.source_product_id.as_deref(), Some("EP-77"));
    assert_eq!(p.api_product_id, None);
}

#[test]
fn price_object_with_amount() {
    let raw = json!({"name": "Water 1.5L", "price": {"amount": "0.90", "currency": "GEL"}});
    let p = normalize_record(&raw, &SegmentContext::default()).unwrap();
    assert_eq!(p.price, d("0.90"));
}

#[test]
fn skips_empty_synonyms_in_favour_of_later_ones() {
    let raw = json!({"name": "", "title": "Cola 0.5L", "price": null, "unitPrice": 1.2});
    let p = normalize_record(&raw, &SegmentContext::default()).unwrap();
    assert_eq!(p.name, "Cola 0.5L");
    assert_eq!(p.price, d("1.2"));
}

#[test]
fn category_key_objects_are_not_searched_as_wrappers() {
    let raw = json!({"category": {"name": "Dairy"}, "price": 1});
    let err = normalize_record(&raw, &SegmentContext::default()).unwrap_err();
    assert!(matches!(err, ScraperError::Normalization { ref reason, .. } if reason == "missing name"));
}

// -----------------------------------------------------------------------
// Failure cases
// -----------------------------------------------------------------------

#[test]
fn missing_price_is_a_normalization_error() {
    let raw = json!({"id": 5, "name": "Mystery", "price": "call us"});
    let err = normalize_record(&raw, &ctx()).unwrap_err();
    match err {
        ScraperError::Normalization { record_id, reason } => {
            assert_eq!(record_id, "5");
            assert!(reason.contains("price"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn non_object_record_is_rejected() {
    let err = normalize_record(&json!(["not", "a", "record"]), &ctx()).unwrap_err();
    assert!(matches!(err, ScraperError::Normalization { .. }));
}

#[test]
fn negative_quantity_is_dropped_and_strings_parse() {
    let raw = json!({"name": "Eggs x10", "price": 4, "stock": -3});
    assert_eq!(normalize_record(&raw, &ctx()).unwrap().quantity, None);
    let raw = json!({"name": "Eggs x10", "price": 4, "qty": " 12 "});
    assert_eq!(normalize_record(&raw, &ctx()).unwrap().quantity, Some(12));
}

#[test]
fn absolutize_handles_protocol_relative_and_absolute_urls() {
    assert_eq!(
        absolutize("//cdn.example/a.jpg", Some("https://spar.example")),
        "https://cdn.example/a.jpg"
    );
    assert_eq!(
        absolutize("https://cdn.example/a.jpg", Some("https://spar.example")),
        "https://cdn.example/a.jpg"
    );
    assert_eq!(absolutize("/a.jpg", None), "/a.jpg");
}
