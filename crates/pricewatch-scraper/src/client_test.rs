use super::*;

#[test]
fn api_url_uses_store_origin() {
    let url = CatalogClient::api_url("https://spar.example/ka/shop/", &["api", "categories"]).unwrap();
    assert_eq!(url, "https://spar.example/api/categories");
}

#[test]
fn api_url_escapes_path_segments() {
    let url = CatalogClient::api_url(
        "https://spar.example",
        &["api", "categories", "a/b c", "subcategories"],
    )
    .unwrap();
    assert_eq!(
        url,
        "https://spar.example/api/categories/a%2Fb%20c/subcategories"
    );
}

#[test]
fn products_url_with_subcategory() {
    let url =
        CatalogClient::products_url("https://spar.example", "12", Some("34"), 2, 50).unwrap();
    assert_eq!(
        url,
        "https://spar.example/api/products?category=12&subcategory=34&page=2&pageSize=50"
    );
}

#[test]
fn products_url_without_subcategory() {
    let url = CatalogClient::products_url("http://127.0.0.1:8080/", "7", None, 1, 25).unwrap();
    assert_eq!(
        url,
        "http://127.0.0.1:8080/api/products?category=7&page=1&pageSize=25"
    );
}

#[test]
fn products_url_rejects_invalid_base() {
    let err = CatalogClient::products_url("not-a-url", "1", None, 1, 50).unwrap_err();
    assert!(matches!(err, ScraperError::InvalidBaseUrl { .. }));
}

#[test]
fn extract_domain_falls_back_to_input() {
    assert_eq!(extract_domain("https://spar.example/api"), "spar.example");
    assert_eq!(extract_domain("::nope::"), "::nope::");
}
