use super::*;

fn stored() -> StoredProduct {
    StoredProduct {
        id: 7,
        name: "Sante Milk 1L".to_string(),
        brand: Some("Sante".to_string()),
        api_product_id: Some(501),
        bar_code: None,
        image_url: Some("https://cdn.example/milk.png".to_string()),
        category_id: Some(3),
        subcategory_id: None,
    }
}

fn fields() -> ProductFields {
    ProductFields {
        api_product_id: Some(501),
        name: "Sante Milk 1L".to_string(),
        brand: Some("Sante".to_string()),
        bar_code: None,
        image_url: Some("https://cdn.example/milk.png".to_string()),
        category: Some("Milk & Dairy".to_string()),
        subcategory: None,
    }
}

fn taxonomy(category_id: i64, supplied: bool) -> Taxonomy {
    Taxonomy {
        category_id,
        subcategory_id: None,
        category_supplied: supplied,
    }
}

#[test]
fn identical_fields_plan_no_changes() {
    let changes = plan_changes(&stored(), &fields(), taxonomy(3, true), true);
    assert!(changes.is_empty());
}

#[test]
fn absent_optional_fields_never_clear_stored_values() {
    let mut f = fields();
    f.brand = None;
    f.image_url = None;
    let changes = plan_changes(&stored(), &f, taxonomy(3, true), true);
    assert!(changes.is_empty());
}

#[test]
fn renamed_product_updates_name_when_key_is_free() {
    let mut f = fields();
    f.name = "Sante Milk 3.2% 1L".to_string();
    let changes = plan_changes(&stored(), &f, taxonomy(3, true), true);
    assert_eq!(changes.name.as_deref(), Some("Sante Milk 3.2% 1L"));

    let blocked = plan_changes(&stored(), &f, taxonomy(3, true), false);
    assert!(blocked.name.is_none());
}

#[test]
fn taken_key_blocks_brand_and_barcode_but_not_other_fields() {
    let mut f = fields();
    f.brand = Some("Coca".to_string());
    f.bar_code = Some("4860001".to_string());
    f.image_url = Some("https://cdn.example/new.png".to_string());

    let free = plan_changes(&stored(), &f, taxonomy(3, true), true);
    assert_eq!(free.brand.as_deref(), Some("Coca"));
    assert_eq!(free.bar_code.as_deref(), Some("4860001"));

    let blocked = plan_changes(&stored(), &f, taxonomy(3, true), false);
    assert!(blocked.brand.is_none());
    assert!(blocked.bar_code.is_none());
    assert_eq!(
        blocked.image_url.as_deref(),
        Some("https://cdn.example/new.png")
    );
}

#[test]
fn stored_api_id_is_kept_but_missing_one_is_filled() {
    let mut f = fields();
    f.api_product_id = Some(999);
    assert!(plan_changes(&stored(), &f, taxonomy(3, true), true)
        .api_product_id
        .is_none());

    let mut s = stored();
    s.api_product_id = None;
    assert_eq!(
        plan_changes(&s, &f, taxonomy(3, true), true).api_product_id,
        Some(999)
    );
}

#[test]
fn guessed_category_only_fills_empty_slot() {
    let guessed = taxonomy(9, false);
    assert!(plan_changes(&stored(), &fields(), guessed, true)
        .category_id
        .is_none());

    let mut s = stored();
    s.category_id = None;
    assert_eq!(
        plan_changes(&s, &fields(), guessed, true).category_id,
        Some(9)
    );

    assert_eq!(
        plan_changes(&stored(), &fields(), taxonomy(9, true), true).category_id,
        Some(9)
    );
}

#[test]
fn normalized_collapses_whitespace_and_drops_blanks() {
    let raw = ProductFields {
        name: "  Dish   Soap ".to_string(),
        brand: Some("   ".to_string()),
        bar_code: Some(" 4860001 ".to_string()),
        image_url: Some(String::new()),
        ..ProductFields::default()
    };
    let n = raw.normalized().expect("non-blank name");
    assert_eq!(n.name, "Dish Soap");
    assert!(n.brand.is_none());
    assert_eq!(n.bar_code.as_deref(), Some("4860001"));
    assert!(n.image_url.is_none());

    let blank = ProductFields {
        name: " \t ".to_string(),
        ..ProductFields::default()
    };
    assert!(blank.normalized().is_none());
}

#[test]
fn category_name_falls_back_to_keywords() {
    let f = ProductFields {
        name: "Dish Soap".to_string(),
        ..ProductFields::default()
    };
    assert_eq!(f.category_name(), "Household & Hygiene");
    assert_eq!(fields().category_name(), "Milk & Dairy");
}
