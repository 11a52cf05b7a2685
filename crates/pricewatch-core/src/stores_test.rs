use std::path::Path;

use super::*;

fn store(name: &str, base_url: &str) -> StoreConfig {
    StoreConfig {
        name: name.to_string(),
        source: SourceKind::JsonCatalog,
        base_url: base_url.to_string(),
        enabled: true,
    }
}

#[test]
fn slug_simple_name() {
    assert_eq!(store("Spar Georgia", "https://spar.ge").slug(), "spar-georgia");
}

#[test]
fn slug_strips_punctuation_and_non_ascii() {
    assert_eq!(store("Nikora's Market", "https://x.ge").slug(), "nikoras-market");
    assert_eq!(store("Ori  Nabiji", "https://x.ge").slug(), "ori-nabiji");
    assert_eq!(store("Éuroproduct", "https://x.ge").slug(), "uroproduct");
}

#[test]
fn trimmed_base_url_drops_trailing_slash() {
    assert_eq!(
        store("Spar", "https://spar.ge/").trimmed_base_url(),
        "https://spar.ge"
    );
}

#[test]
fn validate_rejects_empty_name() {
    let file = StoresFile {
        stores: vec![store("  ", "https://spar.ge")],
    };
    let err = validate_stores(&file).unwrap_err();
    assert!(err.to_string().contains("non-empty"));
}

#[test]
fn validate_rejects_non_http_base_url() {
    for bad in [
        "ftp://spar.ge",
        "spar.ge",
        "https://",
        "https:// spaced",
        "https://spar.ge/shop",
        "https://spar.ge/?lang=ka",
    ] {
        let file = StoresFile {
            stores: vec![store("Spar", bad)],
        };
        let err = validate_stores(&file).unwrap_err();
        assert!(err.to_string().contains("invalid base_url"), "{bad}");
    }
}

#[test]
fn origin_urls_allow_port_and_trailing_slash() {
    assert!(is_origin_url("https://spar.ge"));
    assert!(is_origin_url("https://spar.ge/"));
    assert!(is_origin_url("http://127.0.0.1:8080"));
    assert!(!is_origin_url("https://spar.ge/api"));
}

#[test]
fn validate_rejects_duplicate_name() {
    let file = StoresFile {
        stores: vec![store("Spar", "https://a.ge"), store("spar", "https://b.ge")],
    };
    let err = validate_stores(&file).unwrap_err();
    assert!(err.to_string().contains("duplicate store name"));
}

#[test]
fn validate_rejects_duplicate_slug() {
    let file = StoresFile {
        stores: vec![
            store("Ori Nabiji", "https://a.ge"),
            store("Ori--Nabiji", "https://b.ge"),
        ],
    };
    let err = validate_stores(&file).unwrap_err();
    assert!(err.to_string().contains("duplicate store slug"));
}

#[test]
fn enabled_skips_disabled_stores() {
    let mut disabled = store("Europroduct", "https://europroduct.ge");
    disabled.enabled = false;
    let file = StoresFile {
        stores: vec![store("Spar", "https://spar.ge"), disabled],
    };
    let names: Vec<_> = file.enabled().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Spar"]);
    assert!(file.find_by_slug("europroduct").is_some());
}

#[test]
fn source_kind_parses_from_yaml() {
    let yaml = "stores:\n  - name: Europroduct\n    source: graphql\n    base_url: https://europroduct.ge\n";
    let file: StoresFile = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(file.stores[0].source, SourceKind::Graphql);
    assert!(file.stores[0].enabled);
}

#[test]
fn source_kind_round_trips_through_str() {
    for kind in [SourceKind::JsonCatalog, SourceKind::Graphql] {
        assert_eq!(kind.as_str().parse::<SourceKind>().unwrap(), kind);
    }
    assert!("html".parse::<SourceKind>().is_err());
}

#[test]
fn load_stores_from_real_file() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("config")
        .join("stores.yaml");
    assert!(path.exists(), "stores.yaml missing at {path:?}");
    let result = load_stores(&path);
    assert!(result.is_ok(), "failed to load stores.yaml: {result:?}");
    assert!(!result.unwrap().stores.is_empty());
}
