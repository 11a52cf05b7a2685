//! Next-page detection for the JSON catalog `/api/products` endpoint.
//!
//! Upstreams disagree on where the flag lives. Observed shapes:
//!
//! ```text
//! { "products": [...], "hasNextPage": true }
//! { "products": [...], "hasNext": true }
//! { "products": [...], "pagination": { "hasNext": true } }
//! ```
//!
//! Any of them being `true` means another page exists. No flag at all is
//! treated as the last page.

use serde_json::Value;

/// Returns `true` when the page body advertises a following page.
#[must_use]
pub fn has_next_page(body: &Value) -> bool {
    let flag = |v: Option<&Value>| v.is_some_and(is_truthy);
    flag(body.get("hasNextPage"))
        || flag(body.get("pagination").and_then(|p| p.get("hasNext")))
        || flag(body.get("hasNext"))
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn reads_each_flag_location() {
        assert!(has_next_page(&json!({"hasNextPage": true})));
        assert!(has_next_page(&json!({"hasNext": true})));
        assert!(has_next_page(&json!({"pagination": {"hasNext": true}})));
    }

    #[test]
    fn any_true_flag_wins() {
        assert!(has_next_page(
            &json!({"hasNextPage": false, "pagination": {"hasNext": true}})
        ));
    }

    #[test]
    fn missing_or_false_flags_mean_last_page() {
        assert!(!has_next_page(&json!({"products": []})));
        assert!(!has_next_page(&json!({"hasNextPage": false, "hasNext": false})));
        assert!(!has_next_page(&json!({"pagination": {}})));
        assert!(!has_next_page(&json!({"hasNextPage": null})));
    }

    #[test]
    fn tolerates_stringly_and_numeric_flags() {
        assert!(has_next_page(&json!({"hasNextPage": "true"})));
        assert!(has_next_page(&json!({"hasNext": 1})));
        assert!(!has_next_page(&json!({"hasNext": 0})));
    }
}
