/// Category assigned when no keyword matches.
pub const OTHER_CATEGORY: &str = "Other";

/// Keyword table checked in order; the first category with a keyword
/// contained in the lower-cased product name wins.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("Milk & Dairy", &["milk", "cheese", "yogurt", "butter", "egg"]),
    ("Meat & Fish", &["meat", "fish", "chicken", "beef", "sausage"]),
    ("Drinks", &["juice", "cola", "soda", "water", "tea", "coffee"]),
    ("Snacks", &["chips", "snack", "chocolate", "cookie", "biscuit"]),
    ("Bakery", &["bread", "bakery", "pastry", "cake"]),
    ("Frozen", &["frozen", "ice"]),
    ("Sweets", &["sweet", "candy"]),
    ("Coffee & Tea", &["cocoa"]),
    (
        "Household & Hygiene",
        &["soap", "detergent", "cleaner", "hygiene", "tissue"],
    ),
    ("Animal Care", &["pet", "animal", "dog", "cat", "food"]),
];

/// Guess a category from a product name for records that arrive without one.
#[must_use]
pub fn categorize_product(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map_or(OTHER_CATEGORY, |(category, _)| category)
}

/// Every category name `categorize_product` can return, `Other` last.
pub fn known_categories() -> impl Iterator<Item = &'static str> {
    CATEGORY_KEYWORDS
        .iter()
        .map(|(category, _)| *category)
        .chain(std::iter::once(OTHER_CATEGORY))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_by_keyword() {
        assert_eq!(categorize_product("Sante Milk 3.2% 1L"), "Milk & Dairy");
        assert_eq!(categorize_product("Chicken Breast"), "Meat & Fish");
        assert_eq!(categorize_product("Sourdough BREAD"), "Bakery");
        assert_eq!(categorize_product("Dish Soap Lemon"), "Household & Hygiene");
        assert_eq!(categorize_product("Dry Dog Kibble"), "Animal Care");
    }

    #[test]
    fn first_matching_category_wins() {
        // "chocolate milk" hits Milk & Dairy before Snacks.
        assert_eq!(categorize_product("Chocolate Milk"), "Milk & Dairy");
        // "iced tea" hits Drinks before Frozen.
        assert_eq!(categorize_product("Iced Tea Peach"), "Drinks");
    }

    #[test]
    fn unknown_names_fall_back_to_other() {
        assert_eq!(categorize_product("Batteries AA"), OTHER_CATEGORY);
        assert_eq!(categorize_product(""), OTHER_CATEGORY);
    }

    #[test]
    fn known_categories_end_with_other() {
        let all: Vec<_> = known_categories().collect();
        assert_eq!(all.len(), 11);
        assert_eq!(all.first(), Some(&"Milk & Dairy"));
        assert_eq!(all.last(), Some(&OTHER_CATEGORY));
    }
}
