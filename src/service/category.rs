//! Keyword based category guessing for shopping list and receipt items.

use crate::models::Category;

/// Checked in order, the first category with a matching keyword wins.
/// Non-food categories come first: their keywords contain short food words
/// ("shampoo" holds "ham", "toilet" and "foil" hold "oil", "ice cream" holds "cream").
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Frozen,
        &["frozen", "ice cream", "pizza", "waffle"],
    ),
    (
        Category::Household,
        &[
            "paper towel", "toilet paper", "detergent", "soap", "trash bag", "cleaner", "sponge",
            "foil",
        ],
    ),
    (
        Category::PersonalCare,
        &["shampoo", "toothpaste", "deodorant", "lotion", "razor", "conditioner"],
    ),
    (
        Category::Produce,
        &[
            "apple", "banana", "orange", "lettuce", "tomato", "potato", "onion", "carrot",
            "spinach", "avocado", "lemon", "lime", "grape", "berry", "pepper", "cucumber",
            "broccoli", "garlic", "fruit", "vegetable",
        ],
    ),
    (
        Category::Dairy,
        &["milk", "cheese", "yogurt", "butter", "cream", "egg"],
    ),
    (
        Category::MeatSeafood,
        &[
            "chicken", "beef", "pork", "turkey", "bacon", "sausage", "ham", "fish", "salmon",
            "tuna", "shrimp", "steak",
        ],
    ),
    (
        Category::Bakery,
        &["bread", "bagel", "muffin", "croissant", "bun", "roll", "cake", "tortilla"],
    ),
    (
        Category::Pantry,
        &[
            "rice", "pasta", "flour", "sugar", "salt", "oil", "sauce", "cereal", "bean", "soup",
            "spice",
        ],
    ),
    (
        Category::Beverages,
        &["juice", "soda", "water", "coffee", "tea", "beer", "wine", "drink"],
    ),
    (
        Category::Snacks,
        &["chip", "cookie", "cracker", "candy", "chocolate", "popcorn", "nut", "pretzel"],
    ),
];

/// Guess the category of an item name by keyword containment
pub fn guess_category(item_name: &str) -> Category {
    let name = item_name.trim().to_lowercase();
    if name.is_empty() {
        return Category::Other;
    }

    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| name.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_milk_is_dairy() {
        assert_eq!(guess_category("whole milk"), Category::Dairy);
    }

    #[test]
    fn unknown_item_is_other() {
        assert_eq!(guess_category("xyz-unknown-item"), Category::Other);
        assert_eq!(guess_category("   "), Category::Other);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(guess_category("Chicken Breast"), Category::MeatSeafood);
        assert_eq!(guess_category("ORANGE JUICE"), Category::Produce);
    }

    #[test]
    fn first_category_in_order_wins() {
        // "chocolate milk" hits Dairy before Snacks
        assert_eq!(guess_category("chocolate milk"), Category::Dairy);
        assert_eq!(guess_category("frozen pizza"), Category::Frozen);
    }

    #[test]
    fn non_food_keywords_are_not_swallowed_by_food_words() {
        assert_eq!(guess_category("shampoo"), Category::PersonalCare);
        assert_eq!(guess_category("toilet paper"), Category::Household);
        assert_eq!(guess_category("aluminum foil"), Category::Household);
        assert_eq!(guess_category("vanilla ice cream"), Category::Frozen);
    }

    #[test]
    fn every_keyword_resolves_to_its_own_category() {
        for (category, keywords) in CATEGORY_KEYWORDS {
            for keyword in keywords.iter() {
                assert_eq!(guess_category(keyword), *category, "keyword {keyword:?}");
            }
        }
    }
}
