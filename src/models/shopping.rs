use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Shopping / receipt item category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Produce,
    Dairy,
    #[serde(rename = "Meat & Seafood")]
    MeatSeafood,
    Bakery,
    Pantry,
    Beverages,
    Snacks,
    Frozen,
    Household,
    #[serde(rename = "Personal Care")]
    PersonalCare,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Produce => "Produce",
            Category::Dairy => "Dairy",
            Category::MeatSeafood => "Meat & Seafood",
            Category::Bakery => "Bakery",
            Category::Pantry => "Pantry",
            Category::Beverages => "Beverages",
            Category::Snacks => "Snacks",
            Category::Frozen => "Frozen",
            Category::Household => "Household",
            Category::PersonalCare => "Personal Care",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub category: Category,
    #[serde(default)]
    pub completed: bool,
}

/// How an item name was resolved against a store's price list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceMatch {
    Exact,
    WholeWord,
    Substring,
    /// No product matched, the price is a placeholder
    Estimated,
}

/// Item-level pricing at one store
#[derive(Debug, Clone, Serialize)]
pub struct ItemPrice {
    pub item_id: Uuid,
    pub name: String,
    pub matched_product: Option<String>,
    pub match_kind: PriceMatch,
    pub quantity: u32,
    pub unit_price: BigDecimal,
    pub discount_percent: u32,
    pub final_unit_price: BigDecimal,
    pub line_total: BigDecimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreRecommendation {
    pub store: String,
    pub total_price: BigDecimal,
    pub savings: BigDecimal,
    pub items: Vec<ItemPrice>,
}
