//! Mock store-price comparison for the shopping list.
//!
//! Prices come from a fixed demo catalog, not a real pricing feed. Items that
//! match no catalog product get a random placeholder price.

use bigdecimal::{BigDecimal, Zero};
use once_cell::sync::Lazy;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use regex::Regex;
use std::collections::HashMap;
use std::str::FromStr;

use crate::models::{ItemPrice, PriceMatch, ShoppingItem, StoreRecommendation};

/// Placeholder price range for unmatched items, in cents
const RANDOM_PRICE_CENTS: std::ops::RangeInclusive<i64> = 199..=999;

static MOCK_CATALOG: Lazy<StoreCatalog> = Lazy::new(StoreCatalog::mock);

#[derive(Debug, Clone)]
pub struct StoreListing {
    pub name: String,
    prices: HashMap<String, BigDecimal>,
    /// product -> percent off
    discounts: HashMap<String, u32>,
}

impl StoreListing {
    pub fn new(name: &str, prices: &[(&str, &str)], discounts: &[(&str, u32)]) -> Self {
        Self {
            name: name.to_string(),
            prices: prices
                .iter()
                .filter_map(|(p, price)| Some((p.to_string(), BigDecimal::from_str(price).ok()?)))
                .collect(),
            discounts: discounts
                .iter()
                .map(|(p, pct)| (p.to_string(), (*pct).min(100)))
                .collect(),
        }
    }

    pub fn discount_for(&self, product: &str) -> u32 {
        self.discounts.get(product).copied().unwrap_or(0)
    }
}

/// Stores plus the canonical product list, longest names first
pub struct StoreCatalog {
    stores: Vec<StoreListing>,
    products: Vec<(String, Regex)>,
}

impl StoreCatalog {
    pub fn new(stores: Vec<StoreListing>) -> Self {
        let mut names: Vec<String> = stores
            .iter()
            .flat_map(|s| s.prices.keys().cloned())
            .collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        names.dedup();

        let products = names
            .into_iter()
            .filter_map(|name| {
                let pattern = format!(r"\b{}\b", regex::escape(&name));
                Regex::new(&pattern).ok().map(|re| (name, re))
            })
            .collect();

        Self { stores, products }
    }

    /// Demo catalog
    pub fn mock() -> Self {
        Self::new(vec![
            StoreListing::new(
                "Walmart",
                &[
                    ("milk", "3.48"),
                    ("whole milk", "3.68"),
                    ("eggs", "2.97"),
                    ("bread", "2.28"),
                    ("whole wheat bread", "2.78"),
                    ("butter", "4.12"),
                    ("cheese", "3.94"),
                    ("chicken breast", "7.84"),
                    ("ground beef", "5.47"),
                    ("bananas", "1.24"),
                    ("apples", "4.97"),
                    ("rice", "2.64"),
                    ("pasta", "1.32"),
                    ("orange juice", "3.78"),
                    ("coffee", "8.97"),
                    ("cereal", "3.74"),
                    ("yogurt", "0.98"),
                    ("tomatoes", "2.12"),
                    ("potatoes", "3.47"),
                    ("onions", "1.87"),
                ],
                &[("bananas", 10), ("cereal", 15)],
            ),
            StoreListing::new(
                "Target",
                &[
                    ("milk", "3.79"),
                    ("whole milk", "3.99"),
                    ("eggs", "3.19"),
                    ("bread", "2.49"),
                    ("whole wheat bread", "2.99"),
                    ("butter", "4.29"),
                    ("cheese", "4.19"),
                    ("chicken breast", "8.49"),
                    ("ground beef", "5.99"),
                    ("bananas", "1.39"),
                    ("apples", "5.29"),
                    ("rice", "2.89"),
                    ("pasta", "1.49"),
                    ("orange juice", "3.99"),
                    ("coffee", "9.49"),
                    ("cereal", "3.99"),
                    ("yogurt", "1.09"),
                    ("tomatoes", "2.39"),
                    ("potatoes", "3.79"),
                    ("onions", "1.99"),
                ],
                &[("milk", 20), ("coffee", 25), ("yogurt", 10)],
            ),
            StoreListing::new(
                "Kroger",
                &[
                    ("milk", "3.29"),
                    ("whole milk", "3.49"),
                    ("eggs", "2.79"),
                    ("bread", "2.19"),
                    ("whole wheat bread", "2.69"),
                    ("butter", "3.99"),
                    ("cheese", "3.79"),
                    ("chicken breast", "7.49"),
                    ("ground beef", "5.29"),
                    ("bananas", "1.19"),
                    ("apples", "4.79"),
                    ("rice", "2.49"),
                    ("pasta", "1.19"),
                    ("orange juice", "3.59"),
                    ("coffee", "8.79"),
                    ("cereal", "3.49"),
                    ("yogurt", "0.89"),
                    ("tomatoes", "1.99"),
                    ("potatoes", "3.29"),
                    ("onions", "1.69"),
                ],
                &[("chicken breast", 30), ("eggs", 15)],
            ),
            StoreListing::new(
                "Whole Foods",
                &[
                    ("milk", "4.49"),
                    ("whole milk", "4.79"),
                    ("eggs", "4.99"),
                    ("bread", "3.99"),
                    ("whole wheat bread", "4.49"),
                    ("butter", "5.49"),
                    ("cheese", "5.99"),
                    ("chicken breast", "9.99"),
                    ("ground beef", "7.99"),
                    ("bananas", "1.49"),
                    ("apples", "5.99"),
                    ("rice", "3.99"),
                    ("pasta", "2.49"),
                    ("orange juice", "4.99"),
                    ("coffee", "11.99"),
                    ("cereal", "4.99"),
                    ("yogurt", "1.49"),
                    ("tomatoes", "3.49"),
                    ("potatoes", "4.49"),
                    ("onions", "2.29"),
                ],
                &[("milk", 10), ("apples", 20)],
            ),
        ])
    }

    pub fn stores(&self) -> &[StoreListing] {
        &self.stores
    }

    /// Resolve an item name to a product in `store`:
    /// exact name, then whole-word match (longest product first), then substring.
    pub fn resolve(&self, store: &StoreListing, item_name: &str) -> Option<(String, PriceMatch)> {
        let name = item_name.trim().to_lowercase();
        if name.is_empty() {
            return None;
        }

        if store.prices.contains_key(&name) {
            return Some((name, PriceMatch::Exact));
        }

        let whole_word = self
            .products
            .iter()
            .find(|(product, re)| store.prices.contains_key(product) && re.is_match(&name));
        if let Some((product, _)) = whole_word {
            return Some((product.clone(), PriceMatch::WholeWord));
        }

        self.products
            .iter()
            .map(|(product, _)| product)
            .find(|product| {
                store.prices.contains_key(*product)
                    && (name.contains(product.as_str()) || product.contains(name.as_str()))
            })
            .map(|product| (product.clone(), PriceMatch::Substring))
    }

    /// One recommendation per store for the active items, cheapest first.
    /// Each store draws placeholder prices from its own generator seeded from `rng`.
    pub fn recommend<R: Rng + ?Sized>(
        &self,
        items: &[ShoppingItem],
        rng: &mut R,
    ) -> Vec<StoreRecommendation> {
        let active: Vec<&ShoppingItem> = items.iter().filter(|i| !i.completed).collect();
        if active.is_empty() {
            return Vec::new();
        }

        let seeds: Vec<u64> = self.stores.iter().map(|_| rng.gen()).collect();

        let mut recommendations: Vec<StoreRecommendation> = self
            .stores
            .par_iter()
            .zip(seeds.par_iter())
            .map(|(store, seed)| {
                let mut store_rng = StdRng::seed_from_u64(*seed);
                self.price_store(store, &active, &mut store_rng)
            })
            .collect();

        recommendations.sort_by(|a, b| a.total_price.cmp(&b.total_price));
        recommendations
    }

    fn price_store(
        &self,
        store: &StoreListing,
        items: &[&ShoppingItem],
        rng: &mut StdRng,
    ) -> StoreRecommendation {
        let mut total_price = BigDecimal::zero();
        let mut savings = BigDecimal::zero();
        let mut priced = Vec::with_capacity(items.len());

        for item in items {
            let quantity = item.quantity.max(1);
            let qty = BigDecimal::from(quantity);

            let (matched_product, match_kind, unit_price, discount_percent) =
                match self.resolve(store, &item.name) {
                    Some((product, kind)) => {
                        let price = store.prices[&product].clone();
                        let discount = store.discount_for(&product);
                        (Some(product), kind, price, discount)
                    }
                    None => {
                        let cents = rng.gen_range(RANDOM_PRICE_CENTS);
                        (None, PriceMatch::Estimated, BigDecimal::new(cents.into(), 2), 0)
                    }
                };

            let final_unit_price = (&unit_price * BigDecimal::from(100 - discount_percent)
                / BigDecimal::from(100))
            .with_scale(2);
            let line_total = &final_unit_price * &qty;

            savings += (&unit_price - &final_unit_price) * &qty;
            total_price += &line_total;

            priced.push(ItemPrice {
                item_id: item.id,
                name: item.name.clone(),
                matched_product,
                match_kind,
                quantity,
                unit_price,
                discount_percent,
                final_unit_price,
                line_total,
            });
        }

        StoreRecommendation {
            store: store.name.clone(),
            total_price,
            savings,
            items: priced,
        }
    }
}

impl Default for StoreCatalog {
    fn default() -> Self {
        Self::mock()
    }
}

/// Recommendations against the demo catalog
pub fn generate_mock_store_recommendations<R: Rng + ?Sized>(
    items: &[ShoppingItem],
    rng: &mut R,
) -> Vec<StoreRecommendation> {
    MOCK_CATALOG.recommend(items, rng)
}
