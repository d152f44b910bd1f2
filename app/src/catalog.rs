//! Static product catalog mapping product ids to credit grants.

use crate::credits::Credits;
use std::collections::HashMap;

/// The catalog is loaded once at process start and is the source of truth
/// for how many credits each purchasable product grants. Unknown product
/// ids are rejected inputs, never zero-credit grants.
#[derive(Debug, Clone)]
pub struct ProductCatalog {
    products: HashMap<String, Credits>,
}

impl ProductCatalog {
    /// Builds a catalog from configuration. Entries with non-positive
    /// amounts are dropped, since a product can only ever grant credits.
    pub fn new(products: HashMap<String, i64>) -> Self {
        Self {
            products: products
                .into_iter()
                .filter(|(_, credits)| *credits > 0)
                .map(|(product_id, credits)| (product_id, Credits(credits)))
                .collect(),
        }
    }

    pub fn credits_for(&self, product_id: &str) -> Option<Credits> {
        self.products.get(product_id).copied()
    }
}

impl Default for ProductCatalog {
    fn default() -> Self {
        Self::new(HashMap::from([
            ("com.suited.subscription.weekly".to_owned(), 700),
            ("com.suited.subscription.monthly".to_owned(), 500),
            ("com.suited.subscription.yearly".to_owned(), 3000),
            // Sandbox product used by store review builds
            ("suited_premium_30y_3000c".to_owned(), 3000),
        ]))
    }
}
