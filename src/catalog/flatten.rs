use tracing::{debug, warn};

use crate::{
    matcher::normalize::normalize,
    model::{FlatPromoProduct, PromoProduct, SupermarketEntry},
};

const UNKNOWN_STORE: &str = "unknown";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlattenStats {
    pub stores: usize,
    pub products: usize,
    pub skipped: usize,
}

/// Percentage off the old price, rounded to a whole number. Zero when there is no old price.
pub fn discount_percent(price: f64, old_price: f64) -> i32 {
    if old_price > 0.0 {
        ((old_price - price) / old_price * 100.0).round() as i32
    } else {
        0
    }
}

/// Turn the upstream store list into one flat product list, preserving feed order.
///
/// Store blocks and products that fail to decode, have no usable name or no price are
/// skipped and counted; they never fail the whole batch.
pub fn flatten_entries(entries: Vec<serde_json::Value>) -> (Vec<FlatPromoProduct>, FlattenStats) {
    let mut stats = FlattenStats::default();
    let mut flat = Vec::new();

    for raw_entry in entries {
        let entry: SupermarketEntry = match serde_json::from_value(raw_entry) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping malformed supermarket entry");
                stats.skipped += 1;
                continue;
            }
        };
        stats.stores += 1;

        let store = entry
            .supermarket
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNKNOWN_STORE.to_string());
        debug!(
            store = %store,
            updated_at = entry.updated_at.as_deref().unwrap_or(""),
            products = entry.products.len(),
            "flattening store"
        );

        for raw_product in entry.products {
            match flatten_product(raw_product, &store) {
                Some(product) => {
                    flat.push(product);
                    stats.products += 1;
                }
                None => stats.skipped += 1,
            }
        }
    }

    (flat, stats)
}

fn flatten_product(raw: serde_json::Value, store: &str) -> Option<FlatPromoProduct> {
    let product: PromoProduct = match serde_json::from_value(raw) {
        Ok(product) => product,
        Err(err) => {
            warn!(store, error = %err, "skipping undecodable product");
            return None;
        }
    };

    let Some(name) = product
        .name
        .map(|name| name.trim().to_string())
        .filter(|name| !normalize(name).is_empty())
    else {
        warn!(store, "skipping product without a usable name");
        return None;
    };

    let Some(price) = product.price else {
        warn!(store, name = %name, "skipping product without a price");
        return None;
    };

    let old_price = product.old_price.unwrap_or(0.0);

    Some(FlatPromoProduct {
        discount: discount_percent(price, old_price),
        name,
        quantity: product.quantity.unwrap_or_default(),
        price,
        old_price,
        category: product.category.unwrap_or_default(),
        pic_url: product.pic_url.unwrap_or_default(),
        valid_from: product.valid_from.unwrap_or_default(),
        valid_until: product.valid_until.unwrap_or_default(),
        store: store.to_string(),
    })
}
