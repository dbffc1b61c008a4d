//! Fuzzy matching of free-text shopping-list entries against a promotional catalog snapshot.
//!
//! Everything here is pure and synchronous: callers pass a snapshot obtained from
//! [`crate::catalog::CatalogCache`] and get borrowed matches back.

pub mod normalize;
pub mod similarity;

use crate::model::FlatPromoProduct;

pub use similarity::match_score;

pub const DEFAULT_THRESHOLD: f64 = 0.55;
pub const DEFAULT_MAX_RESULTS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct DealMatch<'a> {
    pub item_name: String,
    pub product: &'a FlatPromoProduct,
    pub score: f64,
}

/// Best-scoring product for `item_name`, or `None` when nothing reaches `threshold`.
///
/// The whole catalog is scanned; among equal top scores the first one in catalog order wins.
pub fn find_best_deal<'a>(
    item_name: &str,
    catalog: &'a [FlatPromoProduct],
    threshold: f64,
) -> Option<DealMatch<'a>> {
    let mut best_score = 0.0;
    let mut best_product = None;

    for product in catalog {
        let score = match_score(item_name, &product.name);
        if score > best_score {
            best_score = score;
            best_product = Some(product);
        }
    }

    let product = best_product.filter(|_| best_score >= threshold)?;
    Some(DealMatch {
        item_name: item_name.to_string(),
        product,
        score: best_score,
    })
}

/// Every product scoring at least `threshold`, best first, capped at `max_results`.
/// Equal scores keep catalog order.
pub fn find_all_deals<'a>(
    item_name: &str,
    catalog: &'a [FlatPromoProduct],
    threshold: f64,
    max_results: usize,
) -> Vec<DealMatch<'a>> {
    let mut matches: Vec<DealMatch<'a>> = catalog
        .iter()
        .filter_map(|product| {
            let score = match_score(item_name, &product.name);
            (score >= threshold).then(|| DealMatch {
                item_name: item_name.to_string(),
                product,
                score,
            })
        })
        .collect();

    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches.truncate(max_results);

    tracing::debug!(item = item_name, count = matches.len(), "deals matched");
    matches
}
