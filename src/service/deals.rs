use chrono::{DateTime, Duration, Utc};

use crate::{
    catalog::{CatalogCache, CatalogSnapshot},
    config::MatcherConfig,
    error::{AppError, AppResult},
    matcher::{self, normalize::normalize, DealMatch},
    model::{
        Confidence, DealOutcome, DealResult, DealsPayload, DealsResponse, ListItemIn,
        SearchDealResult, SearchPayload, SearchResponse,
    },
};

/// Match every list item against the current catalog, one item at a time, in request order.
pub async fn list_deals(
    cache: &CatalogCache,
    config: &MatcherConfig,
    payload: DealsPayload,
) -> AppResult<DealsResponse> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("No items provided.".into()));
    }

    let snapshot = cache.get().await?;
    let results = match_items(&snapshot, payload.items, config, Utc::now());

    let matched = results
        .iter()
        .filter(|r| matches!(r.outcome, DealOutcome::Deal { .. }))
        .count();
    tracing::info!(
        items = results.len(),
        matched,
        catalog = snapshot.products.len(),
        "list matched against deals"
    );

    Ok(DealsResponse { results })
}

/// Every deal matching a free-text query, best first.
pub async fn search_deals(
    cache: &CatalogCache,
    config: &MatcherConfig,
    payload: SearchPayload,
) -> AppResult<SearchResponse> {
    let query = payload.query.trim();
    if query.is_empty() {
        return Err(AppError::BadRequest("No search query provided.".into()));
    }

    let snapshot = cache.get().await?;
    let response = search(&snapshot, query, config);

    tracing::info!(query, deals = response.deals.len(), "deal search");
    Ok(response)
}

fn match_items(
    snapshot: &CatalogSnapshot,
    items: Vec<ListItemIn>,
    config: &MatcherConfig,
    now: DateTime<Utc>,
) -> Vec<DealResult> {
    let max_age = i64::try_from(config.estimate_max_age_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or_else(|| Duration::days(36_500));

    items
        .into_iter()
        .map(|item| {
            let found = if normalize(&item.name).is_empty() {
                None
            } else {
                matcher::find_best_deal(&item.name, &snapshot.products, config.threshold)
            };

            let outcome = match found {
                Some(found) => deal_outcome(&found),
                None => saved_estimate(&item, now, max_age).unwrap_or(DealOutcome::NoDeal),
            };

            DealResult {
                item_id: item.id,
                item_name: item.name,
                outcome,
            }
        })
        .collect()
}

fn search(snapshot: &CatalogSnapshot, query: &str, config: &MatcherConfig) -> SearchResponse {
    if normalize(query).is_empty() {
        return SearchResponse {
            deals: Vec::new(),
            query: query.to_string(),
        };
    }

    let deals = matcher::find_all_deals(
        query,
        &snapshot.products,
        config.threshold,
        config.max_results,
    )
    .into_iter()
    .map(|found| SearchDealResult {
        store: found.product.store.clone(),
        promo_name: found.product.name.clone(),
        price: found.product.price,
        old_price: found.product.old_price,
        discount: found.product.discount,
        valid_until: found.product.valid_until.clone(),
        pic_url: found.product.pic_url.clone(),
        score: round_score(found.score),
    })
    .collect();

    SearchResponse {
        deals,
        query: query.to_string(),
    }
}

fn deal_outcome(found: &DealMatch<'_>) -> DealOutcome {
    let product = found.product;
    tracing::debug!(
        item = %found.item_name,
        product = %product.name,
        store = %product.store,
        score = found.score,
        "best deal"
    );
    DealOutcome::Deal {
        store: product.store.clone(),
        promo_name: product.name.clone(),
        price: product.price,
        old_price: product.old_price,
        discount: product.discount,
        valid_until: product.valid_until.clone(),
        pic_url: product.pic_url.clone(),
        score: round_score(found.score),
    }
}

/// A previously saved price estimate, if the caller sent one that is still fresh.
fn saved_estimate(item: &ListItemIn, now: DateTime<Utc>, max_age: Duration) -> Option<DealOutcome> {
    let min = item.estimated_price_min?;
    let raw_at = item.price_estimated_at.as_deref()?;
    let estimated_at = DateTime::parse_from_rfc3339(raw_at.trim())
        .ok()?
        .with_timezone(&Utc);

    if now.signed_duration_since(estimated_at) >= max_age {
        return None;
    }

    Some(DealOutcome::Estimated {
        estimated_price_min: min,
        estimated_price_max: item.estimated_price_max.unwrap_or(min),
        estimated_store: item.estimated_store.clone(),
        confidence: Confidence::parse_lenient(item.price_confidence.as_deref()),
        price_estimated_at: raw_at.to_string(),
    })
}

fn round_score(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}
