use axum::{extract::State, Json};
use serde::Serialize;

use crate::app::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    ok: bool,
    catalog_loaded: bool,
    catalog_products: usize,
    catalog_fetched_at: Option<String>,
}

/// Liveness plus a view of the cached catalog. Never fetches from upstream.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.catalog.peek().await;
    Json(HealthResponse {
        ok: true,
        catalog_loaded: snapshot.is_some(),
        catalog_products: snapshot.as_ref().map_or(0, |s| s.products.len()),
        catalog_fetched_at: snapshot.map(|s| s.fetched_at.to_rfc3339()),
    })
}
