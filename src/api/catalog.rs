use axum::{extract::State, Json};

use crate::{app::AppState, catalog::CatalogSnapshot, error::AppResult, model::CatalogOut};

pub async fn get_catalog(State(state): State<AppState>) -> AppResult<Json<CatalogOut>> {
    let snapshot = state.catalog.get().await?;
    Ok(Json(catalog_out(&snapshot, true)))
}

pub async fn refresh_catalog(State(state): State<AppState>) -> AppResult<Json<CatalogOut>> {
    state.catalog.invalidate().await;
    let snapshot = state.catalog.get().await?;
    Ok(Json(catalog_out(&snapshot, false)))
}

fn catalog_out(snapshot: &CatalogSnapshot, with_products: bool) -> CatalogOut {
    CatalogOut {
        fetched_at: snapshot.fetched_at.to_rfc3339(),
        count: snapshot.products.len(),
        products: with_products.then(|| snapshot.products.clone()),
    }
}
