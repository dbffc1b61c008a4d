use axum::{extract::State, Json};

use crate::{
    app::AppState,
    error::AppResult,
    model::{DealsPayload, DealsResponse, SearchPayload, SearchResponse},
    service,
};

pub async fn match_list(
    State(state): State<AppState>,
    Json(payload): Json<DealsPayload>,
) -> AppResult<Json<DealsResponse>> {
    let response = service::deals::list_deals(&state.catalog, &state.matcher, payload).await?;
    Ok(Json(response))
}

pub async fn search(
    State(state): State<AppState>,
    Json(payload): Json<SearchPayload>,
) -> AppResult<Json<SearchResponse>> {
    let response = service::deals::search_deals(&state.catalog, &state.matcher, payload).await?;
    Ok(Json(response))
}
