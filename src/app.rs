use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    api,
    catalog::{CatalogCache, CatalogSource, HttpCatalogSource},
    config::{AppConfig, MatcherConfig},
    middleware::assign_trace_id,
};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogCache>,
    pub matcher: MatcherConfig,
}

pub async fn build_router(config: &AppConfig) -> anyhow::Result<Router> {
    let source = HttpCatalogSource::new(&config.catalog)?;
    tracing::info!(url = %source.url(), ttl_secs = config.catalog.ttl_secs, "catalog source configured");

    let source: Arc<dyn CatalogSource> = Arc::new(source);
    let catalog = Arc::new(CatalogCache::new(source, config.catalog.ttl()));

    spawn_warmup(Arc::clone(&catalog));

    let state = AppState {
        catalog,
        matcher: config.matcher.clone(),
    };

    Ok(router(state))
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let middleware = ServiceBuilder::new()
        .layer(middleware::from_fn(assign_trace_id))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    Router::new()
        .route("/healthz", get(api::health::health_check))
        .route("/catalog", get(api::catalog::get_catalog))
        .route("/catalog/refresh", post(api::catalog::refresh_catalog))
        .route("/deals", post(api::deals::match_list))
        .route("/deals/search", post(api::deals::search))
        .layer(middleware)
        .with_state(state)
}

/// Load the first snapshot in the background so the first request does not pay for it.
/// Failure is only logged; requests will retry the fetch.
fn spawn_warmup(catalog: Arc<CatalogCache>) {
    tokio::spawn(async move {
        match catalog.get().await {
            Ok(snapshot) => tracing::info!(products = snapshot.products.len(), "catalog warmed up"),
            Err(err) => tracing::warn!(error = %err, "catalog warm-up failed"),
        }
    });
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::catalog::{CatalogError, DEFAULT_TTL};

    struct StaticSource(Option<Value>);

    #[async_trait]
    impl CatalogSource for StaticSource {
        async fn fetch(&self) -> Result<Vec<Value>, CatalogError> {
            match &self.0 {
                Some(entries) => Ok(serde_json::from_value(entries.clone())?),
                None => Err(CatalogError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE)),
            }
        }
    }

    fn app(entries: Option<Value>) -> Router {
        let source: Arc<dyn CatalogSource> = Arc::new(StaticSource(entries));
        router(AppState {
            catalog: Arc::new(CatalogCache::new(source, DEFAULT_TTL)),
            matcher: MatcherConfig::default(),
        })
    }

    fn feed() -> Value {
        json!([
            {
                "supermarket": "Lidl",
                "products": [
                    { "name": "Чери домати 500г", "price": 7.5, "oldPrice": 10.0, "validUntil": "2026-10-19" },
                    { "name": "Хляб Добруджа", "price": 1.19 }
                ]
            },
            {
                "supermarket": "Billa",
                "products": [ { "name": "Домат розов", "price": 3.49, "oldPrice": 4.99 } ]
            }
        ])
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .expect("request");
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        assert!(response.headers().contains_key(crate::middleware::TRACE_ID_HEADER));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }

    #[tokio::test]
    async fn deals_endpoint_matches_each_item() {
        let body = json!({ "items": [
            { "id": "1", "name": "домати" },
            { "id": "2", "name": "мляко" }
        ]});
        let (status, value) = send(app(Some(feed())), "POST", "/deals", Some(body)).await;

        assert_eq!(status, StatusCode::OK);
        let results = value["results"].as_array().expect("results");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["status"], "deal");
        assert_eq!(results[0]["store"], "Lidl");
        assert_eq!(results[0]["promoName"], "Чери домати 500г");
        assert_eq!(results[0]["discount"], 25);
        assert_eq!(results[0]["validUntil"], "2026-10-19");
        assert_eq!(results[1], json!({ "itemId": "2", "itemName": "мляко", "status": "no_deal" }));
    }

    #[tokio::test]
    async fn deals_endpoint_rejects_empty_list() {
        let (status, value) =
            send(app(Some(feed())), "POST", "/deals", Some(json!({ "items": [] }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["error"]["message"], "No items provided.");
    }

    #[tokio::test]
    async fn search_endpoint_ranks_deals() {
        let (status, value) = send(
            app(Some(feed())),
            "POST",
            "/deals/search",
            Some(json!({ "query": "  домати " })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["query"], "домати");
        let deals = value["deals"].as_array().expect("deals");
        assert_eq!(deals.len(), 2);
        assert_eq!(deals[0]["promoName"], "Чери домати 500г");
        assert_eq!(deals[0]["score"], 1.0);
        assert_eq!(deals[1]["store"], "Billa");
    }

    #[tokio::test]
    async fn search_endpoint_rejects_blank_query() {
        let (status, _) = send(
            app(Some(feed())),
            "POST",
            "/deals/search",
            Some(json!({ "query": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upstream_failure_maps_to_bad_gateway() {
        let body = json!({ "items": [ { "id": "1", "name": "домати" } ] });
        let (status, value) = send(app(None), "POST", "/deals", Some(body)).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(value["error"]["code"], "UpstreamUnavailable");
        assert_eq!(
            value["error"]["message"],
            "Could not fetch promotional data. Try again later."
        );
    }

    #[tokio::test]
    async fn catalog_endpoints_report_snapshot() {
        let app = app(Some(feed()));

        let (status, value) = send(app.clone(), "GET", "/healthz", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["catalogLoaded"], false);

        let (status, value) = send(app.clone(), "GET", "/catalog", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["count"], 3);
        assert_eq!(value["products"][0]["store"], "Lidl");
        assert_eq!(value["products"][0]["discount"], 25);

        let (status, value) = send(app.clone(), "POST", "/catalog/refresh", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["count"], 3);
        assert!(value.get("products").is_none());

        let (_, value) = send(app, "GET", "/healthz", None).await;
        assert_eq!(value["catalogLoaded"], true);
        assert_eq!(value["catalogProducts"], 3);
    }
}
