use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::CatalogError;
use crate::config::CatalogConfig;

/// Upstream provider of per-store promotional product lists.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<serde_json::Value>, CatalogError>;
}

pub struct HttpCatalogSource {
    client: Client,
    url: Url,
}

impl HttpCatalogSource {
    pub fn new(config: &CatalogConfig) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs.max(1));
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(timeout)
            .build()
            .context("failed to build catalog http client")?;

        Ok(Self {
            client,
            url: products_url(&config.base_url, config.offers_only)?,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

fn products_url(base_url: &str, offers_only: bool) -> anyhow::Result<Url> {
    let mut base = Url::parse(base_url.trim())
        .with_context(|| format!("invalid catalog base url: {base_url}"))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    let mut url = base
        .join("products")
        .with_context(|| format!("failed to build products url from {base_url}"))?;
    if offers_only {
        url.query_pairs_mut().append_pair("offers", "true");
    }
    Ok(url)
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn fetch(&self) -> Result<Vec<serde_json::Value>, CatalogError> {
        let response = self.client.get(self.url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status));
        }

        let bytes = response.bytes().await?;
        let entries = serde_json::from_slice(&bytes)?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::json;
    use tokio::net::TcpListener;

    use super::*;

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });
        format!("http://{addr}")
    }

    fn config(base_url: String) -> CatalogConfig {
        CatalogConfig {
            base_url,
            ..CatalogConfig::default()
        }
    }

    #[test]
    fn builds_products_url() {
        let url = products_url("https://api.example.com", true).expect("url");
        assert_eq!(url.as_str(), "https://api.example.com/products?offers=true");

        let url = products_url("https://api.example.com/v1/", false).expect("url");
        assert_eq!(url.as_str(), "https://api.example.com/v1/products");

        assert!(products_url("not a url", true).is_err());
    }

    #[tokio::test]
    async fn fetches_store_entries() {
        let router = Router::new().route(
            "/products",
            get(|| async {
                Json(json!([
                    { "supermarket": "Lidl", "products": [{ "name": "Банани", "price": 1.29 }] }
                ]))
            }),
        );
        let source = HttpCatalogSource::new(&config(serve(router).await)).expect("source");

        let entries = source.fetch().await.expect("fetch");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["supermarket"], "Lidl");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let router = Router::new().route(
            "/products",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let source = HttpCatalogSource::new(&config(serve(router).await)).expect("source");

        match source.fetch().await {
            Err(CatalogError::Status(status)) => assert_eq!(status, 503),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unexpected_shape_is_a_decode_error() {
        let router = Router::new().route(
            "/products",
            get(|| async { Json(json!({ "error": "rate limited" })) }),
        );
        let source = HttpCatalogSource::new(&config(serve(router).await)).expect("source");

        assert!(matches!(source.fetch().await, Err(CatalogError::Decode(_))));
    }
}
