//! Promotional catalog cache. Holds one flattened snapshot of all stores and refreshes it from
//! the upstream feed once it is older than the configured TTL.

pub mod flatten;
pub mod source;

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::{
    sync::{Mutex, RwLock},
    time::Instant,
};
use tracing::{debug, info, warn};

use crate::model::FlatPromoProduct;

pub use source::{CatalogSource, HttpCatalogSource};

pub const DEFAULT_TTL: Duration = Duration::from_secs(6 * 60 * 60);

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("catalog source returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("catalog payload could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// An immutable, internally consistent view of every known promotional product.
#[derive(Debug)]
pub struct CatalogSnapshot {
    pub products: Vec<FlatPromoProduct>,
    pub fetched_at: DateTime<Utc>,
}

struct CachedSnapshot {
    snapshot: Arc<CatalogSnapshot>,
    loaded_at: Instant,
    invalidated: bool,
}

pub struct CatalogCache {
    source: Arc<dyn CatalogSource>,
    ttl: Duration,
    current: RwLock<Option<CachedSnapshot>>,
    refresh_lock: Mutex<()>,
}

impl CatalogCache {
    pub fn new(source: Arc<dyn CatalogSource>, ttl: Duration) -> Self {
        let ttl = if ttl.is_zero() { DEFAULT_TTL } else { ttl };
        Self {
            source,
            ttl,
            current: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Current snapshot, fetching a new one first when none is cached or the cached one expired.
    ///
    /// A failed fetch is returned as-is; the previous snapshot is kept but not served.
    pub async fn get(&self) -> Result<Arc<CatalogSnapshot>, CatalogError> {
        if let Some(snapshot) = self.fresh_snapshot().await {
            return Ok(snapshot);
        }

        let _refresh = self.refresh_lock.lock().await;
        // Another caller may have refreshed while we waited.
        if let Some(snapshot) = self.fresh_snapshot().await {
            return Ok(snapshot);
        }

        self.refresh().await
    }

    /// Last loaded snapshot regardless of age. Never touches the upstream source.
    pub async fn peek(&self) -> Option<Arc<CatalogSnapshot>> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|cached| Arc::clone(&cached.snapshot))
    }

    /// Mark the cached snapshot stale so the next [`CatalogCache::get`] fetches.
    pub async fn invalidate(&self) {
        if let Some(cached) = self.current.write().await.as_mut() {
            cached.invalidated = true;
            debug!("catalog snapshot invalidated");
        }
    }

    async fn fresh_snapshot(&self) -> Option<Arc<CatalogSnapshot>> {
        let guard = self.current.read().await;
        guard
            .as_ref()
            .filter(|cached| !cached.invalidated && cached.loaded_at.elapsed() < self.ttl)
            .map(|cached| Arc::clone(&cached.snapshot))
    }

    async fn refresh(&self) -> Result<Arc<CatalogSnapshot>, CatalogError> {
        let started = Instant::now();
        let entries = match self.source.fetch().await {
            Ok(entries) => entries,
            Err(err) => {
                warn!(error = %err, "catalog refresh failed");
                return Err(err);
            }
        };

        let (products, stats) = flatten::flatten_entries(entries);
        let snapshot = Arc::new(CatalogSnapshot {
            products,
            fetched_at: Utc::now(),
        });

        *self.current.write().await = Some(CachedSnapshot {
            snapshot: Arc::clone(&snapshot),
            loaded_at: Instant::now(),
            invalidated: false,
        });

        info!(
            stores = stats.stores,
            products = stats.products,
            skipped = stats.skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "catalog refreshed"
        );

        Ok(snapshot)
    }
}
