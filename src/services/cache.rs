use crate::models::{Facility, FacilityCategory};
use crate::services::store::{FacilityStore, StoreError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Facility store decorator that keeps category listings in memory
///
/// Concurrent misses for the same category are coalesced into a single
/// read of the inner store. Entries expire after the configured TTL.
pub struct CachedStore<S> {
    inner: S,
    listings: moka::future::Cache<FacilityCategory, Arc<Vec<Facility>>>,
}

impl<S: FacilityStore> CachedStore<S> {
    pub fn new(inner: S, ttl_secs: u64) -> Self {
        let listings = moka::future::CacheBuilder::new(FacilityCategory::ALL.len() as u64)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { inner, listings }
    }

    /// Category listing shared with other readers
    pub async fn listing(&self, category: FacilityCategory) -> Result<Arc<Vec<Facility>>, StoreError> {
        self.listings
            .try_get_with(category, async {
                tracing::debug!("Listing cache miss: {}", category);
                self.inner.list_by_category(category).await.map(Arc::new)
            })
            .await
            .map_err(StoreError::Shared)
    }

    /// Drop every cached listing
    pub fn invalidate_all(&self) {
        self.listings.invalidate_all();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.listings.entry_count(),
        }
    }
}

#[async_trait]
impl<S: FacilityStore> FacilityStore for CachedStore<S> {
    async fn list_by_category(&self, category: FacilityCategory) -> Result<Vec<Facility>, StoreError> {
        Ok(self.listing(category).await?.as_ref().clone())
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FacilityStore for CountingStore {
        async fn list_by_category(&self, category: FacilityCategory) -> Result<Vec<Facility>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if category == FacilityCategory::Ads {
                return Err(StoreError::Unavailable("ads".to_string()));
            }
            Ok(vec![Facility {
                id: "f1".to_string(),
                category,
                coordinate: None,
                title: None,
                address: None,
            }])
        }
    }

    #[tokio::test]
    async fn test_listing_is_fetched_once() {
        let cache = CachedStore::new(CountingStore { calls: AtomicUsize::new(0) }, 60);

        let first = cache.list_by_category(FacilityCategory::Plasma).await.unwrap();
        let second = cache.list_by_category(FacilityCategory::Plasma).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let cache = CachedStore::new(CountingStore { calls: AtomicUsize::new(0) }, 60);

        assert!(cache.list_by_category(FacilityCategory::Ads).await.is_err());
        assert!(cache.list_by_category(FacilityCategory::Ads).await.is_err());
        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 2);
    }
}
