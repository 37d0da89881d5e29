//! Single-day availability lookups through the session cache.

use std::sync::Arc;

use chrono::NaiveDate;
use slotbook_api::{ApiResult, AvailabilityQuery, BookingBackend};
use slotbook_core::DayAvailability;
use tracing::trace;

use crate::cache::SharedCache;

/// Fetches one day's availability, consulting the cache first.
///
/// Failures are not retried and not cached; callers decide what a failed day
/// means for them.
#[derive(Clone)]
pub struct DayAvailabilityFetcher {
    backend: Arc<dyn BookingBackend>,
    cache: SharedCache,
    page_slug: String,
}

impl DayAvailabilityFetcher {
    pub fn new(backend: Arc<dyn BookingBackend>, cache: SharedCache, page_slug: impl Into<String>) -> Self {
        Self {
            backend,
            cache,
            page_slug: page_slug.into(),
        }
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    /// Returns the availability of `date` for a service in a timezone.
    pub async fn fetch_day(
        &self,
        service_id: &str,
        date: NaiveDate,
        timezone: &str,
    ) -> ApiResult<Arc<DayAvailability>> {
        if let Some(hit) = self.cache.read().await.get(service_id, date, timezone) {
            trace!(service_id, %date, "Day availability cache hit");
            return Ok(hit);
        }

        let query = AvailabilityQuery::new(&self.page_slug, service_id, date, timezone);
        let day = self.backend.day_availability(query).await?;

        Ok(self.cache.write().await.put(service_id, date, timezone, day))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::new_shared_cache;
    use crate::testing::{ScriptedBackend, june, open_day};

    fn fetcher(backend: Arc<ScriptedBackend>) -> DayAvailabilityFetcher {
        DayAvailabilityFetcher::new(backend, new_shared_cache(), "studio")
    }

    #[tokio::test]
    async fn second_fetch_is_served_from_cache() {
        let backend = Arc::new(ScriptedBackend::new().with_day("svc-1", june(10), open_day(june(10))));
        let fetcher = fetcher(backend.clone());

        let first = fetcher.fetch_day("svc-1", june(10), "UTC").await.unwrap();
        let second = fetcher.fetch_day("svc-1", june(10), "UTC").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.slots.len(), 2);
        assert_eq!(backend.day_calls(), 1);
    }

    #[tokio::test]
    async fn timezone_is_part_of_the_key() {
        let backend = Arc::new(ScriptedBackend::new());
        let fetcher = fetcher(backend.clone());

        fetcher.fetch_day("svc-1", june(10), "UTC").await.unwrap();
        fetcher.fetch_day("svc-1", june(10), "Asia/Tokyo").await.unwrap();
        fetcher.fetch_day("svc-2", june(10), "UTC").await.unwrap();

        assert_eq!(backend.day_calls(), 3);
        assert_eq!(fetcher.cache().read().await.len(), 3);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let backend = Arc::new(ScriptedBackend::new().with_day_failure("svc-1", june(10), "boom"));
        let fetcher = fetcher(backend.clone());

        let err = fetcher.fetch_day("svc-1", june(10), "UTC").await.unwrap_err();
        assert_eq!(err.message(), "boom");
        assert!(fetcher.fetch_day("svc-1", june(10), "UTC").await.is_err());

        assert_eq!(backend.day_calls(), 2);
        assert!(fetcher.cache().read().await.is_empty());
    }
}
