//! Session-lifetime memo of day availability.
//!
//! Entries are keyed by (service, date, timezone) and never expire: a day's
//! answer is treated as stable for the duration of one visit. Values are
//! shared behind [`Arc`] so every reader sees the very same response.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use slotbook_core::DayAvailability;
use tokio::sync::RwLock;
use tracing::trace;

/// Composite cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub service_id: String,
    pub date: NaiveDate,
    pub timezone: String,
}

impl CacheKey {
    pub fn new(service_id: &str, date: NaiveDate, timezone: &str) -> Self {
        Self {
            service_id: service_id.to_string(),
            date,
            timezone: timezone.to_string(),
        }
    }
}

/// Availability cache without eviction.
#[derive(Debug, Default)]
pub struct AvailabilityCache {
    entries: HashMap<CacheKey, Arc<DayAvailability>>,
}

/// Cache shared between concurrent day lookups.
pub type SharedCache = Arc<RwLock<AvailabilityCache>>;

/// Creates an empty shared cache.
pub fn new_shared_cache() -> SharedCache {
    Arc::new(RwLock::new(AvailabilityCache::new()))
}

impl AvailabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored response, if any.
    pub fn get(
        &self,
        service_id: &str,
        date: NaiveDate,
        timezone: &str,
    ) -> Option<Arc<DayAvailability>> {
        self.entries
            .get(&CacheKey::new(service_id, date, timezone))
            .cloned()
    }

    /// Stores a response and returns the shared handle to it.
    ///
    /// Writing an existing key replaces it; concurrent lookups of the same day
    /// are expected to produce identical answers.
    pub fn put(
        &mut self,
        service_id: &str,
        date: NaiveDate,
        timezone: &str,
        response: DayAvailability,
    ) -> Arc<DayAvailability> {
        let response = Arc::new(response);
        self.entries.insert(
            CacheKey::new(service_id, date, timezone),
            Arc::clone(&response),
        );
        trace!(service_id, %date, timezone, "Cached day availability");
        response
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
