//! Booking flow configuration.

use chrono::NaiveDate;
use slotbook_core::month_start;

/// Number of concurrent day lookups during a month prefetch.
pub const DEFAULT_PREFETCH_WORKERS: usize = 6;

/// Booking flow configuration.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Concurrent day lookups per month prefetch.
    pub prefetch_workers: usize,
    /// Timezone a new session starts in.
    pub default_timezone: String,
    /// Month shown first. Defaults to the current month.
    pub initial_month: Option<NaiveDate>,
    /// Status text shown while a month is being checked.
    pub loading_text: String,
    /// Status text shown when no open day could be found.
    pub empty_text: String,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            prefetch_workers: DEFAULT_PREFETCH_WORKERS,
            default_timezone: "UTC".to_string(),
            initial_month: None,
            loading_text: "Checking availability…".to_string(),
            empty_text: "No open times found.".to_string(),
        }
    }
}

impl FlowConfig {
    /// Builder: set the worker count (at least one).
    pub fn with_prefetch_workers(mut self, workers: usize) -> Self {
        self.prefetch_workers = workers.max(1);
        self
    }

    /// Builder: set the starting timezone.
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.default_timezone = timezone.into();
        self
    }

    /// Builder: set the starting month (any day within it).
    pub fn with_initial_month(mut self, month: NaiveDate) -> Self {
        self.initial_month = Some(month_start(month));
        self
    }

    /// Resolves the month a new session opens on.
    pub fn start_month(&self) -> NaiveDate {
        self.initial_month
            .unwrap_or_else(|| month_start(chrono::Local::now().date_naive()))
    }
}
