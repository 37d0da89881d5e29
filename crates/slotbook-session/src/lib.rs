//! Booking session orchestration.
//!
//! This crate drives one visitor through a booking page: it caches day
//! availability, prefetches whole months with a bounded worker pool, fences
//! out stale prefetch runs, jumps to the next available day, and submits
//! the booking.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use slotbook_api::{HttpBackend, HttpBackendConfig};
//! use slotbook_session::{BookingFlow, FlowConfig, NoopRenderer};
//!
//! let backend = HttpBackend::new(HttpBackendConfig::new("https://book.example.com")?)?;
//! let flow = BookingFlow::load(Arc::new(backend), "studio", FlowConfig::default(), Arc::new(NoopRenderer)).await?;
//! flow.select_service("svc-1").await?;
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod flow;
pub mod navigator;
pub mod prefetch;
pub mod render;
pub mod select;
pub mod session;
pub mod submit;

#[cfg(test)]
mod testing;

pub use cache::{AvailabilityCache, CacheKey, SharedCache, new_shared_cache};
pub use config::{DEFAULT_PREFETCH_WORKERS, FlowConfig};
pub use error::{FlowError, FlowResult, ValidationError};
pub use fetcher::DayAvailabilityFetcher;
pub use flow::BookingFlow;
pub use navigator::NextAvailableNavigator;
pub use prefetch::{MonthPrefetcher, PrefetchOutcome};
pub use render::{NoopRenderer, Renderer};
pub use select::{DateSelector, DaySelection};
pub use session::{
    BookingForm, BookingSession, BookingStep, ConfirmationRecord, DayStatus, PrefetchStart,
    SharedSession, new_shared_session,
};
pub use submit::{BookingSubmitter, validate};
