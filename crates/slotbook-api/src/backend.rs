//! BookingBackend trait definition.
//!
//! The booking flow talks to the backend only through [`BookingBackend`], so
//! tests and alternative transports can stand in for [`HttpBackend`](crate::HttpBackend).

use std::future::Future;
use std::pin::Pin;

use chrono::NaiveDate;
use slotbook_core::{BookingConfirmation, BookingRequest, DayAvailability, PageBundle};

use crate::error::ApiResult;

/// A boxed future for object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Parameters of a single-day availability lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AvailabilityQuery {
    pub page_slug: String,
    pub service_id: String,
    pub date: NaiveDate,
    /// IANA timezone the date key is expressed in.
    pub timezone: String,
}

impl AvailabilityQuery {
    pub fn new(
        page_slug: impl Into<String>,
        service_id: impl Into<String>,
        date: NaiveDate,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            page_slug: page_slug.into(),
            service_id: service_id.into(),
            date,
            timezone: timezone.into(),
        }
    }
}

/// The public booking API.
///
/// Implementations must be `Send + Sync`; the booking flow issues several
/// day lookups concurrently against one backend.
pub trait BookingBackend: Send + Sync {
    /// Short name used in logs (e.g. "http").
    fn name(&self) -> &str;

    /// `GET /api/pages/{slug}`.
    fn load_page(&self, slug: String) -> BoxFuture<'_, ApiResult<PageBundle>>;

    /// `GET /api/pages/{slug}/availability`.
    ///
    /// Application-level error payloads are returned as errors.
    fn day_availability(&self, query: AvailabilityQuery) -> BoxFuture<'_, ApiResult<DayAvailability>>;

    /// `POST /api/bookings`.
    fn create_booking(
        &self,
        request: BookingRequest,
    ) -> BoxFuture<'_, ApiResult<BookingConfirmation>>;
}
