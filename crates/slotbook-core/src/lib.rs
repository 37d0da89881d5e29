//! Core types: slots, pages, bookings, months, calendar artifacts

pub mod booking;
pub mod calendar;
pub mod month;
pub mod page;
pub mod slot;
pub mod tracing;

pub use booking::{BookingAnswer, BookingConfirmation, BookingRecord, BookingRequest};
pub use calendar::{CalendarEvent, add_event_url, compact_utc, ics_data_uri, ics_document};
pub use month::{date_key, month_days, month_start, parse_date_key, parse_month, shift_month};
pub use page::{
    CustomQuestion, DetailsFormSection, Page, PageBundle, PageConfig, PageSection, Service,
    ServiceListSection,
};
pub use slot::{DayAvailability, DaySlot, LocalStamp};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
