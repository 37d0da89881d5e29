//! Booking API access.
//!
//! - [`BookingBackend`] - object-safe trait the booking flow depends on
//! - [`HttpBackend`] - JSON-over-HTTP implementation
//! - [`ApiError`] - error type carrying visitor-facing messages
//!
//! # Example
//!
//! ```ignore
//! use slotbook_api::{BookingBackend, HttpBackend, HttpBackendConfig};
//!
//! let backend = HttpBackend::new(HttpBackendConfig::new("https://book.example.com")?)?;
//! let bundle = backend.load_page("studio".to_string()).await?;
//! ```

pub mod backend;
pub mod error;
pub mod http;

pub use backend::{AvailabilityQuery, BookingBackend, BoxFuture};
pub use error::{ApiError, ApiErrorCode, ApiResult};
pub use http::{HttpBackend, HttpBackendConfig};
