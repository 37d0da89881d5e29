//! Booking flow error types.

use slotbook_api::ApiError;
use thiserror::Error;

/// Result type for booking flow operations.
pub type FlowResult<T> = Result<T, FlowError>;

/// A submission precondition that failed locally.
///
/// The display text is shown to the visitor as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please choose a service.")]
    ServiceRequired,

    #[error("Please select a valid time slot first.")]
    SlotRequired,

    #[error("Name and email are required.")]
    ContactRequired,

    #[error("Phone number is required.")]
    PhoneRequired,

    #[error("Please review your details before booking.")]
    DetailsRequired,
}

/// Errors that can occur while driving a booking flow.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Backend or transport failure.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Submission was rejected before reaching the network.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The page exists but offers nothing to book.
    #[error("page {slug:?} has no bookable services")]
    NoServices { slug: String },

    /// The service is not offered on this page.
    #[error("unknown service: {0}")]
    UnknownService(String),

    /// A submission is already in flight.
    #[error("a booking is already being submitted")]
    AlreadySubmitting,

    /// The session already holds a confirmed booking.
    #[error("this booking is already confirmed")]
    AlreadyConfirmed,
}

impl FlowError {
    /// Creates a no-services error.
    pub fn no_services(slug: impl Into<String>) -> Self {
        Self::NoServices { slug: slug.into() }
    }

    /// Message suitable for the visitor.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) => err.message().to_string(),
            other => other.to_string(),
        }
    }
}
