//! Client error types.

use slotbook_api::ApiError;
use slotbook_core::TracingError;
use slotbook_session::FlowError;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A command-line argument could not be interpreted.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested time is not offered on that day.
    #[error("no open slot at {time} on {date}")]
    SlotNotFound { date: String, time: String },

    /// The day could not be loaded.
    #[error("could not load {date}: {message}")]
    DayUnavailable { date: String, message: String },

    /// Failure talking to the booking backend.
    #[error("backend error: {0}")]
    Api(#[from] ApiError),

    /// The booking flow rejected the request.
    #[error("{}", .0.user_message())]
    Flow(#[from] FlowError),

    /// Logging could not be set up.
    #[error(transparent)]
    Tracing(#[from] TracingError),

    /// Output could not be serialized.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
