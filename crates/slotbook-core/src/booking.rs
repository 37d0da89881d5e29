//! Booking creation request and response.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::page::{Page, Service};

/// Answer to a custom details-form question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingAnswer {
    pub question_id: String,
    pub label: String,
    pub answer: String,
}

/// Body of `POST /api/bookings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub page_slug: String,
    pub service_id: String,
    pub date: NaiveDate,
    pub timezone: String,
    pub start_at_utc: DateTime<Utc>,
    pub slot_token: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub notes: String,
    pub answers: Vec<BookingAnswer>,
}

/// A stored booking as echoed back by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub id: String,
    #[serde(default)]
    pub status: String,
    pub start_at_utc: DateTime<Utc>,
    pub end_at_utc: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_link: Option<String>,
}

/// Successful booking response: `{ booking, page, service }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub booking: BookingRecord,
    pub page: Page,
    pub service: Service,
}
