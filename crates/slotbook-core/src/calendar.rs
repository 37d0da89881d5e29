//! Calendar-add artifacts for a confirmed booking.
//!
//! Two outputs are produced from a [`CalendarEvent`]:
//! - an "add event" URL for the Google Calendar web template endpoint
//! - a minimal iCalendar (RFC 5545) document, delivered inline as a
//!   `data:` URI so it can be downloaded without a server round trip
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use slotbook_core::calendar::{CalendarEvent, add_event_url};
//!
//! let start = Utc.with_ymd_and_hms(2025, 6, 10, 9, 0, 0).unwrap();
//! let event = CalendarEvent::new("bk-1", "Consultation", start, start + chrono::Duration::minutes(30));
//! assert!(add_event_url(&event).contains("dates=20250610T090000Z%2F20250610T093000Z"));
//! ```

use chrono::{DateTime, Utc};
use icalendar::{Calendar, Component, EventLike, Property};

/// Google Calendar event template endpoint.
const GOOGLE_TEMPLATE_URL: &str = "https://calendar.google.com/calendar/render";

/// Location used when a booking has no meeting link.
pub const DEFAULT_LOCATION: &str = "Online meeting";

/// Product identifier written into generated calendar files.
const PRODID: &str = "-//slotbook//booking//EN";

/// A booked event, ready to be exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    /// Stable identifier, used for the calendar UID.
    pub uid: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub description: String,
    /// Meeting link or [`DEFAULT_LOCATION`].
    pub location: String,
}

impl CalendarEvent {
    /// Creates an event with an empty description and the default location.
    pub fn new(
        uid: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            uid: uid.into(),
            title: title.into(),
            start,
            end,
            description: String::new(),
            location: DEFAULT_LOCATION.to_string(),
        }
    }

    /// Builder: set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder: use a meeting link as location, falling back to the default.
    pub fn with_meeting_link(mut self, link: Option<&str>) -> Self {
        self.location = match link.map(str::trim) {
            Some(link) if !link.is_empty() => link.to_string(),
            _ => DEFAULT_LOCATION.to_string(),
        };
        self
    }
}

/// Formats a UTC instant as a compact calendar timestamp (`YYYYMMDDTHHMMSSZ`).
pub fn compact_utc(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Builds a Google Calendar "add event" URL.
pub fn add_event_url(event: &CalendarEvent) -> String {
    let dates = format!("{}/{}", compact_utc(event.start), compact_utc(event.end));
    let params = [
        ("action", "TEMPLATE"),
        ("text", event.title.as_str()),
        ("dates", dates.as_str()),
        ("details", event.description.as_str()),
        ("location", event.location.as_str()),
    ];

    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", GOOGLE_TEMPLATE_URL, query)
}

/// Renders a single-event calendar document.
///
/// `stamp` becomes the DTSTAMP (creation instant of the document). Text
/// values are escaped and long lines folded by `icalendar`.
pub fn ics_document(event: &CalendarEvent, stamp: DateTime<Utc>) -> String {
    let vevent = icalendar::Event::new()
        .uid(&event.uid)
        .timestamp(stamp)
        .starts(event.start)
        .ends(event.end)
        .summary(&event.title)
        .description(&event.description)
        .location(&event.location)
        .done();

    let mut calendar = Calendar::empty();
    calendar
        .append_property(Property::new("VERSION", "2.0"))
        .append_property(Property::new("PRODID", PRODID))
        .push(vevent);
    calendar.to_string()
}

/// Renders the calendar document as a downloadable `data:` URI.
pub fn ics_data_uri(event: &CalendarEvent, stamp: DateTime<Utc>) -> String {
    format!(
        "data:text/calendar;charset=utf-8,{}",
        urlencoding::encode(&ics_document(event, stamp))
    )
}
