//! Bookable slots and single-day availability.
//!
//! Slots are produced by the backend. Apart from the display labels, the only
//! parts the client relies on are [`DaySlot::start_at_utc`] (identity within a
//! day) and [`DaySlot::token`] (presented back when booking).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A wall-clock label in the visitor's timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalStamp {
    /// Calendar day (`YYYY-MM-DD`).
    pub date: NaiveDate,
    /// Time of day as rendered by the backend (e.g. `09:30`).
    pub time: String,
}

/// One bookable slot within a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySlot {
    pub start_at_utc: DateTime<Utc>,
    pub end_at_utc: DateTime<Utc>,
    /// Opaque token minted by the availability endpoint.
    pub token: String,
    pub start_local: LocalStamp,
    pub end_local: LocalStamp,
}

impl DaySlot {
    /// Display label for the slot start, e.g. `09:00`.
    pub fn label(&self) -> &str {
        &self.start_local.time
    }
}

/// Availability of one calendar day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayAvailability {
    /// Open slots, in backend order.
    pub slots: Vec<DaySlot>,
    /// Nearest future date with open slots, if the backend suggested one.
    pub next_available: Option<NaiveDate>,
}

impl DayAvailability {
    /// Creates an availability answer from a slot list.
    pub fn new(slots: Vec<DaySlot>) -> Self {
        Self {
            slots,
            next_available: None,
        }
    }

    /// Builder: set the next-available hint.
    pub fn with_next_available(mut self, date: NaiveDate) -> Self {
        self.next_available = Some(date);
        self
    }

    /// Returns true if the day has at least one open slot.
    pub fn is_available(&self) -> bool {
        !self.slots.is_empty()
    }
}
