//! Booking session state machine.
//!
//! A [`BookingSession`] holds everything the visitor has chosen so far and
//! the step they are on:
//!
//! ```text
//! service_selection ──► schedule ◄──► details ──► confirmed
//! ```
//!
//! The session itself never suspends. Orchestration code (month prefetch,
//! date selection, submission) takes the write lock of a [`SharedSession`],
//! applies one synchronous mutation, and releases it before awaiting the
//! network, so updates never interleave.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use slotbook_core::{DayAvailability, DaySlot, month_days, month_start};
use tokio::sync::RwLock;

/// Visitor-facing step of the booking flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStep {
    #[default]
    ServiceSelection,
    Schedule,
    Details,
    Confirmed,
}

impl BookingStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServiceSelection => "service_selection",
            Self::Schedule => "schedule",
            Self::Details => "details",
            Self::Confirmed => "confirmed",
        }
    }
}

/// What is known about one calendar day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    #[default]
    Unknown,
    Unavailable,
    Available,
}

impl DayStatus {
    pub fn from_available(available: bool) -> Self {
        if available {
            Self::Available
        } else {
            Self::Unavailable
        }
    }
}

/// Visitor-entered details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookingForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub notes: String,
    /// Custom question answers keyed by question id.
    pub answers: HashMap<String, String>,
}

/// Result of a successful booking, handed to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationRecord {
    pub summary_text: String,
    pub meeting_link: Option<String>,
    pub calendar_url: String,
    pub calendar_file_uri: String,
}

/// Session shared between the flow and its in-flight operations.
pub type SharedSession = Arc<RwLock<BookingSession>>;

/// Wraps a session for sharing.
pub fn new_shared_session(session: BookingSession) -> SharedSession {
    Arc::new(RwLock::new(session))
}

/// Snapshot of a month prefetch taken when the run starts.
#[derive(Debug, Clone)]
pub struct PrefetchStart {
    pub run_id: u64,
    pub service_id: String,
    pub timezone: String,
    pub days: Vec<NaiveDate>,
    /// Private copy of the month's statuses that the run fills in.
    pub map: BTreeMap<NaiveDate, DayStatus>,
}

/// One visitor's booking session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSession {
    step: BookingStep,
    service_id: Option<String>,
    timezone: String,
    current_month: NaiveDate,
    selected_date: Option<NaiveDate>,
    selected_slot_start: Option<DateTime<Utc>>,
    slots: Vec<DaySlot>,
    availability: BTreeMap<NaiveDate, DayStatus>,
    next_available_hint: Option<NaiveDate>,
    form: BookingForm,
    submitting: bool,
    form_error: Option<String>,
    confirmation: Option<ConfirmationRecord>,
    status_text: Option<String>,
    day_error: Option<String>,
    #[serde(skip)]
    active_run: u64,
    /// Days answered by a direct lookup since the last prefetch started.
    #[serde(skip)]
    resolved_days: BTreeSet<NaiveDate>,
}

impl BookingSession {
    /// Creates a session on the service selection step.
    pub fn new(timezone: impl Into<String>, month: NaiveDate) -> Self {
        Self {
            step: BookingStep::ServiceSelection,
            service_id: None,
            timezone: timezone.into(),
            current_month: month_start(month),
            selected_date: None,
            selected_slot_start: None,
            slots: Vec::new(),
            availability: BTreeMap::new(),
            next_available_hint: None,
            form: BookingForm::default(),
            submitting: false,
            form_error: None,
            confirmation: None,
            status_text: None,
            day_error: None,
            active_run: 0,
            resolved_days: BTreeSet::new(),
        }
    }

    // ----- accessors -----

    pub fn step(&self) -> BookingStep {
        self.step
    }

    pub fn service_id(&self) -> Option<&str> {
        self.service_id.as_deref()
    }

    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    /// First day of the visible month.
    pub fn current_month(&self) -> NaiveDate {
        self.current_month
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.selected_date
    }

    pub fn selected_slot_start(&self) -> Option<DateTime<Utc>> {
        self.selected_slot_start
    }

    /// The selected slot, resolved against the loaded slots.
    pub fn selected_slot(&self) -> Option<&DaySlot> {
        let start = self.selected_slot_start?;
        self.slots.iter().find(|slot| slot.start_at_utc == start)
    }

    pub fn slots(&self) -> &[DaySlot] {
        &self.slots
    }

    pub fn availability(&self) -> &BTreeMap<NaiveDate, DayStatus> {
        &self.availability
    }

    pub fn day_status(&self, date: NaiveDate) -> DayStatus {
        self.availability.get(&date).copied().unwrap_or_default()
    }

    pub fn next_available_hint(&self) -> Option<NaiveDate> {
        self.next_available_hint
    }

    pub fn form(&self) -> &BookingForm {
        &self.form
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn form_error(&self) -> Option<&str> {
        self.form_error.as_deref()
    }

    pub fn confirmation(&self) -> Option<&ConfirmationRecord> {
        self.confirmation.as_ref()
    }

    pub fn status_text(&self) -> Option<&str> {
        self.status_text.as_deref()
    }

    /// Error from the last direct day lookup.
    pub fn day_error(&self) -> Option<&str> {
        self.day_error.as_deref()
    }

    /// Identifier of the most recently started month prefetch.
    pub fn active_run(&self) -> u64 {
        self.active_run
    }

    /// Earliest known-available day of the visible month.
    pub fn first_available_day(&self) -> Option<NaiveDate> {
        month_days(self.current_month)
            .into_iter()
            .find(|day| self.day_status(*day) == DayStatus::Available)
    }

    // ----- transitions -----

    /// Drops every selection that depends on service or timezone.
    fn reset_schedule(&mut self) {
        self.selected_date = None;
        self.selected_slot_start = None;
        self.slots.clear();
        self.availability.clear();
        self.resolved_days.clear();
        self.next_available_hint = None;
        self.day_error = None;
        self.status_text = None;
        self.supersede_runs();
    }

    /// Invalidates any in-flight prefetch.
    fn supersede_runs(&mut self) {
        self.active_run += 1;
    }

    /// Returns true if a service may be (re)selected on this step.
    pub fn accepts_service_change(&self) -> bool {
        matches!(
            self.step,
            BookingStep::ServiceSelection | BookingStep::Schedule
        )
    }

    /// Selects a service and moves to the schedule step.
    pub fn choose_service(&mut self, service_id: impl Into<String>) -> bool {
        if !self.accepts_service_change() {
            return false;
        }
        self.reset_schedule();
        self.service_id = Some(service_id.into());
        self.form_error = None;
        self.step = BookingStep::Schedule;
        true
    }

    /// Switches timezone; day-level availability no longer applies.
    pub fn change_timezone(&mut self, timezone: impl Into<String>) {
        self.timezone = timezone.into();
        self.reset_schedule();
    }

    /// Shows another month. Selections are kept.
    pub fn set_month(&mut self, month: NaiveDate) {
        self.current_month = month_start(month);
        self.supersede_runs();
    }

    /// Starts loading a day: selects it and clears dependent state.
    pub fn begin_date_selection(&mut self, date: NaiveDate) {
        self.selected_date = Some(date);
        self.selected_slot_start = None;
        self.slots.clear();
        self.next_available_hint = None;
        self.day_error = None;
    }

    /// Applies a day lookup for the selected date.
    pub fn apply_day(&mut self, date: NaiveDate, day: &DayAvailability) {
        self.slots = day.slots.clone();
        self.availability
            .insert(date, DayStatus::from_available(day.is_available()));
        self.resolved_days.insert(date);
        if self.selected_slot().is_none() {
            self.selected_slot_start = None;
        }
        self.day_error = None;
    }

    /// Records a failed direct day lookup.
    pub fn fail_day(&mut self, message: impl Into<String>) {
        self.slots.clear();
        self.selected_slot_start = None;
        self.day_error = Some(message.into());
    }

    /// Selects a slot if it belongs to the loaded day.
    pub fn select_slot(&mut self, start: DateTime<Utc>) -> bool {
        if !self.slots.iter().any(|slot| slot.start_at_utc == start) {
            return false;
        }
        self.selected_slot_start = Some(start);
        self.form_error = None;
        true
    }

    /// `schedule` → `details`, only with a slot chosen.
    pub fn continue_to_details(&mut self) -> bool {
        if self.step != BookingStep::Schedule || self.selected_slot().is_none() {
            return false;
        }
        self.step = BookingStep::Details;
        true
    }

    /// `details` → `schedule`.
    pub fn back_to_schedule(&mut self) -> bool {
        if self.step != BookingStep::Details {
            return false;
        }
        self.step = BookingStep::Schedule;
        self.form_error = None;
        true
    }

    /// Edits the details form.
    pub fn update_form(&mut self, edit: impl FnOnce(&mut BookingForm)) {
        edit(&mut self.form);
        self.form_error = None;
    }

    pub fn set_status_text(&mut self, text: Option<String>) {
        self.status_text = text;
    }

    /// Records a next-available hint unless one is already known.
    pub fn offer_hint(&mut self, date: NaiveDate) -> bool {
        if self.next_available_hint.is_some() {
            return false;
        }
        self.next_available_hint = Some(date);
        true
    }

    // ----- month prefetch -----

    /// Starts a prefetch of the visible month.
    ///
    /// Assigns a fresh run id, marks unknown days of the month unavailable
    /// as a placeholder, and returns the run's private map copy. Returns
    /// `None` when no service is selected.
    pub fn begin_prefetch(&mut self, loading_text: &str) -> Option<PrefetchStart> {
        let service_id = self.service_id.clone()?;
        self.supersede_runs();

        let days = month_days(self.current_month);
        for day in &days {
            self.availability
                .entry(*day)
                .and_modify(|status| {
                    if *status == DayStatus::Unknown {
                        *status = DayStatus::Unavailable;
                    }
                })
                .or_insert(DayStatus::Unavailable);
        }
        self.status_text = Some(loading_text.to_string());
        self.resolved_days.clear();

        let map = days.iter().map(|day| (*day, self.day_status(*day))).collect();
        Some(PrefetchStart {
            run_id: self.active_run,
            service_id,
            timezone: self.timezone.clone(),
            days,
            map,
        })
    }

    /// Returns true if `run_id` is still the active prefetch.
    pub fn is_current_run(&self, run_id: u64) -> bool {
        self.active_run == run_id
    }

    /// Commits a finished run if it has not been superseded.
    ///
    /// Only the run's own days are merged. Days a direct lookup answered
    /// while the run was in flight keep that answer.
    pub fn commit_prefetch(
        &mut self,
        run_id: u64,
        map: BTreeMap<NaiveDate, DayStatus>,
        best_next: Option<NaiveDate>,
    ) -> bool {
        if !self.is_current_run(run_id) {
            return false;
        }
        for (day, status) in map {
            if !self.resolved_days.contains(&day) {
                self.availability.insert(day, status);
            }
        }
        if let Some(date) = best_next {
            self.offer_hint(date);
        }
        self.status_text = None;
        true
    }

    // ----- submission -----

    pub fn set_form_error(&mut self, message: impl Into<String>) {
        self.form_error = Some(message.into());
    }

    pub fn begin_submit(&mut self) {
        self.submitting = true;
        self.form_error = None;
    }

    pub fn fail_submit(&mut self, message: impl Into<String>) {
        self.submitting = false;
        self.form_error = Some(message.into());
    }

    /// Stores the confirmation and enters the terminal step.
    pub fn confirm(&mut self, record: ConfirmationRecord) {
        self.submitting = false;
        self.form_error = None;
        self.confirmation = Some(record);
        self.step = BookingStep::Confirmed;
    }
}
