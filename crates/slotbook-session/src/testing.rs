//! In-memory backend and fixtures for session tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};
use slotbook_api::{ApiError, ApiResult, AvailabilityQuery, BookingBackend, BoxFuture};
use slotbook_core::{
    BookingConfirmation, BookingRecord, BookingRequest, CustomQuestion, DayAvailability, DaySlot,
    DetailsFormSection, LocalStamp, Page, PageBundle, PageConfig, PageSection, Service,
};

use crate::render::Renderer;
use crate::session::BookingSession;

pub(crate) fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub(crate) fn june(d: u32) -> NaiveDate {
    day(2025, 6, d)
}

pub(crate) fn july(d: u32) -> NaiveDate {
    day(2025, 7, d)
}

/// A 30 minute slot starting at `hour:minute` UTC.
pub(crate) fn slot(date: NaiveDate, hour: u32, minute: u32) -> DaySlot {
    let start = Utc
        .from_utc_datetime(&date.and_hms_opt(hour, minute, 0).unwrap());
    let end = start + chrono::Duration::minutes(30);
    DaySlot {
        start_at_utc: start,
        end_at_utc: end,
        token: format!("tok-{}-{:02}{:02}", date, hour, minute),
        start_local: LocalStamp {
            date,
            time: start.format("%H:%M").to_string(),
        },
        end_local: LocalStamp {
            date,
            time: end.format("%H:%M").to_string(),
        },
    }
}

pub(crate) fn open_day(date: NaiveDate) -> DayAvailability {
    DayAvailability::new(vec![slot(date, 9, 0), slot(date, 9, 30)])
}

pub(crate) fn bundle() -> PageBundle {
    PageBundle {
        page: Page {
            slug: "studio".to_string(),
            title: "Studio North".to_string(),
            timezone: None,
        },
        config: PageConfig {
            sections: vec![PageSection::DetailsForm(DetailsFormSection {
                phone_required: false,
                custom_questions: vec![
                    CustomQuestion {
                        id: "q1".to_string(),
                        label: "What should we cover?".to_string(),
                    },
                    CustomQuestion {
                        id: "q2".to_string(),
                        label: "How did you hear about us?".to_string(),
                    },
                ],
            })],
        },
        services: vec![
            Service {
                id: "svc-1".to_string(),
                title: "Consultation".to_string(),
                duration_minutes: Some(30),
                description: None,
            },
            Service {
                id: "svc-2".to_string(),
                title: "Follow-up".to_string(),
                duration_minutes: Some(30),
                description: None,
            },
        ],
    }
}

#[derive(Debug, Clone)]
enum Script {
    Day(DayAvailability),
    Fail(String),
}

/// Backend answering from a script, with optional per-day latency.
pub(crate) struct ScriptedBackend {
    bundle: PageBundle,
    days: HashMap<(String, NaiveDate), Script>,
    fallback: Script,
    delays: HashMap<NaiveDate, Duration>,
    default_delay: Duration,
    booking_error: Option<String>,
    meeting_link: Option<String>,
    first_failures: Mutex<HashMap<NaiveDate, String>>,
    day_calls: Mutex<Vec<AvailabilityQuery>>,
    booking_requests: Mutex<Vec<BookingRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Self {
        Self {
            bundle: bundle(),
            days: HashMap::new(),
            fallback: Script::Day(DayAvailability::default()),
            delays: HashMap::new(),
            default_delay: Duration::ZERO,
            booking_error: None,
            meeting_link: None,
            first_failures: Mutex::new(HashMap::new()),
            day_calls: Mutex::new(Vec::new()),
            booking_requests: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_bundle(mut self, bundle: PageBundle) -> Self {
        self.bundle = bundle;
        self
    }

    pub(crate) fn with_day(mut self, service_id: &str, date: NaiveDate, day: DayAvailability) -> Self {
        self.days
            .insert((service_id.to_string(), date), Script::Day(day));
        self
    }

    pub(crate) fn with_day_failure(mut self, service_id: &str, date: NaiveDate, message: &str) -> Self {
        self.days
            .insert((service_id.to_string(), date), Script::Fail(message.to_string()));
        self
    }

    /// Unscripted days fail instead of answering with no slots.
    pub(crate) fn failing_by_default(mut self) -> Self {
        self.fallback = Script::Fail("connection reset".to_string());
        self
    }

    /// The first lookup of `date` fails; later ones follow the script.
    pub(crate) fn with_first_failure(self, date: NaiveDate, message: &str) -> Self {
        self.first_failures
            .lock()
            .unwrap()
            .insert(date, message.to_string());
        self
    }

    pub(crate) fn with_delay(mut self, date: NaiveDate, delay: Duration) -> Self {
        self.delays.insert(date, delay);
        self
    }

    pub(crate) fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub(crate) fn with_booking_error(mut self, message: &str) -> Self {
        self.booking_error = Some(message.to_string());
        self
    }

    pub(crate) fn with_meeting_link(mut self, link: &str) -> Self {
        self.meeting_link = Some(link.to_string());
        self
    }

    pub(crate) fn day_calls(&self) -> usize {
        self.day_calls.lock().unwrap().len()
    }

    pub(crate) fn calls_for(&self, date: NaiveDate) -> usize {
        self.day_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|query| query.date == date)
            .count()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn booking_requests(&self) -> Vec<BookingRequest> {
        self.booking_requests.lock().unwrap().clone()
    }
}

impl BookingBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn load_page(&self, slug: String) -> BoxFuture<'_, ApiResult<PageBundle>> {
        Box::pin(async move {
            if self.bundle.page.slug == slug {
                Ok(self.bundle.clone())
            } else {
                Err(ApiError::not_found("Page not found."))
            }
        })
    }

    fn day_availability(
        &self,
        query: AvailabilityQuery,
    ) -> BoxFuture<'_, ApiResult<DayAvailability>> {
        Box::pin(async move {
            self.day_calls.lock().unwrap().push(query.clone());
            let fail_once = self.first_failures.lock().unwrap().remove(&query.date);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let delay = self
                .delays
                .get(&query.date)
                .copied()
                .unwrap_or(self.default_delay);
            if delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if let Some(message) = fail_once {
                return Err(ApiError::network(message));
            }
            match self
                .days
                .get(&(query.service_id.clone(), query.date))
                .unwrap_or(&self.fallback)
            {
                Script::Day(day) => Ok(day.clone()),
                Script::Fail(message) => Err(ApiError::network(message.clone())),
            }
        })
    }

    fn create_booking(
        &self,
        request: BookingRequest,
    ) -> BoxFuture<'_, ApiResult<BookingConfirmation>> {
        Box::pin(async move {
            self.booking_requests.lock().unwrap().push(request.clone());
            tokio::task::yield_now().await;

            if let Some(message) = &self.booking_error {
                return Err(ApiError::conflict(message.clone()));
            }
            let service = self
                .bundle
                .services
                .iter()
                .find(|service| service.id == request.service_id)
                .cloned()
                .ok_or_else(|| ApiError::not_found("Service not found."))?;

            Ok(BookingConfirmation {
                booking: BookingRecord {
                    id: "bk-1".to_string(),
                    status: "confirmed".to_string(),
                    start_at_utc: request.start_at_utc,
                    end_at_utc: request.start_at_utc + chrono::Duration::minutes(30),
                    meeting_link: self.meeting_link.clone(),
                },
                page: self.bundle.page.clone(),
                service,
            })
        })
    }
}

/// Renderer keeping a copy of every rendered session.
#[derive(Default)]
pub(crate) struct RecordingRenderer {
    frames: Mutex<Vec<BookingSession>>,
}

impl RecordingRenderer {
    pub(crate) fn frames(&self) -> Vec<BookingSession> {
        self.frames.lock().unwrap().clone()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&self, session: &BookingSession) {
        self.frames.lock().unwrap().push(session.clone());
    }
}
