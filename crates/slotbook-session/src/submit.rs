//! Booking submission.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use slotbook_api::BookingBackend;
use slotbook_core::{
    BookingAnswer, BookingConfirmation, BookingRequest, CalendarEvent, Page, PageConfig,
    add_event_url, ics_data_uri,
};
use tracing::{info, warn};

use crate::error::{FlowError, FlowResult, ValidationError};
use crate::render::Renderer;
use crate::session::{BookingSession, BookingStep, ConfirmationRecord, SharedSession};

/// A validated request plus what the confirmation needs from the session.
#[derive(Debug, Clone)]
struct PreparedBooking {
    request: BookingRequest,
    time_label: String,
    notes: String,
}

/// Checks the session is ready to submit. The first failing check wins;
/// being on the details step is checked last.
pub fn validate(session: &BookingSession, config: &PageConfig) -> Result<(), ValidationError> {
    prepare(session, config, "").map(|_| ())
}

fn prepare(
    session: &BookingSession,
    config: &PageConfig,
    page_slug: &str,
) -> Result<PreparedBooking, ValidationError> {
    let service_id = session
        .service_id()
        .ok_or(ValidationError::ServiceRequired)?;
    let (date, slot) = session
        .selected_date()
        .zip(session.selected_slot())
        .ok_or(ValidationError::SlotRequired)?;

    let form = session.form();
    let name = form.name.trim();
    let email = form.email.trim();
    if name.is_empty() || email.is_empty() {
        return Err(ValidationError::ContactRequired);
    }
    let phone = form.phone.trim();
    if config.phone_required() && phone.is_empty() {
        return Err(ValidationError::PhoneRequired);
    }

    if session.step() != BookingStep::Details {
        return Err(ValidationError::DetailsRequired);
    }

    let answers = config
        .custom_questions()
        .iter()
        .filter_map(|question| {
            let answer = form.answers.get(&question.id)?.trim();
            (!answer.is_empty()).then(|| BookingAnswer {
                question_id: question.id.clone(),
                label: question.label.clone(),
                answer: answer.to_string(),
            })
        })
        .collect();

    let notes = form.notes.trim().to_string();
    Ok(PreparedBooking {
        request: BookingRequest {
            page_slug: page_slug.to_string(),
            service_id: service_id.to_string(),
            date,
            timezone: session.timezone().to_string(),
            start_at_utc: slot.start_at_utc,
            slot_token: slot.token.clone(),
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            notes: notes.clone(),
            answers,
        },
        time_label: slot.label().to_string(),
        notes,
    })
}

/// Submits bookings and builds the confirmation artifacts.
#[derive(Clone)]
pub struct BookingSubmitter {
    backend: Arc<dyn BookingBackend>,
    page: Page,
    config: PageConfig,
    renderer: Arc<dyn Renderer>,
}

impl BookingSubmitter {
    pub fn new(
        backend: Arc<dyn BookingBackend>,
        page: Page,
        config: PageConfig,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            backend,
            page,
            config,
            renderer,
        }
    }

    /// Validates, submits, and on success moves the session to `confirmed`.
    ///
    /// Only a session on the details step is submitted, and only once.
    /// Validation failures never reach the network. Backend failures leave
    /// the session on the details step with the server's message.
    pub async fn submit(&self, session: &SharedSession) -> FlowResult<ConfirmationRecord> {
        let prepared = {
            let mut session = session.write().await;
            if session.is_submitting() {
                return Err(FlowError::AlreadySubmitting);
            }
            if session.step() == BookingStep::Confirmed {
                return Err(FlowError::AlreadyConfirmed);
            }
            match prepare(&session, &self.config, &self.page.slug) {
                Ok(prepared) => {
                    session.begin_submit();
                    self.renderer.render(&session);
                    prepared
                }
                Err(err) => {
                    session.set_form_error(err.to_string());
                    self.renderer.render(&session);
                    return Err(err.into());
                }
            }
        };

        let result = self.backend.create_booking(prepared.request.clone()).await;

        let mut session = session.write().await;
        match result {
            Ok(confirmation) => {
                let record = self.confirmation_record(&prepared, &confirmation, Utc::now());
                info!(
                    booking_id = %confirmation.booking.id,
                    service_id = %prepared.request.service_id,
                    "Booking confirmed"
                );
                session.confirm(record.clone());
                self.renderer.render(&session);
                Ok(record)
            }
            Err(err) => {
                warn!(error = %err, service_id = %prepared.request.service_id, "Booking submission failed");
                session.fail_submit(err.message());
                self.renderer.render(&session);
                Err(err.into())
            }
        }
    }

    fn confirmation_record(
        &self,
        prepared: &PreparedBooking,
        confirmation: &BookingConfirmation,
        stamp: DateTime<Utc>,
    ) -> ConfirmationRecord {
        let booking = &confirmation.booking;
        let service = confirmation.service.title.as_str();
        let page_title = if confirmation.page.title.is_empty() {
            self.page.title.as_str()
        } else {
            confirmation.page.title.as_str()
        };
        let meeting_link = booking
            .meeting_link
            .as_deref()
            .map(str::trim)
            .filter(|link| !link.is_empty());

        let title = if page_title.is_empty() {
            service.to_string()
        } else {
            format!("{} with {}", service, page_title)
        };

        let mut description = vec![format!("Booking reference: {}", booking.id)];
        if !prepared.notes.is_empty() {
            description.push(format!("Notes: {}", prepared.notes));
        }
        if let Some(link) = meeting_link {
            description.push(format!("Join: {}", link));
        }

        let event = CalendarEvent::new(&booking.id, title, booking.start_at_utc, booking.end_at_utc)
            .with_description(description.join("\n"))
            .with_meeting_link(meeting_link);

        let request = &prepared.request;
        ConfirmationRecord {
            summary_text: format!(
                "{} on {} at {} ({})",
                service,
                request.date.format("%A, %B %-d, %Y"),
                prepared.time_label,
                request.timezone
            ),
            meeting_link: meeting_link.map(str::to_string),
            calendar_url: add_event_url(&event),
            calendar_file_uri: ics_data_uri(&event, stamp),
        }
    }
}
