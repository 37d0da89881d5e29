//! The booking flow for one page visit.
//!
//! [`BookingFlow`] owns the shared session and wires the cache, fetcher,
//! prefetcher, selector, navigator and submitter together. Every visitor
//! action is one async method; each renders the session after it changes.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use slotbook_api::BookingBackend;
use slotbook_core::{Page, PageBundle, Service, month_days, shift_month};
use tracing::{debug, info};

use crate::cache::new_shared_cache;
use crate::config::FlowConfig;
use crate::error::{FlowError, FlowResult};
use crate::fetcher::DayAvailabilityFetcher;
use crate::navigator::NextAvailableNavigator;
use crate::prefetch::{MonthPrefetcher, PrefetchOutcome};
use crate::render::Renderer;
use crate::select::{DateSelector, DaySelection};
use crate::session::{BookingForm, BookingSession, ConfirmationRecord, SharedSession, new_shared_session};
use crate::submit::BookingSubmitter;

/// Booking flow bound to one page.
#[derive(Clone)]
pub struct BookingFlow {
    bundle: Arc<PageBundle>,
    services: Arc<Vec<Service>>,
    config: Arc<FlowConfig>,
    session: SharedSession,
    fetcher: DayAvailabilityFetcher,
    prefetcher: MonthPrefetcher,
    selector: DateSelector,
    navigator: NextAvailableNavigator,
    submitter: BookingSubmitter,
    renderer: Arc<dyn Renderer>,
}

impl BookingFlow {
    /// Loads the page and starts a session.
    pub async fn load(
        backend: Arc<dyn BookingBackend>,
        slug: &str,
        config: FlowConfig,
        renderer: Arc<dyn Renderer>,
    ) -> FlowResult<Self> {
        let bundle = backend.load_page(slug.to_string()).await?;
        Self::from_bundle(backend, bundle, config, renderer)
    }

    /// Starts a session for an already loaded page.
    ///
    /// Fails with [`FlowError::NoServices`] when the page offers nothing
    /// bookable after applying its service list.
    pub fn from_bundle(
        backend: Arc<dyn BookingBackend>,
        bundle: PageBundle,
        config: FlowConfig,
        renderer: Arc<dyn Renderer>,
    ) -> FlowResult<Self> {
        let services = bundle.selectable_services();
        if services.is_empty() {
            return Err(FlowError::no_services(&bundle.page.slug));
        }
        info!(
            slug = %bundle.page.slug,
            backend = backend.name(),
            services = services.len(),
            "Booking page loaded"
        );

        let session = BookingSession::new(&config.default_timezone, config.start_month());
        renderer.render(&session);

        let fetcher = DayAvailabilityFetcher::new(backend.clone(), new_shared_cache(), &bundle.page.slug);
        let prefetcher = MonthPrefetcher::new(fetcher.clone(), renderer.clone(), &config);
        let selector = DateSelector::new(fetcher.clone(), renderer.clone());
        let navigator = NextAvailableNavigator::new(prefetcher.clone(), selector.clone());
        let submitter = BookingSubmitter::new(
            backend,
            bundle.page.clone(),
            bundle.config.clone(),
            renderer.clone(),
        );

        Ok(Self {
            bundle: Arc::new(bundle),
            services: Arc::new(services),
            config: Arc::new(config),
            session: new_shared_session(session),
            fetcher,
            prefetcher,
            selector,
            navigator,
            submitter,
            renderer,
        })
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// Copy of the current session state.
    pub async fn snapshot(&self) -> BookingSession {
        self.session.read().await.clone()
    }

    pub fn page(&self) -> &Page {
        &self.bundle.page
    }

    pub fn bundle(&self) -> &PageBundle {
        &self.bundle
    }

    /// Services the visitor may choose from.
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn service(&self, service_id: &str) -> Option<&Service> {
        self.services.iter().find(|service| service.id == service_id)
    }

    /// Selects a service, prefetches the month and picks a first date.
    pub async fn select_service(&self, service_id: &str) -> FlowResult<()> {
        if self.service(service_id).is_none() {
            return Err(FlowError::UnknownService(service_id.to_string()));
        }
        {
            let mut session = self.session.write().await;
            if !session.choose_service(service_id) {
                debug!(service_id, step = session.step().as_str(), "Service change ignored");
                return Ok(());
            }
            self.renderer.render(&session);
        }
        self.bootstrap_schedule().await;
        Ok(())
    }

    /// Switches timezone and repeats the schedule bootstrap.
    pub async fn change_timezone(&self, timezone: &str) {
        let has_service = {
            let mut session = self.session.write().await;
            session.change_timezone(timezone);
            self.renderer.render(&session);
            session.service_id().is_some()
        };
        if has_service {
            self.bootstrap_schedule().await;
        }
    }

    /// Moves the visible month by `delta` and prefetches it.
    pub async fn change_month(&self, delta: i32) -> PrefetchOutcome {
        {
            let mut session = self.session.write().await;
            let month = shift_month(session.current_month(), delta);
            session.set_month(month);
            self.renderer.render(&session);
        }
        self.prefetcher.prefetch_month(&self.session).await
    }

    /// Shows a specific month (any day within it) and prefetches it.
    pub async fn show_month(&self, month: NaiveDate) -> PrefetchOutcome {
        {
            let mut session = self.session.write().await;
            session.set_month(month);
            self.renderer.render(&session);
        }
        self.prefetcher.prefetch_month(&self.session).await
    }

    pub async fn select_date(&self, date: NaiveDate) -> DaySelection {
        self.selector.select_date(&self.session, date).await
    }

    /// Selects a slot of the loaded day; unknown slots are ignored.
    pub async fn select_slot(&self, start: DateTime<Utc>) -> bool {
        let mut session = self.session.write().await;
        let selected = session.select_slot(start);
        if selected {
            self.renderer.render(&session);
        }
        selected
    }

    pub async fn continue_to_details(&self) -> bool {
        let mut session = self.session.write().await;
        let moved = session.continue_to_details();
        if moved {
            self.renderer.render(&session);
        }
        moved
    }

    pub async fn back_to_schedule(&self) -> bool {
        let mut session = self.session.write().await;
        let moved = session.back_to_schedule();
        if moved {
            self.renderer.render(&session);
        }
        moved
    }

    pub async fn update_form(&self, edit: impl FnOnce(&mut BookingForm)) {
        let mut session = self.session.write().await;
        session.update_form(edit);
        self.renderer.render(&session);
    }

    pub async fn submit(&self) -> FlowResult<ConfirmationRecord> {
        self.submitter.submit(&self.session).await
    }

    async fn bootstrap_schedule(&self) {
        if self.prefetcher.prefetch_month(&self.session).await.is_committed() {
            self.ensure_selected_date().await;
        }
    }

    /// Selects the earliest open day of the month, or jumps to the next one.
    async fn ensure_selected_date(&self) {
        let (first_open, hint, run_id, service_id, timezone, month) = {
            let session = self.session.read().await;
            let Some(service_id) = session.service_id() else {
                return;
            };
            (
                session.first_available_day(),
                session.next_available_hint(),
                session.active_run(),
                service_id.to_string(),
                session.timezone().to_string(),
                session.current_month(),
            )
        };

        if let Some(date) = first_open {
            self.selector.select_date_in_run(&self.session, date, run_id).await;
            return;
        }

        if hint.is_none() {
            // Ask the backend once for a date beyond this month.
            let last_day = month_days(month).last().copied().unwrap_or(month);
            if let Ok(day) = self.fetcher.fetch_day(&service_id, last_day, &timezone).await
                && let Some(next) = day.next_available
            {
                let mut session = self.session.write().await;
                if session.is_current_run(run_id) {
                    session.offer_hint(next);
                }
            }
        }

        if self.navigator.jump_to_next_available(&self.session).await.is_some() {
            return;
        }

        let mut session = self.session.write().await;
        if session.is_current_run(run_id) {
            session.set_status_text(Some(self.config.empty_text.clone()));
            self.renderer.render(&session);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use slotbook_core::{
        DayAvailability, DetailsFormSection, PageConfig, PageSection, ServiceListSection,
    };

    use crate::error::ValidationError;
    use crate::session::{BookingStep, DayStatus};
    use crate::testing::{
        RecordingRenderer, ScriptedBackend, bundle, july, june, open_day, slot,
    };

    fn config() -> FlowConfig {
        FlowConfig::default().with_initial_month(june(1))
    }

    async fn flow(backend: ScriptedBackend) -> (Arc<ScriptedBackend>, Arc<RecordingRenderer>, BookingFlow) {
        let backend = Arc::new(backend);
        let renderer = Arc::new(RecordingRenderer::default());
        let flow = BookingFlow::load(backend.clone(), "studio", config(), renderer.clone())
            .await
            .unwrap();
        (backend, renderer, flow)
    }

    #[tokio::test]
    async fn books_a_consultation() {
        let (backend, _, flow) =
            flow(ScriptedBackend::new().with_day("svc-1", june(10), open_day(june(10)))).await;

        flow.select_service("svc-1").await.unwrap();
        let session = flow.snapshot().await;
        assert_eq!(session.step(), BookingStep::Schedule);
        assert_eq!(session.selected_date(), Some(june(10)));
        assert_eq!(
            session.slots().iter().map(|slot| slot.label()).collect::<Vec<_>>(),
            ["09:00", "09:30"]
        );

        assert!(flow.select_slot(slot(june(10), 9, 0).start_at_utc).await);
        assert!(flow.continue_to_details().await);
        flow.update_form(|form| {
            form.name = "Alex".to_string();
            form.email = "alex@example.com".to_string();
        })
        .await;

        let record = flow.submit().await.unwrap();
        assert!(record.calendar_url.contains("dates=20250610T090000Z%2F"));

        let session = flow.snapshot().await;
        assert_eq!(session.step(), BookingStep::Confirmed);
        assert!(!session.is_submitting());

        let requests = backend.booking_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].slot_token, "tok-2025-06-10-0900");
        assert_eq!(requests[0].timezone, "UTC");
    }

    #[tokio::test]
    async fn submit_without_date() {
        let (backend, _, flow) = flow(ScriptedBackend::new()).await;
        flow.select_service("svc-1").await.unwrap();
        flow.update_form(|form| {
            form.name = "Alex".to_string();
            form.email = "alex@example.com".to_string();
        })
        .await;

        let err = flow.submit().await.unwrap_err();
        assert!(matches!(err, FlowError::Validation(ValidationError::SlotRequired)));

        let session = flow.snapshot().await;
        assert_eq!(session.form_error(), Some("Please select a valid time slot first."));
        assert!(!session.is_submitting());
        assert!(backend.booking_requests().is_empty());
    }

    #[tokio::test]
    async fn submit_skipping_details_and_resubmit_are_rejected() {
        let (backend, _, flow) =
            flow(ScriptedBackend::new().with_day("svc-1", june(10), open_day(june(10)))).await;
        flow.select_service("svc-1").await.unwrap();
        flow.select_slot(slot(june(10), 9, 0).start_at_utc).await;
        flow.update_form(|form| {
            form.name = "Alex".to_string();
            form.email = "alex@example.com".to_string();
        })
        .await;

        let err = flow.submit().await.unwrap_err();
        assert_eq!(err.user_message(), "Please review your details before booking.");
        assert_eq!(flow.snapshot().await.step(), BookingStep::Schedule);
        assert!(backend.booking_requests().is_empty());

        assert!(flow.continue_to_details().await);
        flow.submit().await.unwrap();
        let err = flow.submit().await.unwrap_err();
        assert!(matches!(err, FlowError::AlreadyConfirmed));
        assert_eq!(backend.booking_requests().len(), 1);
    }

    #[tokio::test]
    async fn submit_without_service() {
        let (_, _, flow) = flow(ScriptedBackend::new()).await;
        let err = flow.submit().await.unwrap_err();
        assert_eq!(err.user_message(), "Please choose a service.");
    }

    #[tokio::test]
    async fn rejected_booking_stays_on_details() {
        let backend = ScriptedBackend::new()
            .with_day("svc-1", june(10), open_day(june(10)))
            .with_booking_error("That time was just taken.");
        let (_, _, flow) = flow(backend).await;

        flow.select_service("svc-1").await.unwrap();
        flow.select_slot(slot(june(10), 9, 30).start_at_utc).await;
        flow.continue_to_details().await;
        flow.update_form(|form| {
            form.name = "Alex".to_string();
            form.email = "alex@example.com".to_string();
        })
        .await;

        let err = flow.submit().await.unwrap_err();
        assert_eq!(err.user_message(), "That time was just taken.");

        let session = flow.snapshot().await;
        assert_eq!(session.step(), BookingStep::Details);
        assert_eq!(session.form_error(), Some("That time was just taken."));
        assert!(!session.is_submitting());
        assert!(session.confirmation().is_none());
    }

    #[tokio::test]
    async fn empty_month_jumps_to_hint() {
        let backend = ScriptedBackend::new()
            .with_day(
                "svc-1",
                june(30),
                DayAvailability::default().with_next_available(july(14)),
            )
            .with_day("svc-1", july(14), open_day(july(14)));
        let (_, _, flow) = flow(backend).await;

        flow.select_service("svc-1").await.unwrap();

        let session = flow.snapshot().await;
        assert_eq!(session.current_month(), july(1));
        assert_eq!(session.selected_date(), Some(july(14)));
        assert_eq!(session.slots().len(), 2);
        assert_eq!(session.day_status(july(14)), DayStatus::Available);
        assert!(session.status_text().is_none());
    }

    #[tokio::test]
    async fn nothing_open_shows_empty_text() {
        let (_, _, flow) = flow(ScriptedBackend::new()).await;

        flow.select_service("svc-1").await.unwrap();

        let session = flow.snapshot().await;
        assert_eq!(session.current_month(), june(1));
        assert!(session.selected_date().is_none());
        assert_eq!(session.status_text(), Some("No open times found."));
    }

    #[tokio::test]
    async fn month_navigation_keeps_selection_and_uses_cache() {
        let (backend, _, flow) =
            flow(ScriptedBackend::new().with_day("svc-1", june(10), open_day(june(10)))).await;
        flow.select_service("svc-1").await.unwrap();
        let calls = backend.day_calls();

        assert!(flow.change_month(1).await.is_committed());
        assert!(flow.change_month(-1).await.is_committed());

        let session = flow.snapshot().await;
        assert_eq!(session.current_month(), june(1));
        assert_eq!(session.selected_date(), Some(june(10)));
        assert_eq!(backend.day_calls(), calls + 31);
        assert_eq!(backend.calls_for(june(10)), 1);
    }

    #[tokio::test]
    async fn timezone_change_refetches() {
        let (backend, _, flow) =
            flow(ScriptedBackend::new().with_day("svc-1", june(10), open_day(june(10)))).await;
        flow.select_service("svc-1").await.unwrap();
        assert_eq!(backend.calls_for(june(10)), 1);

        flow.change_timezone("Asia/Tokyo").await;

        let session = flow.snapshot().await;
        assert_eq!(session.timezone(), "Asia/Tokyo");
        assert_eq!(session.selected_date(), Some(june(10)));
        assert_eq!(backend.calls_for(june(10)), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn month_switch_during_prefetch_wins() {
        let mut backend = ScriptedBackend::new()
            .with_day("svc-1", june(20), open_day(june(20)))
            .with_day("svc-1", july(8), open_day(july(8)));
        for day in month_days(june(1)) {
            backend = backend.with_delay(day, Duration::from_millis(80));
        }
        let (_, _, flow) = flow(backend).await;

        let ((), outcome) = tokio::join!(
            async { flow.select_service("svc-1").await.unwrap() },
            async {
                tokio::time::sleep(Duration::from_millis(1)).await;
                flow.change_month(1).await
            }
        );

        assert!(outcome.is_committed());
        let session = flow.snapshot().await;
        assert_eq!(session.current_month(), july(1));
        assert_eq!(session.day_status(july(8)), DayStatus::Available);
        assert_eq!(session.day_status(june(20)), DayStatus::Unavailable);
        assert!(session.selected_date().is_none());
    }

    #[tokio::test]
    async fn service_list_restricts_choices() {
        let mut bundle = bundle();
        bundle.config.sections.push(PageSection::ServiceList(ServiceListSection {
            selected_service_ids: vec!["svc-2".to_string()],
        }));
        let (_, _, flow) = flow(ScriptedBackend::new().with_bundle(bundle)).await;

        assert_eq!(flow.services().len(), 1);
        assert_eq!(flow.services()[0].id, "svc-2");

        let err = flow.select_service("svc-1").await.unwrap_err();
        assert!(matches!(err, FlowError::UnknownService(id) if id == "svc-1"));
        assert!(flow.snapshot().await.service_id().is_none());
    }

    #[tokio::test]
    async fn page_without_services_fails() {
        let mut bundle = bundle();
        bundle.services.clear();
        let backend = Arc::new(ScriptedBackend::new().with_bundle(bundle));

        let err = BookingFlow::load(backend, "studio", config(), Arc::new(RecordingRenderer::default()))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, FlowError::NoServices { slug } if slug == "studio"));
    }

    #[tokio::test]
    async fn unknown_page_fails() {
        let backend = Arc::new(ScriptedBackend::new());
        let err = BookingFlow::load(backend, "nope", config(), Arc::new(RecordingRenderer::default()))
            .await
            .err()
            .unwrap();
        assert_eq!(err.user_message(), "Page not found.");
    }

    #[tokio::test]
    async fn required_phone_blocks_submission() {
        let mut bundle = bundle();
        bundle.config = PageConfig {
            sections: vec![PageSection::DetailsForm(DetailsFormSection {
                phone_required: true,
                custom_questions: Vec::new(),
            })],
        };
        let backend = ScriptedBackend::new()
            .with_bundle(bundle)
            .with_day("svc-1", june(10), open_day(june(10)));
        let (backend, _, flow) = flow(backend).await;

        flow.select_service("svc-1").await.unwrap();
        flow.select_slot(slot(june(10), 9, 0).start_at_utc).await;
        flow.continue_to_details().await;
        flow.update_form(|form| {
            form.name = "Alex".to_string();
            form.email = "alex@example.com".to_string();
        })
        .await;

        let err = flow.submit().await.unwrap_err();
        assert_eq!(err.user_message(), "Phone number is required.");
        assert!(backend.booking_requests().is_empty());

        flow.update_form(|form| form.phone = "+1 555 0100".to_string()).await;
        assert!(flow.snapshot().await.form_error().is_none());
        flow.submit().await.unwrap();
        assert_eq!(backend.booking_requests()[0].phone, "+1 555 0100");
    }

    #[tokio::test]
    async fn service_change_locked_on_details() {
        let (_, _, flow) =
            flow(ScriptedBackend::new().with_day("svc-1", june(10), open_day(june(10)))).await;
        flow.select_service("svc-1").await.unwrap();
        flow.select_slot(slot(june(10), 9, 0).start_at_utc).await;
        flow.continue_to_details().await;

        flow.select_service("svc-2").await.unwrap();
        let session = flow.snapshot().await;
        assert_eq!(session.service_id(), Some("svc-1"));
        assert_eq!(session.step(), BookingStep::Details);

        assert!(flow.back_to_schedule().await);
        flow.select_service("svc-2").await.unwrap();
        assert_eq!(flow.snapshot().await.service_id(), Some("svc-2"));
    }

    #[tokio::test]
    async fn session_state_snapshot() {
        let (_, renderer, flow) =
            flow(ScriptedBackend::new().with_day("svc-1", june(10), open_day(june(10)))).await;
        flow.select_service("svc-1").await.unwrap();
        flow.select_slot(slot(june(10), 9, 30).start_at_utc).await;
        assert!(!renderer.frames().is_empty());

        let session = flow.snapshot().await;
        let available = session
            .availability()
            .iter()
            .filter(|(_, status)| **status == DayStatus::Available)
            .map(|(date, _)| date.to_string())
            .collect::<Vec<_>>();
        insta::assert_json_snapshot!(serde_json::json!({
            "step": session.step(),
            "serviceId": session.service_id(),
            "selectedDate": session.selected_date(),
            "selectedSlotStart": session.selected_slot_start(),
            "availableDays": available,
            "slotCount": session.slots().len(),
        }), @r#"
        {
          "availableDays": [
            "2025-06-10"
          ],
          "selectedDate": "2025-06-10",
          "selectedSlotStart": "2025-06-10T09:30:00Z",
          "serviceId": "svc-1",
          "slotCount": 2,
          "step": "schedule"
        }
        "#);
    }
}
