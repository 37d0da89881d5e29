//! Direct date selection.

use std::sync::Arc;

use chrono::NaiveDate;
use slotbook_core::DaySlot;
use tracing::{debug, warn};

use crate::fetcher::DayAvailabilityFetcher;
use crate::render::Renderer;
use crate::session::SharedSession;

/// How a date selection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaySelection {
    /// Slots for the selected date were applied.
    Loaded { slots: Vec<DaySlot> },
    /// The lookup failed; the message is shown to the visitor.
    Failed(String),
    /// The visitor moved on before the lookup answered.
    Stale,
    /// No service is selected.
    Ignored,
}

/// Loads the slots of one day when the visitor picks it.
#[derive(Clone)]
pub struct DateSelector {
    fetcher: DayAvailabilityFetcher,
    renderer: Arc<dyn Renderer>,
}

impl DateSelector {
    pub fn new(fetcher: DayAvailabilityFetcher, renderer: Arc<dyn Renderer>) -> Self {
        Self { fetcher, renderer }
    }

    /// Selects `date` and loads its slots.
    ///
    /// The answer is only applied if the selected date, service and
    /// timezone are still the ones the lookup was made for.
    pub async fn select_date(&self, session: &SharedSession, date: NaiveDate) -> DaySelection {
        self.select(session, date, None).await
    }

    /// Like [`select_date`](Self::select_date), on behalf of a month
    /// prefetch run. Nothing is selected once `run_id` has been superseded.
    pub async fn select_date_in_run(
        &self,
        session: &SharedSession,
        date: NaiveDate,
        run_id: u64,
    ) -> DaySelection {
        self.select(session, date, Some(run_id)).await
    }

    async fn select(&self, session: &SharedSession, date: NaiveDate, run_id: Option<u64>) -> DaySelection {
        let (service_id, timezone) = {
            let mut session = session.write().await;
            let Some(service_id) = session.service_id().map(str::to_string) else {
                return DaySelection::Ignored;
            };
            if let Some(run_id) = run_id
                && !session.is_current_run(run_id)
            {
                debug!(%date, run_id, "Skipping selection for superseded run");
                return DaySelection::Stale;
            }
            session.begin_date_selection(date);
            self.renderer.render(&session);
            (service_id, session.timezone().to_string())
        };

        let result = self.fetcher.fetch_day(&service_id, date, &timezone).await;

        let mut session = session.write().await;
        let unchanged = session.selected_date() == Some(date)
            && session.service_id() == Some(service_id.as_str())
            && session.timezone() == timezone;
        if !unchanged {
            debug!(%date, service_id = %service_id, "Dropping stale day lookup");
            return DaySelection::Stale;
        }

        let outcome = match result {
            Ok(day) => {
                session.apply_day(date, &day);
                DaySelection::Loaded {
                    slots: day.slots.clone(),
                }
            }
            Err(err) => {
                warn!(%date, error = %err, "Failed to load day availability");
                session.fail_day(err.message());
                DaySelection::Failed(err.message().to_string())
            }
        };
        self.renderer.render(&session);
        outcome
    }
}
