//! Jumping to the next available day suggested by the backend.

use chrono::NaiveDate;
use tracing::debug;

use crate::prefetch::{MonthPrefetcher, PrefetchOutcome};
use crate::select::{DateSelector, DaySelection};
use crate::session::SharedSession;

/// Follows the backend's next-available hint into a later month.
#[derive(Clone)]
pub struct NextAvailableNavigator {
    prefetcher: MonthPrefetcher,
    selector: DateSelector,
}

impl NextAvailableNavigator {
    pub fn new(prefetcher: MonthPrefetcher, selector: DateSelector) -> Self {
        Self {
            prefetcher,
            selector,
        }
    }

    /// Moves to the hinted date's month and selects it.
    ///
    /// Makes a single hop: if the hinted day turns out to be empty, no
    /// further hint is followed. Returns the date jumped to, or `None` when
    /// there was no hint or the visitor moved on before the jump landed.
    pub async fn jump_to_next_available(&self, session: &SharedSession) -> Option<NaiveDate> {
        let target = {
            let mut session = session.write().await;
            let target = session.next_available_hint()?;
            session.set_month(target);
            target
        };
        debug!(%target, "Jumping to next available day");

        let PrefetchOutcome::Committed { run_id, .. } = self.prefetcher.prefetch_month(session).await
        else {
            debug!(%target, "Next available jump superseded");
            return None;
        };
        match self.selector.select_date_in_run(session, target, run_id).await {
            DaySelection::Stale | DaySelection::Ignored => None,
            _ => Some(target),
        }
    }
}
