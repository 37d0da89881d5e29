//! Month-wide availability prefetch.
//!
//! A prefetch checks every day of the visible month through a fixed pool of
//! workers that pull date keys from a shared queue. Workers are futures
//! polled together on the caller's task, not spawned threads.
//!
//! Each run captures a fresh run id from the session when it starts. Context
//! changes (service, month, timezone) bump that id, so a run that finishes
//! after being superseded drops its results instead of committing them.
//! In-flight requests are never cancelled; their effects are simply ignored.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use chrono::NaiveDate;
use futures_util::future::join_all;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::FlowConfig;
use crate::fetcher::DayAvailabilityFetcher;
use crate::render::Renderer;
use crate::session::{DayStatus, PrefetchStart, SharedSession};

/// How a prefetch run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefetchOutcome {
    /// Results were written to the session.
    Committed { run_id: u64, available_days: usize },
    /// A newer run started first; results were dropped.
    Superseded { run_id: u64 },
    /// No service selected, nothing to check.
    Skipped,
}

impl PrefetchOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }
}

/// Results accumulated by the workers of one run.
#[derive(Debug)]
struct RunResults {
    map: BTreeMap<NaiveDate, DayStatus>,
    best_next: Option<NaiveDate>,
}

impl RunResults {
    fn record(&mut self, date: NaiveDate, available: bool) {
        self.map.insert(date, DayStatus::from_available(available));
    }

    /// Keeps the earliest suggested date.
    fn offer(&mut self, candidate: NaiveDate) {
        if self.best_next.is_none_or(|best| candidate < best) {
            self.best_next = Some(candidate);
        }
    }

    fn available_days(&self, days: &[NaiveDate]) -> usize {
        days.iter()
            .filter(|day| self.map.get(day) == Some(&DayStatus::Available))
            .count()
    }
}

/// Fetches every day of the visible month with bounded concurrency.
#[derive(Clone)]
pub struct MonthPrefetcher {
    fetcher: DayAvailabilityFetcher,
    renderer: Arc<dyn Renderer>,
    workers: usize,
    loading_text: String,
}

impl MonthPrefetcher {
    pub fn new(fetcher: DayAvailabilityFetcher, renderer: Arc<dyn Renderer>, config: &FlowConfig) -> Self {
        Self {
            fetcher,
            renderer,
            workers: config.prefetch_workers.max(1),
            loading_text: config.loading_text.clone(),
        }
    }

    /// Prefetches the session's current month.
    pub async fn prefetch_month(&self, session: &SharedSession) -> PrefetchOutcome {
        let start = {
            let mut session = session.write().await;
            let Some(start) = session.begin_prefetch(&self.loading_text) else {
                return PrefetchOutcome::Skipped;
            };
            self.renderer.render(&session);
            start
        };

        let PrefetchStart {
            run_id,
            service_id,
            timezone,
            days,
            map,
        } = start;
        debug!(run_id, service_id = %service_id, month = %days[0], "Starting month prefetch");

        let queue = Mutex::new(days.iter().copied().collect::<VecDeque<_>>());
        let results = Mutex::new(RunResults {
            map,
            best_next: None,
        });

        let workers = (0..self.workers.min(days.len()))
            .map(|worker| self.drain(worker, &service_id, &timezone, &queue, &results));
        join_all(workers).await;

        let results = results.into_inner();
        let available_days = results.available_days(&days);
        let cached_days = self.fetcher.cache().read().await.len();

        let mut session = session.write().await;
        if !session.commit_prefetch(run_id, results.map, results.best_next) {
            debug!(
                run_id,
                active_run = session.active_run(),
                "Discarding superseded month prefetch"
            );
            return PrefetchOutcome::Superseded { run_id };
        }
        self.renderer.render(&session);

        info!(run_id, available_days, cached_days, "Month prefetch committed");
        PrefetchOutcome::Committed {
            run_id,
            available_days,
        }
    }

    /// One worker: pull dates until the queue is empty.
    async fn drain(
        &self,
        worker: usize,
        service_id: &str,
        timezone: &str,
        queue: &Mutex<VecDeque<NaiveDate>>,
        results: &Mutex<RunResults>,
    ) {
        loop {
            let Some(date) = queue.lock().await.pop_front() else {
                break;
            };

            match self.fetcher.fetch_day(service_id, date, timezone).await {
                Ok(day) => {
                    let mut results = results.lock().await;
                    results.record(date, day.is_available());
                    if let Some(next) = day.next_available {
                        results.offer(next);
                    }
                }
                Err(err) => {
                    debug!(worker, %date, error = %err, "Day lookup failed, marking unavailable");
                    results.lock().await.record(date, false);
                }
            }
        }
    }
}
