//! Page, availability and booking commands.
//!
//! Each command drives a [`BookingFlow`] the same way a visitor would in a
//! browser and returns the rendered output.

use std::sync::Arc;

use chrono::NaiveDate;
use slotbook_api::BookingBackend;
use slotbook_core::{month_start, parse_date_key, parse_month};
use slotbook_session::{BookingFlow, BookingSession, DaySelection, FlowConfig, Renderer};
use tracing::{debug, trace};

use crate::cli::BookArgs;
use crate::error::{ClientError, ClientResult};
use crate::output::{OutputFormat, render_confirmation, render_month, render_page};

/// Logs every session update at trace level.
#[derive(Debug, Default)]
pub struct TraceRenderer;

impl Renderer for TraceRenderer {
    fn render(&self, session: &BookingSession) {
        trace!(
            step = session.step().as_str(),
            month = %session.current_month(),
            selected_date = ?session.selected_date(),
            status = ?session.status_text(),
            "Session updated"
        );
    }
}

/// Parses repeated `question_id=text` arguments.
pub fn parse_answers(raw: &[String]) -> ClientResult<Vec<(String, String)>> {
    raw.iter()
        .map(|answer| {
            let (id, text) = answer.split_once('=').ok_or_else(|| {
                ClientError::InvalidArgument(format!("answer {answer:?} is not question_id=text"))
            })?;
            let id = id.trim();
            if id.is_empty() {
                return Err(ClientError::InvalidArgument(format!(
                    "answer {answer:?} has no question id"
                )));
            }
            Ok((id.to_string(), text.to_string()))
        })
        .collect()
}

fn parse_date_arg(value: &str) -> ClientResult<NaiveDate> {
    parse_date_key(value)
        .ok_or_else(|| ClientError::InvalidArgument(format!("date {value:?} is not YYYY-MM-DD")))
}

fn parse_month_arg(value: &str) -> ClientResult<NaiveDate> {
    parse_month(value)
        .ok_or_else(|| ClientError::InvalidArgument(format!("month {value:?} is not YYYY-MM")))
}

async fn load(
    backend: Arc<dyn BookingBackend>,
    slug: &str,
    config: FlowConfig,
) -> ClientResult<BookingFlow> {
    Ok(BookingFlow::load(backend, slug, config, Arc::new(TraceRenderer)).await?)
}

/// `slotbook page <slug>`
pub async fn page(
    backend: Arc<dyn BookingBackend>,
    slug: &str,
    config: FlowConfig,
    format: OutputFormat,
) -> ClientResult<String> {
    let flow = load(backend, slug, config).await?;
    render_page(flow.bundle(), flow.services(), format)
}

/// `slotbook availability <slug> --service <id> [--month YYYY-MM]`
pub async fn availability(
    backend: Arc<dyn BookingBackend>,
    slug: &str,
    service_id: &str,
    month: Option<&str>,
    mut config: FlowConfig,
    format: OutputFormat,
) -> ClientResult<String> {
    if let Some(month) = month {
        config = config.with_initial_month(parse_month_arg(month)?);
    }

    let flow = load(backend, slug, config).await?;
    flow.select_service(service_id).await?;
    render_month(&flow.snapshot().await, format)
}

/// `slotbook book <slug> ...`
pub async fn book(
    backend: Arc<dyn BookingBackend>,
    args: &BookArgs,
    config: FlowConfig,
    format: OutputFormat,
) -> ClientResult<String> {
    let date = parse_date_arg(&args.date)?;
    let answers = parse_answers(&args.answers)?;

    let flow = load(backend, &args.slug, config.with_initial_month(date)).await?;
    flow.select_service(&args.service).await?;
    if flow.snapshot().await.current_month() != month_start(date) {
        flow.show_month(date).await;
    }

    match flow.select_date(date).await {
        DaySelection::Loaded { .. } => {}
        DaySelection::Failed(message) => {
            return Err(ClientError::DayUnavailable {
                date: date.to_string(),
                message,
            });
        }
        other => debug!(?other, "Unexpected day selection outcome"),
    }

    let start = flow
        .snapshot()
        .await
        .slots()
        .iter()
        .find(|slot| slot.label() == args.time)
        .map(|slot| slot.start_at_utc)
        .ok_or_else(|| ClientError::SlotNotFound {
            date: date.to_string(),
            time: args.time.clone(),
        })?;

    flow.select_slot(start).await;
    flow.continue_to_details().await;
    flow.update_form(|form| {
        form.name = args.name.clone();
        form.email = args.email.clone();
        form.phone = args.phone.clone();
        form.notes = args.notes.clone();
        form.answers.extend(answers);
    })
    .await;

    let record = flow.submit().await?;
    render_confirmation(&record, format)
}
