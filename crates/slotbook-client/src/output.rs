//! Terminal and JSON rendering of command results.

use chrono::NaiveDate;
use serde::Serialize;
use slotbook_core::{PageBundle, Service};
use slotbook_session::{BookingSession, ConfirmationRecord, DayStatus};

use crate::error::ClientResult;

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }
}

fn to_json<T: Serialize>(value: &T) -> ClientResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PageView<'a> {
    slug: &'a str,
    title: &'a str,
    services: &'a [Service],
    phone_required: bool,
    questions: Vec<&'a str>,
}

/// Renders a booking page and the services a visitor can pick.
pub fn render_page(bundle: &PageBundle, services: &[Service], format: OutputFormat) -> ClientResult<String> {
    if format == OutputFormat::Json {
        return to_json(&PageView {
            slug: &bundle.page.slug,
            title: &bundle.page.title,
            services,
            phone_required: bundle.config.phone_required(),
            questions: bundle
                .config
                .custom_questions()
                .iter()
                .map(|question| question.id.as_str())
                .collect(),
        });
    }

    let mut lines = vec![format!("{} ({})", bundle.page.title, bundle.page.slug)];
    lines.push(String::new());
    lines.push("Services:".to_string());
    for service in services {
        match service.duration_minutes {
            Some(minutes) => lines.push(format!("  {}  {} ({} min)", service.id, service.title, minutes)),
            None => lines.push(format!("  {}  {}", service.id, service.title)),
        }
    }

    let questions = bundle.config.custom_questions();
    if !questions.is_empty() {
        lines.push(String::new());
        lines.push("Questions:".to_string());
        for question in questions {
            lines.push(format!("  {}  {}", question.id, question.label));
        }
    }
    if bundle.config.phone_required() {
        lines.push(String::new());
        lines.push("A phone number is required to book.".to_string());
    }
    Ok(lines.join("\n"))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MonthView<'a> {
    month: String,
    timezone: &'a str,
    available_days: Vec<NaiveDate>,
    selected_date: Option<NaiveDate>,
    slots: Vec<&'a str>,
    next_available: Option<NaiveDate>,
    status: Option<&'a str>,
}

/// Renders the visible month of a session after availability was checked.
pub fn render_month(session: &BookingSession, format: OutputFormat) -> ClientResult<String> {
    let view = MonthView {
        month: session.current_month().format("%Y-%m").to_string(),
        timezone: session.timezone(),
        available_days: session
            .availability()
            .iter()
            .filter(|(date, status)| {
                **status == DayStatus::Available
                    && slotbook_core::month_start(**date) == session.current_month()
            })
            .map(|(date, _)| *date)
            .collect(),
        selected_date: session.selected_date(),
        slots: session.slots().iter().map(|slot| slot.label()).collect(),
        next_available: session.next_available_hint(),
        status: session.status_text(),
    };
    if format == OutputFormat::Json {
        return to_json(&view);
    }

    let mut lines = vec![format!(
        "{} ({})",
        session.current_month().format("%B %Y"),
        view.timezone
    )];
    if view.available_days.is_empty() {
        lines.push(view.status.unwrap_or("No open days.").to_string());
    } else {
        let days = view
            .available_days
            .iter()
            .map(|date| date.format("%a %-d").to_string())
            .collect::<Vec<_>>();
        lines.push(format!("Open days: {}", days.join(", ")));
    }
    if let Some(date) = view.selected_date {
        if view.slots.is_empty() {
            lines.push(format!("{}: no open times", date));
        } else {
            lines.push(format!("{}: {}", date, view.slots.join(" ")));
        }
    }
    if let Some(error) = session.day_error() {
        lines.push(format!("Could not load day: {}", error));
    }
    Ok(lines.join("\n"))
}

/// Renders a booking confirmation.
pub fn render_confirmation(record: &ConfirmationRecord, format: OutputFormat) -> ClientResult<String> {
    if format == OutputFormat::Json {
        return to_json(record);
    }

    let mut lines = vec![format!("Booked: {}", record.summary_text)];
    if let Some(link) = &record.meeting_link {
        lines.push(format!("Join: {}", link));
    }
    lines.push(format!("Add to calendar: {}", record.calendar_url));
    Ok(lines.join("\n"))
}
