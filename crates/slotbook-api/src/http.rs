//! HTTP client for the public booking API.
//!
//! Three JSON endpoints are used:
//! - `GET /api/pages/{slug}` for page bootstrap
//! - `GET /api/pages/{slug}/availability?serviceId&date&timezone` for one day
//! - `POST /api/bookings` to create a booking
//!
//! Error payloads carry either `{ "error": ... }` or `{ "message": ... }`; the
//! text is surfaced verbatim through [`ApiError::message`].

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace, warn};
use url::Url;

use slotbook_core::{
    BookingConfirmation, BookingRequest, DayAvailability, DaySlot, PageBundle, date_key,
};

use crate::backend::{AvailabilityQuery, BookingBackend, BoxFuture};
use crate::error::{ApiError, ApiResult};

/// Configuration for [`HttpBackend`].
#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    /// Origin of the booking API, e.g. `https://book.example.com`.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    pub user_agent: String,
}

impl HttpBackendConfig {
    /// Creates a config for the given base URL.
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            ApiError::configuration(format!("invalid base URL {base_url:?}: {e}")).with_source(e)
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::configuration(format!(
                "base URL cannot carry a path: {base_url}"
            )));
        }

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(15),
            user_agent: format!("slotbook/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Builder: set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// [`BookingBackend`] over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    config: HttpBackendConfig,
}

impl HttpBackend {
    /// Creates a new backend client.
    pub fn new(config: HttpBackendConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ApiError::configuration(format!("failed to create HTTP client: {e}")).with_source(e)
            })?;

        Ok(Self { client, config })
    }

    /// Joins path segments onto the base URL, encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::configuration("base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn fetch_page(&self, slug: String) -> ApiResult<PageBundle> {
        let url = self.endpoint(&["api", "pages", &slug])?;
        debug!(%url, "Loading booking page");
        let response = self.client.get(url).send().await.map_err(transport_error)?;
        read_json(response).await
    }

    async fn fetch_day(&self, query: AvailabilityQuery) -> ApiResult<DayAvailability> {
        let url = self.endpoint(&["api", "pages", &query.page_slug, "availability"])?;
        let date = date_key(query.date);
        trace!(%url, service_id = %query.service_id, date = %date, "Fetching day availability");

        let response = self
            .client
            .get(url)
            .query(&[
                ("serviceId", query.service_id.as_str()),
                ("date", date.as_str()),
                ("timezone", query.timezone.as_str()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let payload: AvailabilityPayload = read_json(response).await?;
        Ok(payload.into())
    }

    async fn post_booking(&self, request: BookingRequest) -> ApiResult<BookingConfirmation> {
        let url = self.endpoint(&["api", "bookings"])?;
        debug!(service_id = %request.service_id, start = %request.start_at_utc, "Creating booking");
        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;
        read_json(response).await
    }
}

impl BookingBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    fn load_page(&self, slug: String) -> BoxFuture<'_, ApiResult<PageBundle>> {
        Box::pin(self.fetch_page(slug))
    }

    fn day_availability(
        &self,
        query: AvailabilityQuery,
    ) -> BoxFuture<'_, ApiResult<DayAvailability>> {
        Box::pin(self.fetch_day(query))
    }

    fn create_booking(
        &self,
        request: BookingRequest,
    ) -> BoxFuture<'_, ApiResult<BookingConfirmation>> {
        Box::pin(self.post_booking(request))
    }
}

/// `{ availability: { slots }, nextAvailable?: { date } }`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvailabilityPayload {
    availability: SlotsPayload,
    #[serde(default)]
    next_available: Option<NextAvailablePayload>,
}

#[derive(Debug, Deserialize)]
struct SlotsPayload {
    #[serde(default)]
    slots: Vec<DaySlot>,
}

#[derive(Debug, Deserialize)]
struct NextAvailablePayload {
    #[serde(default)]
    date: Option<NaiveDate>,
}

impl From<AvailabilityPayload> for DayAvailability {
    fn from(payload: AvailabilityPayload) -> Self {
        Self {
            slots: payload.availability.slots,
            next_available: payload.next_available.and_then(|next| next.date),
        }
    }
}

fn transport_error(e: reqwest::Error) -> ApiError {
    let message = if e.is_timeout() {
        "request timeout".to_string()
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        format!("request failed: {e}")
    };
    ApiError::network(message).with_source(e)
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ApiError::network(format!("failed to read response: {e}")).with_source(e))?;
    interpret(status, &body)
}

/// Extracts the visitor-facing message of an error payload.
fn error_message(value: &Value, include_message: bool) -> Option<String> {
    let text = |v: &Value| v.as_str().map(str::trim).filter(|s| !s.is_empty()).map(String::from);

    match value.get("error") {
        Some(Value::Object(inner)) => inner.get("message").and_then(text),
        Some(other) => text(other),
        None if include_message => value.get("message").and_then(text),
        None => None,
    }
}

/// Maps a status code and body to a typed result.
fn interpret<T: DeserializeOwned>(status: StatusCode, body: &str) -> ApiResult<T> {
    let value: Option<Value> = serde_json::from_str(body).ok();

    if status.is_success() {
        let value = value.ok_or_else(|| ApiError::invalid_response("response is not valid JSON"))?;
        if let Some(message) = error_message(&value, false) {
            warn!(%message, "Backend answered with an error payload");
            return Err(ApiError::application(message));
        }
        return serde_json::from_value(value).map_err(|e| {
            ApiError::invalid_response(format!("failed to parse response: {e}")).with_source(e)
        });
    }

    let message = value
        .as_ref()
        .and_then(|v| error_message(v, true))
        .unwrap_or_else(|| format!("request failed with status {status}"));

    Err(match status {
        StatusCode::NOT_FOUND => ApiError::not_found(message),
        StatusCode::CONFLICT => ApiError::conflict(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ApiError::bad_request(message),
        s if s.is_server_error() => ApiError::server(message),
        _ => ApiError::application(message),
    })
}
