//! Calendar HTTP client implementing the CalendarPort.
//!
//! Talks to a Google-style events API: listing expands recurring instances
//! and orders by start time; updates are full overwrites of the event
//! representation, conditional on the event's etag when the caller asks for
//! an unchanged-since guard.

use std::sync::Arc;

use async_trait::async_trait;
use careslot_core::{CalendarPort, UpdateGuard};
use careslot_domain::{CalendarConfig, CareslotError, Result, Slot, TimeWindow};
use reqwest::header::IF_MATCH;
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, instrument};
use url::Url;

use super::auth::CalendarAuthenticator;
use super::types::{slot_from_event, EventsPage};
use crate::errors::InfraError;

/// Calendar API client with credential management
pub struct CalendarClient {
    http: Client,
    base_url: Url,
    calendar_id: String,
    auth: Arc<CalendarAuthenticator>,
}

impl CalendarClient {
    /// Create a new calendar client
    pub fn new(config: &CalendarConfig, auth: Arc<CalendarAuthenticator>) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|err| CareslotError::Config(format!("invalid calendar base URL: {err}")))?;

        Ok(Self {
            http: Client::new(),
            base_url,
            calendar_id: config.calendar_id.clone(),
            auth,
        })
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.base_url.as_str().trim_end_matches('/'),
            self.calendar_id
        )
    }

    fn event_url(&self, slot_id: &str) -> String {
        format!("{}/{}", self.events_url(), slot_id)
    }

    async fn check_status(response: Response, slot_id: Option<&str>) -> Result<Response> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND | StatusCode::GONE => {
                let id = slot_id.unwrap_or("<unknown>");
                Err(CareslotError::NotFound(format!("slot not found: {id}")))
            }
            StatusCode::PRECONDITION_FAILED => {
                Err(CareslotError::Conflict("slot changed upstream".to_string()))
            }
            status => {
                let error_text =
                    response.text().await.unwrap_or_else(|_| "unknown error".to_string());
                Err(CareslotError::Upstream(format!(
                    "calendar API error ({status}): {error_text}"
                )))
            }
        }
    }
}

#[async_trait]
impl CalendarPort for CalendarClient {
    #[instrument(skip(self))]
    async fn list_slots(&self, window: TimeWindow) -> Result<Vec<Slot>> {
        let access_token = self.auth.access_token().await?;

        let query = [
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
            ("timeMin", window.start.to_rfc3339()),
            ("timeMax", window.end.to_rfc3339()),
            ("timeZone", "UTC".to_string()),
        ];

        debug!(calendar_id = %self.calendar_id, "listing calendar events");

        let response = self
            .http
            .get(self.events_url())
            .bearer_auth(&access_token)
            .query(&query)
            .send()
            .await
            .map_err(InfraError::from)?;
        let response = Self::check_status(response, None).await?;

        let page: EventsPage = response.json().await.map_err(|err| {
            CareslotError::Upstream(format!("failed to parse calendar response: {err}"))
        })?;

        page.items.into_iter().map(slot_from_event).collect()
    }

    #[instrument(skip(self))]
    async fn get_slot(&self, slot_id: &str) -> Result<Slot> {
        let access_token = self.auth.access_token().await?;

        let response = self
            .http
            .get(self.event_url(slot_id))
            .bearer_auth(&access_token)
            .send()
            .await
            .map_err(InfraError::from)?;
        let response = Self::check_status(response, Some(slot_id)).await?;

        let event = response.json().await.map_err(|err| {
            CareslotError::Upstream(format!("failed to parse calendar event: {err}"))
        })?;

        slot_from_event(event)
    }

    #[instrument(skip(self, slot), fields(slot_id = %slot.id))]
    async fn update_slot(&self, slot: &Slot, guard: UpdateGuard) -> Result<Slot> {
        let access_token = self.auth.access_token().await?;

        let mut request = self
            .http
            .put(self.event_url(&slot.id))
            .bearer_auth(&access_token)
            .json(&slot.payload);

        if guard == UpdateGuard::IfUnchanged {
            if let Some(etag) = slot.etag.as_deref() {
                request = request.header(IF_MATCH, etag);
            }
        }

        debug!(conditional = guard == UpdateGuard::IfUnchanged, "updating calendar event");

        let response = request.send().await.map_err(InfraError::from)?;
        let response = Self::check_status(response, Some(&slot.id)).await?;

        let event = response.json().await.map_err(|err| {
            CareslotError::Upstream(format!("failed to parse calendar event: {err}"))
        })?;

        slot_from_event(event)
    }
}
