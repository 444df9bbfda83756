use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar::{Event, EventTime, UpcomingEvent};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Request error: {0}")]
    RequestError(String),
    #[error("Calendar not found: {0}")]
    NotFound(String),
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("Authentication failed")]
    AuthenticationFailed,
    #[error("Parse error: {0}")]
    ParseError(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct GoogleEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    start: GoogleDateTime,
    end: GoogleDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    reminders: Option<GoogleReminders>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct GoogleDateTime {
    #[serde(rename = "dateTime", skip_serializing_if = "Option::is_none")]
    date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleReminders {
    use_default: bool,
    overrides: Vec<GoogleReminderOverride>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GoogleReminderOverride {
    method: String,
    minutes: u32,
}

#[derive(Debug, Deserialize)]
struct EventListResponse {
    items: Option<Vec<GoogleEvent>>,
}

#[async_trait]
pub trait CalendarApi {
    async fn list_upcoming(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        max_results: usize,
    ) -> Result<Vec<UpcomingEvent>, ApiError>;

    async fn insert_event(&self, calendar_id: &str, event: &Event) -> Result<String, ApiError>;
}

pub struct GoogleCalendarClient {
    base_url: String,
    access_token: String,
    client: reqwest::Client,
}

impl GoogleCalendarClient {
    pub fn new(access_token: String) -> Self {
        Self {
            base_url: "https://www.googleapis.com/calendar/v3".to_string(),
            access_token,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

fn convert_upcoming(ge: GoogleEvent) -> Option<UpcomingEvent> {
    let start = convert_time(ge.start)?;
    Some(UpcomingEvent {
        start,
        summary: ge.summary.unwrap_or_default(),
    })
}

fn convert_time(gdt: GoogleDateTime) -> Option<EventTime> {
    if let Some(raw) = gdt.date_time {
        return DateTime::parse_from_rfc3339(&raw).ok().map(EventTime::DateTime);
    }
    gdt.date.map(EventTime::Date)
}

fn wire_time(time: &EventTime) -> GoogleDateTime {
    match time {
        EventTime::DateTime(dt) => GoogleDateTime {
            date_time: Some(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            date: None,
        },
        EventTime::Date(date) => GoogleDateTime {
            date_time: None,
            date: Some(*date),
        },
    }
}

fn wire_event(event: &Event) -> GoogleEvent {
    GoogleEvent {
        id: None,
        summary: Some(event.summary.clone()),
        description: event.description.clone(),
        location: event.location.clone(),
        start: wire_time(&event.start),
        end: wire_time(&event.end),
        reminders: Some(GoogleReminders {
            use_default: event.reminders.use_default,
            overrides: event
                .reminders
                .overrides
                .iter()
                .map(|reminder| GoogleReminderOverride {
                    method: reminder.method.as_str().to_string(),
                    minutes: reminder.minutes,
                })
                .collect(),
        }),
    }
}

#[async_trait]
impl CalendarApi for GoogleCalendarClient {
    async fn list_upcoming(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        max_results: usize,
    ) -> Result<Vec<UpcomingEvent>, ApiError> {
        let url = format!("{}/calendars/{}/events", self.base_url, calendar_id);
        let time_min = time_min.to_rfc3339_opts(SecondsFormat::Secs, true);
        let max_results_param = max_results.to_string();

        tracing::info!("Listing events on {} from {}", calendar_id, time_min);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("timeMin", time_min.as_str()),
                ("maxResults", max_results_param.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
            ])
            .send()
            .await?;

        let status = response.status();
        tracing::info!("List events response status: {}", status);

        if status == 401 {
            tracing::error!("Authentication failed when listing events");
            return Err(ApiError::AuthenticationFailed);
        }

        if status == 404 {
            tracing::error!("Calendar not found: {}", calendar_id);
            return Err(ApiError::NotFound(calendar_id.to_string()));
        }

        if status == 429 {
            tracing::warn!("Rate limit exceeded");
            return Err(ApiError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await?;
            tracing::error!("Failed to list events. Status: {}, Body: {}", status, body);
            return Err(ApiError::RequestError(format!("Status {}: {}", status, body)));
        }

        let event_list: EventListResponse = response.json().await?;

        // Service order is preserved; the cap holds even if the service
        // returns more than was asked for.
        let events: Vec<UpcomingEvent> = event_list
            .items
            .unwrap_or_default()
            .into_iter()
            .filter_map(convert_upcoming)
            .take(max_results)
            .collect();

        tracing::info!("Listed {} upcoming events", events.len());
        Ok(events)
    }

    async fn insert_event(&self, calendar_id: &str, event: &Event) -> Result<String, ApiError> {
        let url = format!("{}/calendars/{}/events", self.base_url, calendar_id);
        let google_event = wire_event(event);

        tracing::info!("Creating event: {} at {}", event.summary, event.start);
        tracing::debug!("POST {} with payload: {:?}", url, google_event);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&google_event)
            .send()
            .await?;

        let status = response.status();
        tracing::info!("Create event response status: {}", status);

        if status == 401 {
            tracing::error!("Authentication failed when creating event");
            return Err(ApiError::AuthenticationFailed);
        }

        if status == 429 {
            tracing::warn!("Rate limit exceeded");
            return Err(ApiError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await?;
            tracing::error!("Failed to create event. Status: {}, Body: {}", status, body);
            return Err(ApiError::RequestError(format!("Status {}: {}", status, body)));
        }

        let created: GoogleEvent = response.json().await?;
        let id = created
            .id
            .ok_or_else(|| ApiError::ParseError("Created event has no id".to_string()))?;

        tracing::info!("Event created with ID: {}", id);
        Ok(id)
    }
}
