use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use std::fmt;

/// Event boundary as the calendar service models it: timed events carry an
/// RFC 3339 datetime, all-day events carry a bare date.
#[derive(Debug, Clone, PartialEq)]
pub enum EventTime {
    DateTime(DateTime<FixedOffset>),
    Date(NaiveDate),
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTime::DateTime(dt) => {
                write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            EventTime::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub summary: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    pub reminders: Reminders,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reminders {
    pub use_default: bool,
    pub overrides: Vec<Reminder>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub method: ReminderMethod,
    pub minutes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReminderMethod {
    Email,
    Popup,
}

impl ReminderMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderMethod::Email => "email",
            ReminderMethod::Popup => "popup",
        }
    }
}

/// One row of the upcoming-events listing.
#[derive(Debug, Clone, PartialEq)]
pub struct UpcomingEvent {
    pub start: EventTime,
    pub summary: String,
}
