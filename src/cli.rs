use std::io;
use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use thiserror::Error;

use gcal_up::calendar::{Event, EventTime, Reminder, ReminderMethod, Reminders, UpcomingEvent};
use gcal_up::google::api::{ApiError, CalendarApi, GoogleCalendarClient};
use gcal_up::google::auth::{AuthError, Authorizer, StoredToken};
use gcal_up::storage::config::Config;

const DEFAULT_TOKEN_FILE: &str = "token.json";
const PRIMARY_CALENDAR: &str = "primary";
const MAX_UPCOMING: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CliMode {
    List,
    Insert,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliOptions {
    pub mode: CliMode,
    pub token_file: PathBuf,
}

pub fn usage() -> &'static str {
    "Usage: gcal-up [--list | --insert] [--token-file PATH]"
}

pub fn parse_cli_args(args: impl Iterator<Item = String>) -> Result<CliOptions, String> {
    let mut mode = CliMode::List;
    let mut token_file = PathBuf::from(DEFAULT_TOKEN_FILE);
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--list" => mode = CliMode::List,
            "--insert" => mode = CliMode::Insert,
            "--token-file" => {
                let path = args
                    .next()
                    .ok_or_else(|| "--token-file requires a path".to_string())?;
                token_file = PathBuf::from(path);
            }
            "--help" => {
                println!("{}", usage());
                std::process::exit(0);
            }
            _ => return Err(format!("Unknown argument: {}", arg)),
        }
    }

    Ok(CliOptions { mode, token_file })
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error("Calendar service error: {0}")]
    Api(#[from] ApiError),
}

impl RunError {
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::Auth(_) => 3,
            RunError::Api(_) => 4,
        }
    }
}

pub async fn run_list(config: Config, token_file: PathBuf) -> Result<(), RunError> {
    let token = resolve_credential(config, token_file).await?;
    let client = GoogleCalendarClient::new(token.access_token);

    let events = client
        .list_upcoming(PRIMARY_CALENDAR, Utc::now(), MAX_UPCOMING)
        .await?;

    print!("{}", format_upcoming(&events));
    Ok(())
}

pub async fn run_insert(config: Config, token_file: PathBuf) -> Result<(), RunError> {
    let token = resolve_credential(config, token_file).await?;
    let client = GoogleCalendarClient::new(token.access_token);

    let id = client
        .insert_event(PRIMARY_CALENDAR, &close_trac_event())
        .await?;

    println!("Event created: {}", id);
    Ok(())
}

async fn resolve_credential(
    config: Config,
    token_file: PathBuf,
) -> Result<StoredToken, AuthError> {
    let authorizer = Authorizer::new(config, token_file);
    let stdin = io::stdin();
    let mut input = stdin.lock();
    authorizer.resolve(&mut input).await
}

fn format_upcoming(events: &[UpcomingEvent]) -> String {
    if events.is_empty() {
        return "No upcoming events found.\n".to_string();
    }

    let mut out = String::from("Upcoming events:\n");
    for event in events {
        out.push_str(&format!("{} - {}\n", event.start, event.summary));
    }
    out
}

fn close_trac_event() -> Event {
    let start = Utc
        .with_ymd_and_hms(2021, 5, 21, 3, 30, 0)
        .single()
        .expect("fixed timestamp");
    let end = Utc
        .with_ymd_and_hms(2021, 5, 21, 4, 0, 0)
        .single()
        .expect("fixed timestamp");

    Event {
        summary: "Close Trac Event".to_string(),
        location: Some("CG 84, 2nd Floor, Sector 2, Salt Lake, Kolkata - 700091".to_string()),
        description: Some("Signing a Deal".to_string()),
        start: EventTime::DateTime(start.fixed_offset()),
        end: EventTime::DateTime(end.fixed_offset()),
        reminders: Reminders {
            use_default: false,
            overrides: vec![Reminder {
                method: ReminderMethod::Popup,
                minutes: 10,
            }],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Result<CliOptions, String> {
        parse_cli_args(args.iter().map(|s| s.to_string()))
    }

    fn upcoming(start: &str, summary: &str) -> UpcomingEvent {
        UpcomingEvent {
            start: EventTime::DateTime(DateTime::parse_from_rfc3339(start).unwrap()),
            summary: summary.to_string(),
        }
    }

    #[test]
    fn no_arguments_defaults_to_listing() {
        let options = parse(&[]).unwrap();

        assert_eq!(options.mode, CliMode::List);
        assert_eq!(options.token_file, PathBuf::from("token.json"));
    }

    #[test]
    fn insert_flag_selects_insert_mode() {
        let options = parse(&["--insert"]).unwrap();

        assert_eq!(options.mode, CliMode::Insert);
    }

    #[test]
    fn token_file_flag_overrides_storage_location() {
        let options = parse(&["--insert", "--token-file", "/tmp/other.json"]).unwrap();

        assert_eq!(options.mode, CliMode::Insert);
        assert_eq!(options.token_file, PathBuf::from("/tmp/other.json"));
    }

    #[test]
    fn token_file_flag_without_a_path_is_an_error() {
        assert!(parse(&["--token-file"]).is_err());
    }

    #[test]
    fn unknown_argument_is_an_error() {
        let result = parse(&["--frobnicate"]);

        assert_eq!(result, Err("Unknown argument: --frobnicate".to_string()));
    }

    #[test]
    fn empty_listing_reports_no_events() {
        assert_eq!(format_upcoming(&[]), "No upcoming events found.\n");
    }

    #[test]
    fn listing_prints_one_line_per_event_in_order() {
        let events = vec![
            upcoming("2021-05-21T03:30:00Z", "first"),
            upcoming("2021-05-21T05:00:00Z", "second"),
            upcoming("2021-05-22T09:00:00Z", "third"),
        ];

        let text = format_upcoming(&events);

        assert_eq!(
            text,
            "Upcoming events:\n\
             2021-05-21T03:30:00Z - first\n\
             2021-05-21T05:00:00Z - second\n\
             2021-05-22T09:00:00Z - third\n"
        );
    }

    #[test]
    fn all_day_events_list_their_date() {
        let events = vec![UpcomingEvent {
            start: EventTime::Date(chrono::NaiveDate::from_ymd_opt(2021, 5, 22).unwrap()),
            summary: "holiday".to_string(),
        }];

        let text = format_upcoming(&events);

        assert_eq!(text, "Upcoming events:\n2021-05-22 - holiday\n");
    }

    #[test]
    fn fixed_event_is_a_thirty_minute_popup_reminder_slot() {
        let event = close_trac_event();

        assert_eq!(event.summary, "Close Trac Event");
        assert_eq!(event.description.as_deref(), Some("Signing a Deal"));
        assert!(!event.reminders.use_default);
        assert_eq!(
            event.reminders.overrides,
            vec![Reminder {
                method: ReminderMethod::Popup,
                minutes: 10,
            }]
        );

        let (EventTime::DateTime(start), EventTime::DateTime(end)) = (&event.start, &event.end)
        else {
            panic!("fixed event must be a timed event");
        };
        assert_eq!((*end - *start).num_minutes(), 30);
        assert_eq!(start.to_rfc3339(), "2021-05-21T03:30:00+00:00");
    }

    #[test]
    fn auth_errors_and_service_errors_exit_differently() {
        let auth = RunError::Auth(AuthError::ExchangeFailed("invalid_grant".to_string()));
        let api = RunError::Api(ApiError::RateLimited);

        assert_eq!(auth.exit_code(), 3);
        assert_eq!(api.exit_code(), 4);
        assert_ne!(auth.exit_code(), api.exit_code());
    }
}
