pub mod calendar;
pub mod google;
pub mod storage;

pub use calendar::{Event, EventTime, UpcomingEvent};
pub use google::{Authorizer, GoogleCalendarClient, StoredToken};
pub use storage::Config;
