pub mod event;

pub use event::{Event, EventTime, Reminder, ReminderMethod, Reminders, UpcomingEvent};
