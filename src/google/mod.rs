pub mod api;
pub mod auth;

pub use api::{ApiError, CalendarApi, GoogleCalendarClient};
pub use auth::{AuthError, Authorizer, StoredToken, TokenStorage};
