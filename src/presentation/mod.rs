// Presentation layer - HTTP surface over dashboard sessions
pub mod api_error;
pub mod app_state;
pub mod handlers;
pub mod router;
