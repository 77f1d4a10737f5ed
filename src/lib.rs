//! Grid placement engine for chart dashboards.
//!
//! Widgets occupy integer-cell rectangles on a fixed grid. The engine keeps
//! them inside the grid and non-overlapping while they are dragged or resized,
//! finds free space for new widgets, and batches the resulting layout changes
//! into debounced writes against a [`DashboardRepository`].
//!
//! [`DashboardRepository`]: application::dashboard_repository::DashboardRepository
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

#[cfg(test)]
mod test_support;
