// Application layer - Use cases and the placement engine
pub mod dashboard_catalog;
pub mod dashboard_repository;
pub mod drag_resize;
pub mod events;
pub mod persistence;
pub mod placement_validator;
pub mod session;
pub mod session_registry;
pub mod timer;
