// Infrastructure layer - External dependencies and adapters
pub mod chart_registry;
pub mod config;
pub mod file_repository;
pub mod memory_repository;
