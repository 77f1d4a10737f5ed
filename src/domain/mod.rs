// Domain layer - Dashboards, placements and grid geometry
pub mod chart;
pub mod dashboard;
pub mod grid;
