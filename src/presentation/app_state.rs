// Application state for HTTP handlers
use crate::application::dashboard_catalog::DashboardCatalog;
use crate::application::session_registry::SessionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub catalog: DashboardCatalog,
    pub sessions: SessionRegistry,
}
