// Route table
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    add_chart, close_session, create_dashboard, delete_dashboard, flush, gesture_cancel,
    gesture_end, gesture_move, gesture_start, get_session, health_check, list_dashboards,
    remove_chart_references, remove_placement,
};
use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboards", get(list_dashboards).post(create_dashboard))
        .route("/dashboards/:id", delete(delete_dashboard))
        .route("/dashboards/:id/session", get(get_session))
        .route("/dashboards/:id/charts", post(add_chart))
        .route("/dashboards/:id/charts/:chart_id", delete(remove_chart_references))
        .route("/dashboards/:id/placements/:placement_id", delete(remove_placement))
        .route("/dashboards/:id/gesture/start", post(gesture_start))
        .route("/dashboards/:id/gesture/move", post(gesture_move))
        .route("/dashboards/:id/gesture/end", post(gesture_end))
        .route("/dashboards/:id/gesture/cancel", post(gesture_cancel))
        .route("/dashboards/:id/flush", post(flush))
        .route("/dashboards/:id/close", post(close_session))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
