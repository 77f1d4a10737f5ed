// HTTP request handlers
use crate::application::drag_resize::{
    GeometryChange, GestureKind, GesturePhase, MoveOutcome, PointerPosition,
};
use crate::application::persistence::{FlushOutcome, SaveStatus};
use crate::application::session::{DashboardSession, PlacementView};
use crate::domain::dashboard::{Dashboard, Placement};
use crate::domain::grid::{GridLayout, GridSize};
use crate::presentation::api_error::ApiError;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDashboardRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub layout: Option<GridLayout>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChartRequest {
    pub chart_id: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureStartRequest {
    pub placement_id: String,
    pub kind: GestureKind,
    pub x: f64,
    pub y: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub dashboard_id: String,
    pub layout: GridLayout,
    pub placements: Vec<PlacementView>,
    pub gesture: GesturePhase,
    pub last_candidate_rejected: bool,
    pub save_status: SaveStatus,
}

impl SessionSnapshot {
    fn of(session: &DashboardSession) -> Self {
        Self {
            dashboard_id: session.dashboard().id.clone(),
            layout: session.dashboard().layout,
            placements: session.placement_views(),
            gesture: session.phase(),
            last_candidate_rejected: session.last_candidate_rejected(),
            save_status: session.save_status(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureStartResponse {
    pub accepted: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerMoveResponse {
    pub outcome: MoveOutcome,
    pub last_candidate_rejected: bool,
    pub placement: Option<Placement>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureEndResponse {
    pub committed: Option<GeometryChange>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedResponse {
    pub removed: usize,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List all dashboards
pub async fn list_dashboards(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Dashboard>>, ApiError> {
    Ok(Json(state.catalog.list().await?))
}

pub async fn create_dashboard(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateDashboardRequest>,
) -> Result<(StatusCode, Json<Dashboard>), ApiError> {
    let dashboard = state
        .catalog
        .create(&request.name, &request.description, request.layout)
        .await?;
    Ok((StatusCode::CREATED, Json(dashboard)))
}

/// Delete a dashboard, discarding its open session first
pub async fn delete_dashboard(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    if state.catalog.get(&id).await?.is_none() {
        return Err(ApiError::not_found(format!("dashboard {} not found", id)));
    }
    // Pending edits would only recreate the document after the delete
    state.sessions.discard(&id).await;
    state.catalog.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Current placements, gesture state and save status
pub async fn get_session(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let session = state.sessions.open(&id).await?;
    let session = session.lock().await;
    Ok(Json(SessionSnapshot::of(&session)))
}

pub async fn add_chart(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddChartRequest>,
) -> Result<(StatusCode, Json<Placement>), ApiError> {
    let session = state.sessions.open(&id).await?;
    let placement = session
        .lock()
        .await
        .add_chart(&request.chart_id, GridSize::new(request.width, request.height))?;
    Ok((StatusCode::CREATED, Json(placement)))
}

pub async fn remove_placement(
    Path((id, placement_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    let session = state.sessions.open(&id).await?;
    session.lock().await.remove_chart(&placement_id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove every placement of a chart, used when the chart itself is deleted
pub async fn remove_chart_references(
    Path((id, chart_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<RemovedResponse>, ApiError> {
    let session = state.sessions.open(&id).await?;
    let removed = session.lock().await.remove_chart_references(&chart_id);
    Ok(Json(RemovedResponse { removed }))
}

pub async fn gesture_start(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<GestureStartRequest>,
) -> Result<Json<GestureStartResponse>, ApiError> {
    let session = state.sessions.open(&id).await?;
    let accepted = session.lock().await.start_gesture(
        request.kind,
        &request.placement_id,
        PointerPosition::new(request.x, request.y),
    );
    Ok(Json(GestureStartResponse { accepted }))
}

pub async fn gesture_move(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(pointer): Json<PointerPosition>,
) -> Result<Json<PointerMoveResponse>, ApiError> {
    let session = state.sessions.open(&id).await?;
    let mut session = session.lock().await;
    let outcome = session.on_pointer_move(pointer);

    let placement = match session.phase() {
        GesturePhase::Dragging(pid) | GesturePhase::Resizing(pid) => {
            session.dashboard().placement(&pid).cloned()
        }
        GesturePhase::Idle => None,
    };
    Ok(Json(PointerMoveResponse {
        outcome,
        last_candidate_rejected: session.last_candidate_rejected(),
        placement,
    }))
}

pub async fn gesture_end(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<GestureEndResponse>, ApiError> {
    let session = state.sessions.open(&id).await?;
    let committed = session.lock().await.end_gesture();
    Ok(Json(GestureEndResponse { committed }))
}

pub async fn gesture_cancel(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    let session = state.sessions.open(&id).await?;
    session.lock().await.cancel_gesture();
    Ok(StatusCode::NO_CONTENT)
}

/// Write pending changes immediately ("save and close" path)
pub async fn flush(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<FlushOutcome>, ApiError> {
    let session = state.sessions.open(&id).await?;
    // Clone the coordinator so the session stays usable while the write runs
    let persistence = session.lock().await.persistence().clone();
    Ok(Json(persistence.flush_now().await?))
}

pub async fn close_session(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Option<FlushOutcome>>, ApiError> {
    Ok(Json(state.sessions.close(&id).await?))
}
