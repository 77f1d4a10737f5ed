// Dashboard session - One open dashboard and everything that edits it
//
// The session owns the in-memory placements, the gesture controller and the
// persistence coordinator. UI layers drive it through explicit calls and
// observe it through `subscribe`.
use crate::application::dashboard_repository::{ChartRegistry, DashboardRepository};
use crate::application::drag_resize::{
    DEFAULT_CELL_SIZE_PX, DragResizeController, GeometryChange, GestureKind, GesturePhase,
    MoveOutcome, PointerPosition,
};
use crate::application::events::SessionEvent;
use crate::application::persistence::{
    DEFAULT_DEBOUNCE, FlushOutcome, PersistenceCoordinator, PersistenceError, SaveStatus,
};
use crate::application::placement_validator::PlacementValidator;
use crate::application::timer::Timer;
use crate::domain::chart::ChartLookup;
use crate::domain::dashboard::{Dashboard, Placement};
use crate::domain::grid::{GridModel, GridSize};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, watch};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("dashboard {0} not found")]
    DashboardNotFound(String),

    #[error("no free space for a {}x{} chart", .0.width, .0.height)]
    NoSpace(GridSize),

    #[error("size {}x{} is outside the allowed widget bounds", .0.width, .0.height)]
    InvalidSize(GridSize),

    #[error("placement {0} not found")]
    PlacementNotFound(String),

    #[error("a drag or resize is in progress")]
    GestureActive,

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub cell_size_px: f64,
    pub debounce: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            cell_size_px: DEFAULT_CELL_SIZE_PX,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// A placement together with its resolved chart metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementView {
    #[serde(flatten)]
    pub placement: Placement,
    pub chart: ChartLookup,
}

pub struct DashboardSession {
    dashboard: Dashboard,
    validator: PlacementValidator,
    controller: DragResizeController,
    persistence: PersistenceCoordinator,
    charts: Arc<dyn ChartRegistry>,
    events: broadcast::Sender<SessionEvent>,
    next_placement: u64,
    closed: bool,
}

impl DashboardSession {
    pub async fn open(
        dashboard_id: &str,
        repository: Arc<dyn DashboardRepository>,
        charts: Arc<dyn ChartRegistry>,
        timer: Arc<dyn Timer>,
        options: SessionOptions,
    ) -> Result<Self, SessionError> {
        let dashboard = repository
            .get(dashboard_id)
            .await?
            .ok_or_else(|| SessionError::DashboardNotFound(dashboard_id.to_string()))?;

        tracing::debug!(
            "Opened dashboard {} with {} placements",
            dashboard.id,
            dashboard.placements.len()
        );
        Ok(Self::from_dashboard(dashboard, repository, charts, timer, options))
    }

    pub fn from_dashboard(
        dashboard: Dashboard,
        repository: Arc<dyn DashboardRepository>,
        charts: Arc<dyn ChartRegistry>,
        timer: Arc<dyn Timer>,
        options: SessionOptions,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let persistence = PersistenceCoordinator::new(
            dashboard.id.clone(),
            repository,
            timer,
            options.debounce,
            events.clone(),
        );

        Self {
            validator: PlacementValidator::new(GridModel::from_layout(&dashboard.layout)),
            controller: DragResizeController::new(options.cell_size_px),
            dashboard,
            persistence,
            charts,
            events,
            next_placement: 0,
            closed: false,
        }
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    /// Current placements, including live gesture previews.
    pub fn placements(&self) -> &[Placement] {
        &self.dashboard.placements
    }

    pub fn placement_views(&self) -> Vec<PlacementView> {
        self.dashboard
            .placements
            .iter()
            .map(|p| PlacementView {
                placement: p.clone(),
                chart: self.lookup_chart(&p.chart_id),
            })
            .collect()
    }

    /// Chart metadata for a placement. A dangling chart reference resolves to
    /// `ChartLookup::Missing`, never an error.
    pub fn chart_info(&self, placement_id: &str) -> Option<ChartLookup> {
        self.dashboard
            .placement(placement_id)
            .map(|p| self.lookup_chart(&p.chart_id))
    }

    pub fn phase(&self) -> GesturePhase {
        self.controller.phase()
    }

    pub fn last_candidate_rejected(&self) -> bool {
        self.controller.last_candidate_rejected()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.persistence.has_unsaved_changes()
    }

    pub fn is_saving(&self) -> bool {
        self.persistence.is_saving()
    }

    pub fn save_status(&self) -> SaveStatus {
        self.persistence.status()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SaveStatus> {
        self.persistence.subscribe_status()
    }

    pub fn persistence(&self) -> &PersistenceCoordinator {
        &self.persistence
    }

    /// Place a chart in the first free slot (row-major).
    pub fn add_chart(&mut self, chart_id: &str, size: GridSize) -> Result<Placement, SessionError> {
        if self.controller.is_active() {
            return Err(SessionError::GestureActive);
        }
        if !size.in_limits() {
            return Err(SessionError::InvalidSize(size));
        }

        let position = self
            .validator
            .find_free_slot(size, &self.dashboard.placements)
            .ok_or(SessionError::NoSpace(size))?;

        if self.charts.get(chart_id).is_none() {
            tracing::warn!("Adding chart {} that is not in the registry", chart_id);
        }

        let placement = Placement::new(self.new_placement_id(), chart_id.to_string(), position, size);
        self.dashboard.placements.push(placement.clone());
        self.persistence.record_added(placement.clone());
        self.notify(SessionEvent::PlacementsChanged);

        tracing::debug!(
            "Placed chart {} as {} at ({}, {})",
            chart_id,
            placement.id,
            position.x,
            position.y
        );
        Ok(placement)
    }

    pub fn remove_chart(&mut self, placement_id: &str) -> Result<Placement, SessionError> {
        if self.controller.active_placement_id() == Some(placement_id) {
            self.controller.cancel(&mut self.dashboard.placements);
        }

        let removed = self
            .dashboard
            .remove_placement(placement_id)
            .ok_or_else(|| SessionError::PlacementNotFound(placement_id.to_string()))?;
        self.persistence.record_removed(placement_id);
        self.notify(SessionEvent::PlacementsChanged);
        Ok(removed)
    }

    /// Drop every placement that points at `chart_id`, used when the chart
    /// itself is deleted. Returns how many were removed.
    pub fn remove_chart_references(&mut self, chart_id: &str) -> usize {
        let ids: Vec<String> = self
            .dashboard
            .placements
            .iter()
            .filter(|p| p.chart_id == chart_id)
            .map(|p| p.id.clone())
            .collect();

        ids.iter()
            .filter(|id| self.remove_chart(id).is_ok())
            .count()
    }

    pub fn start_drag(&mut self, placement_id: &str, origin: PointerPosition) -> bool {
        self.start_gesture(GestureKind::Drag, placement_id, origin)
    }

    pub fn start_resize(&mut self, placement_id: &str, origin: PointerPosition) -> bool {
        self.start_gesture(GestureKind::Resize, placement_id, origin)
    }

    pub fn start_gesture(
        &mut self,
        kind: GestureKind,
        placement_id: &str,
        origin: PointerPosition,
    ) -> bool {
        match self.dashboard.placement(placement_id) {
            Some(placement) => self.controller.start(kind, placement, origin),
            None => {
                tracing::debug!("Gesture start on unknown placement {}", placement_id);
                false
            }
        }
    }

    pub fn on_pointer_move(&mut self, pointer: PointerPosition) -> MoveOutcome {
        let outcome =
            self.controller
                .on_pointer_move(pointer, &self.validator, &mut self.dashboard.placements);

        match outcome {
            MoveOutcome::Applied => self.notify(SessionEvent::PlacementsChanged),
            MoveOutcome::Rejected => {
                if let Some(id) = self.controller.active_placement_id() {
                    let event = SessionEvent::CandidateRejected {
                        placement_id: id.to_string(),
                    };
                    self.notify(event);
                }
            }
            MoveOutcome::Ignored | MoveOutcome::Unchanged => {}
        }
        outcome
    }

    /// Commit the gesture. Unchanged geometry is not recorded.
    pub fn end_gesture(&mut self) -> Option<GeometryChange> {
        let change = self.controller.end()?;
        self.persistence
            .record_change(&change.placement_id, change.position, change.size);
        Some(change)
    }

    pub fn cancel_gesture(&mut self) {
        if self.controller.is_active() {
            self.controller.cancel(&mut self.dashboard.placements);
            self.notify(SessionEvent::PlacementsChanged);
        }
    }

    pub async fn flush_now(&self) -> Result<FlushOutcome, PersistenceError> {
        self.persistence.flush_now().await
    }

    /// Tear the session down: abandon any gesture and flush pending edits.
    pub async fn close(&mut self) -> Result<FlushOutcome, PersistenceError> {
        self.cancel_gesture();
        let outcome = self.persistence.flush_now().await;
        // Pending edits are still retained on failure; let Drop try again
        self.closed = outcome.is_ok();
        outcome
    }

    /// Tear the session down without writing, used when the dashboard itself
    /// is being deleted. Returns how many pending changes were dropped.
    pub async fn discard(&mut self) -> usize {
        self.closed = true;
        self.cancel_gesture();
        self.persistence.discard().await
    }

    fn lookup_chart(&self, chart_id: &str) -> ChartLookup {
        match self.charts.get(chart_id) {
            Some(info) => ChartLookup::Found(info),
            None => ChartLookup::Missing {
                chart_id: chart_id.to_string(),
            },
        }
    }

    fn new_placement_id(&mut self) -> String {
        let stamp = Utc::now().timestamp_millis();
        loop {
            self.next_placement += 1;
            let id = format!("placement-{}-{}", stamp, self.next_placement);
            if self.dashboard.placement(&id).is_none() {
                return id;
            }
        }
    }

    fn notify(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

impl Drop for DashboardSession {
    fn drop(&mut self) {
        if self.closed || !self.persistence.has_unsaved_changes() {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!(
                    "Session for dashboard {} dropped with unsaved changes, flushing",
                    self.dashboard.id
                );
                let persistence = self.persistence.clone();
                handle.spawn(async move {
                    if let Err(e) = persistence.flush_now().await {
                        tracing::error!(
                            "Teardown flush failed for dashboard {}: {}",
                            persistence.dashboard_id(),
                            e
                        );
                    }
                });
            }
            Err(_) => {
                tracing::error!(
                    "Session for dashboard {} dropped outside a runtime, unsaved changes lost",
                    self.dashboard.id
                );
            }
        }
    }
}
