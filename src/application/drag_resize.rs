// Drag/resize gesture state machine
//
// Converts pixel pointer events into grid candidates, clamps them into the
// grid, validates them and applies valid ones to the in-memory placements as a
// live preview. Only one gesture can be active at a time.
use crate::application::placement_validator::PlacementValidator;
use crate::domain::dashboard::Placement;
use crate::domain::grid::{
    GridPosition, GridRect, GridSize, MAX_HEIGHT, MAX_WIDTH, MIN_HEIGHT, MIN_WIDTH,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CELL_SIZE_PX: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GestureKind {
    Drag,
    Resize,
}

/// Observable controller state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "placementId", rename_all = "camelCase")]
pub enum GesturePhase {
    Idle,
    Dragging(String),
    Resizing(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MoveOutcome {
    /// No gesture is active.
    Ignored,
    /// The candidate was valid and differs from the previous preview.
    Applied,
    /// The candidate was valid but equal to the current preview.
    Unchanged,
    /// The candidate was out of bounds or overlapping; the preview was kept.
    Rejected,
}

/// Geometry committed by a finished gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryChange {
    pub placement_id: String,
    pub position: GridPosition,
    pub size: GridSize,
}

#[derive(Debug, Clone)]
struct ActiveGesture {
    kind: GestureKind,
    placement_id: String,
    start_position: GridPosition,
    start_size: GridSize,
    origin: PointerPosition,
    last_valid: GridRect,
}

#[derive(Debug)]
pub struct DragResizeController {
    cell_size_px: f64,
    active: Option<ActiveGesture>,
    rejected: bool,
}

impl DragResizeController {
    pub fn new(cell_size_px: f64) -> Self {
        Self {
            cell_size_px,
            active: None,
            rejected: false,
        }
    }

    pub fn phase(&self) -> GesturePhase {
        match &self.active {
            None => GesturePhase::Idle,
            Some(g) if g.kind == GestureKind::Drag => GesturePhase::Dragging(g.placement_id.clone()),
            Some(g) => GesturePhase::Resizing(g.placement_id.clone()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_placement_id(&self) -> Option<&str> {
        self.active.as_ref().map(|g| g.placement_id.as_str())
    }

    pub fn last_candidate_rejected(&self) -> bool {
        self.rejected
    }

    /// Begin a gesture on `placement`. Returns false, leaving any active
    /// gesture untouched, if one is already running.
    pub fn start(&mut self, kind: GestureKind, placement: &Placement, origin: PointerPosition) -> bool {
        if self.active.is_some() {
            tracing::debug!(
                "Ignoring {:?} start on {} - gesture already active",
                kind,
                placement.id
            );
            return false;
        }

        self.active = Some(ActiveGesture {
            kind,
            placement_id: placement.id.clone(),
            start_position: placement.position,
            start_size: placement.size,
            origin,
            last_valid: placement.rect(),
        });
        self.rejected = false;
        true
    }

    /// Apply one pointer move. Moves are processed in arrival order and never
    /// debounced.
    pub fn on_pointer_move(
        &mut self,
        pointer: PointerPosition,
        validator: &PlacementValidator,
        placements: &mut [Placement],
    ) -> MoveOutcome {
        let Some(gesture) = self.active.as_mut() else {
            return MoveOutcome::Ignored;
        };

        let dx = cell_delta(pointer.x - gesture.origin.x, self.cell_size_px);
        let dy = cell_delta(pointer.y - gesture.origin.y, self.cell_size_px);

        let grid = validator.grid();
        let columns = i64::from(grid.columns());
        let rows = i64::from(grid.rows());

        let candidate = match gesture.kind {
            GestureKind::Drag => {
                let size = gesture.start_size;
                let max_x = (columns - i64::from(size.width)).max(0);
                let max_y = (rows - i64::from(size.height)).max(0);
                let x = i64::from(gesture.start_position.x)
                    .saturating_add(dx)
                    .clamp(0, max_x);
                let y = i64::from(gesture.start_position.y)
                    .saturating_add(dy)
                    .clamp(0, max_y);
                GridRect::new(GridPosition::new(x as u32, y as u32), size)
            }
            GestureKind::Resize => {
                let position = gesture.start_position;
                let max_w = i64::from(MAX_WIDTH).min(columns - i64::from(position.x));
                let max_h = i64::from(MAX_HEIGHT).min(rows - i64::from(position.y));
                let w = i64::from(gesture.start_size.width)
                    .saturating_add(dx)
                    .min(max_w)
                    .max(i64::from(MIN_WIDTH));
                let h = i64::from(gesture.start_size.height)
                    .saturating_add(dy)
                    .min(max_h)
                    .max(i64::from(MIN_HEIGHT));
                GridRect::new(position, GridSize::new(w as u32, h as u32))
            }
        };

        if !validator.validate(&candidate, placements, Some(gesture.placement_id.as_str())) {
            self.rejected = true;
            return MoveOutcome::Rejected;
        }
        self.rejected = false;

        if candidate == gesture.last_valid {
            return MoveOutcome::Unchanged;
        }

        match placements.iter_mut().find(|p| p.id == gesture.placement_id) {
            Some(placement) => {
                placement.position = candidate.position;
                placement.size = candidate.size;
                gesture.last_valid = candidate;
                MoveOutcome::Applied
            }
            None => {
                tracing::warn!(
                    "Placement {} vanished mid-gesture, resetting",
                    gesture.placement_id
                );
                self.reset();
                MoveOutcome::Ignored
            }
        }
    }

    /// Finish the gesture. Returns the committed geometry only if it differs
    /// from where the gesture started.
    pub fn end(&mut self) -> Option<GeometryChange> {
        let gesture = self.active.take();
        self.reset();
        let gesture = gesture?;

        let unchanged = gesture.last_valid.position == gesture.start_position
            && gesture.last_valid.size == gesture.start_size;
        if unchanged {
            return None;
        }

        Some(GeometryChange {
            placement_id: gesture.placement_id,
            position: gesture.last_valid.position,
            size: gesture.last_valid.size,
        })
    }

    /// Abort the gesture and restore the start geometry. Nothing is committed.
    pub fn cancel(&mut self, placements: &mut [Placement]) {
        let gesture = self.active.take();
        self.reset();
        let Some(gesture) = gesture else {
            return;
        };

        if let Some(placement) = placements.iter_mut().find(|p| p.id == gesture.placement_id) {
            placement.position = gesture.start_position;
            placement.size = gesture.start_size;
        }
    }

    fn reset(&mut self) {
        self.active = None;
        self.rejected = false;
    }
}

impl Default for DragResizeController {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE_PX)
    }
}

/// Pixel distance to whole cells, rounded to nearest so the widget does not
/// trail the pointer by a cell. Non-finite input saturates (NaN maps to 0).
fn cell_delta(pixels: f64, cell_size_px: f64) -> i64 {
    (pixels / cell_size_px).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::GridModel;

    const CELL: f64 = 80.0;

    fn placement(id: &str, x: u32, y: u32, w: u32, h: u32) -> Placement {
        Placement::new(
            id.to_string(),
            format!("chart-{}", id),
            GridPosition::new(x, y),
            GridSize::new(w, h),
        )
    }

    fn validator() -> PlacementValidator {
        PlacementValidator::new(GridModel::new(12, 8))
    }

    fn at(x_cells: f64, y_cells: f64) -> PointerPosition {
        PointerPosition::new(x_cells * CELL, y_cells * CELL)
    }

    #[test]
    fn test_drag_clamps_to_right_edge() {
        let v = validator();
        let mut placements = vec![placement("a", 0, 0, 4, 3)];
        let mut controller = DragResizeController::new(CELL);

        assert!(controller.start(GestureKind::Drag, &placements[0], at(0.0, 0.0)));
        assert_eq!(controller.phase(), GesturePhase::Dragging("a".to_string()));
        assert_eq!(
            controller.on_pointer_move(at(10.0, 0.0), &v, &mut placements),
            MoveOutcome::Applied
        );
        assert_eq!(placements[0].position, GridPosition::new(8, 0));

        let change = controller.end().unwrap();
        assert_eq!(change.position, GridPosition::new(8, 0));
        assert_eq!(controller.phase(), GesturePhase::Idle);
    }

    #[test]
    fn test_resize_capped_by_remaining_space() {
        let v = validator();
        let mut placements = vec![placement("a", 10, 5, 2, 2)];
        let mut controller = DragResizeController::new(CELL);

        controller.start(GestureKind::Resize, &placements[0], at(0.0, 0.0));
        controller.on_pointer_move(at(50.0, 50.0), &v, &mut placements);
        assert_eq!(placements[0].size, GridSize::new(2, 3));

        let change = controller.end().unwrap();
        assert_eq!(change.size, GridSize::new(2, 3));
    }

    #[test]
    fn test_resize_respects_minimum() {
        let v = validator();
        let mut placements = vec![placement("a", 0, 0, 4, 3)];
        let mut controller = DragResizeController::new(CELL);

        controller.start(GestureKind::Resize, &placements[0], at(5.0, 5.0));
        controller.on_pointer_move(at(-20.0, -20.0), &v, &mut placements);
        assert_eq!(placements[0].size, GridSize::new(MIN_WIDTH, MIN_HEIGHT));
    }

    #[test]
    fn test_rounds_to_nearest_cell() {
        let v = validator();
        let mut placements = vec![placement("a", 0, 0, 4, 3)];
        let mut controller = DragResizeController::new(CELL);

        controller.start(GestureKind::Drag, &placements[0], PointerPosition::new(0.0, 0.0));
        controller.on_pointer_move(PointerPosition::new(CELL * 0.6, CELL * 0.4), &v, &mut placements);
        assert_eq!(placements[0].position, GridPosition::new(1, 0));

        controller.on_pointer_move(PointerPosition::new(CELL * 1.49, 0.0), &v, &mut placements);
        assert_eq!(placements[0].position, GridPosition::new(1, 0));
    }

    #[test]
    fn test_overlap_rejected_and_preview_kept() {
        let v = validator();
        let mut placements = vec![placement("a", 0, 0, 4, 3), placement("b", 6, 0, 4, 3)];
        let mut controller = DragResizeController::new(CELL);

        controller.start(GestureKind::Drag, &placements[0], at(0.0, 0.0));
        assert_eq!(
            controller.on_pointer_move(at(1.0, 0.0), &v, &mut placements),
            MoveOutcome::Applied
        );
        assert_eq!(
            controller.on_pointer_move(at(4.0, 0.0), &v, &mut placements),
            MoveOutcome::Rejected
        );
        assert!(controller.last_candidate_rejected());
        assert_eq!(placements[0].position, GridPosition::new(1, 0));

        // Moving back to free space clears the flag
        assert_eq!(
            controller.on_pointer_move(at(2.0, 0.0), &v, &mut placements),
            MoveOutcome::Applied
        );
        assert!(!controller.last_candidate_rejected());

        let change = controller.end().unwrap();
        assert_eq!(change.position, GridPosition::new(2, 0));
    }

    #[test]
    fn test_end_without_change_commits_nothing() {
        let v = validator();
        let mut placements = vec![placement("a", 2, 2, 4, 3)];
        let mut controller = DragResizeController::new(CELL);

        controller.start(GestureKind::Drag, &placements[0], at(0.0, 0.0));
        controller.on_pointer_move(at(3.0, 0.0), &v, &mut placements);
        controller.on_pointer_move(at(0.2, 0.1), &v, &mut placements);
        assert_eq!(controller.end(), None);
        assert_eq!(placements[0].position, GridPosition::new(2, 2));
    }

    #[test]
    fn test_end_resets_rejection_flag() {
        let v = validator();
        let mut placements = vec![placement("a", 0, 0, 4, 3), placement("b", 4, 0, 4, 3)];
        let mut controller = DragResizeController::new(CELL);

        controller.start(GestureKind::Drag, &placements[0], at(0.0, 0.0));
        controller.on_pointer_move(at(2.0, 0.0), &v, &mut placements);
        assert!(controller.last_candidate_rejected());
        assert_eq!(controller.end(), None);
        assert!(!controller.last_candidate_rejected());
        assert!(!controller.is_active());
    }

    #[test]
    fn test_cancel_reverts() {
        let v = validator();
        let mut placements = vec![placement("a", 0, 0, 4, 3)];
        let mut controller = DragResizeController::new(CELL);

        controller.start(GestureKind::Resize, &placements[0], at(0.0, 0.0));
        controller.on_pointer_move(at(2.0, 1.0), &v, &mut placements);
        assert_eq!(placements[0].size, GridSize::new(6, 4));

        controller.cancel(&mut placements);
        assert_eq!(placements[0].size, GridSize::new(4, 3));
        assert_eq!(controller.phase(), GesturePhase::Idle);
    }

    #[test]
    fn test_second_start_rejected() {
        let v = validator();
        let mut placements = vec![placement("a", 0, 0, 4, 3), placement("b", 0, 4, 4, 3)];
        let mut controller = DragResizeController::new(CELL);

        assert!(controller.start(GestureKind::Drag, &placements[0], at(0.0, 0.0)));
        controller.on_pointer_move(at(2.0, 0.0), &v, &mut placements);

        let other = placements[1].clone();
        assert!(!controller.start(GestureKind::Resize, &other, at(9.0, 9.0)));
        assert_eq!(controller.phase(), GesturePhase::Dragging("a".to_string()));

        // The first gesture keeps its original pointer origin
        controller.on_pointer_move(at(3.0, 0.0), &v, &mut placements);
        assert_eq!(placements[0].position, GridPosition::new(3, 0));
    }

    #[test]
    fn test_huge_pointer_delta_clamps_instead_of_overflowing() {
        let v = validator();
        let mut placements = vec![placement("a", 2, 1, 4, 3)];
        let mut controller = DragResizeController::new(CELL);

        controller.start(GestureKind::Drag, &placements[0], at(0.0, 0.0));
        controller.on_pointer_move(PointerPosition::new(1e300, f64::INFINITY), &v, &mut placements);
        assert_eq!(placements[0].position, GridPosition::new(8, 5));

        controller.on_pointer_move(PointerPosition::new(-1e300, f64::NEG_INFINITY), &v, &mut placements);
        assert_eq!(placements[0].position, GridPosition::new(0, 0));
        controller.cancel(&mut placements);

        controller.start(GestureKind::Resize, &placements[0], at(0.0, 0.0));
        controller.on_pointer_move(PointerPosition::new(1e300, 1e300), &v, &mut placements);
        assert_eq!(placements[0].size, GridSize::new(MAX_WIDTH, MAX_HEIGHT));

        controller.on_pointer_move(PointerPosition::new(f64::NAN, -1e300), &v, &mut placements);
        assert_eq!(placements[0].size, GridSize::new(4, MIN_HEIGHT));
    }

    #[test]
    fn test_move_while_idle_ignored() {
        let v = validator();
        let mut placements = vec![placement("a", 0, 0, 4, 3)];
        let mut controller = DragResizeController::default();
        assert_eq!(
            controller.on_pointer_move(at(3.0, 3.0), &v, &mut placements),
            MoveOutcome::Ignored
        );
        assert_eq!(controller.end(), None);
    }
}
