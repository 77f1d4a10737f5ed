// Placement validation and free-slot search
use crate::domain::dashboard::Placement;
use crate::domain::grid::{GridModel, GridPosition, GridRect, GridSize};

#[derive(Debug, Clone, Copy)]
pub struct PlacementValidator {
    grid: GridModel,
}

impl PlacementValidator {
    pub fn new(grid: GridModel) -> Self {
        Self { grid }
    }

    pub fn grid(&self) -> &GridModel {
        &self.grid
    }

    /// A candidate is legal when it is inside the grid and does not overlap any
    /// placement other than `exclude_id`.
    pub fn validate(
        &self,
        candidate: &GridRect,
        existing: &[Placement],
        exclude_id: Option<&str>,
    ) -> bool {
        if !self.grid.is_within_bounds(candidate.position, candidate.size) {
            return false;
        }

        !existing
            .iter()
            .filter(|p| Some(p.id.as_str()) != exclude_id)
            .any(|p| GridModel::overlaps(candidate, &p.rect()))
    }

    /// Row-major scan (y, then x) from the origin. The first hit wins, which
    /// keeps automatic placement reproducible.
    pub fn find_free_slot(&self, size: GridSize, existing: &[Placement]) -> Option<GridPosition> {
        if size.width > self.grid.columns() || size.height > self.grid.rows() {
            return None;
        }

        for y in 0..=(self.grid.rows() - size.height) {
            for x in 0..=(self.grid.columns() - size.width) {
                let candidate = GridRect::new(GridPosition::new(x, y), size);
                if self.validate(&candidate, existing, None) {
                    return Some(candidate.position);
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

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

    #[test]
    fn test_second_widget_lands_beside_first() {
        let v = validator();
        let existing = vec![placement("a", 0, 0, 4, 3)];
        assert_eq!(
            v.find_free_slot(GridSize::new(4, 3), &existing),
            Some(GridPosition::new(4, 0))
        );
    }

    #[test]
    fn test_free_slot_wraps_to_next_row() {
        let v = validator();
        let existing = vec![
            placement("a", 0, 0, 4, 3),
            placement("b", 4, 0, 4, 3),
            placement("c", 8, 0, 4, 3),
        ];
        assert_eq!(
            v.find_free_slot(GridSize::new(4, 3), &existing),
            Some(GridPosition::new(0, 3))
        );
    }

    #[test]
    fn test_free_slot_none_when_full() {
        let v = PlacementValidator::new(GridModel::new(4, 4));
        let existing = vec![placement("a", 0, 0, 4, 4)];
        assert_eq!(v.find_free_slot(GridSize::new(2, 2), &existing), None);
        assert_eq!(v.find_free_slot(GridSize::new(5, 2), &[]), None);
    }

    #[test]
    fn test_validate_excludes_own_id() {
        let v = validator();
        let existing = vec![placement("a", 0, 0, 4, 3), placement("b", 4, 0, 4, 3)];
        let moved = GridRect::new(GridPosition::new(1, 0), GridSize::new(4, 3));
        assert!(!v.validate(&moved, &existing, None));
        assert!(!v.validate(&moved, &existing, Some("a")));

        let nudged = GridRect::new(GridPosition::new(0, 1), GridSize::new(4, 3));
        assert!(v.validate(&nudged, &existing, Some("a")));
    }

    #[test]
    fn test_validate_rejects_out_of_bounds() {
        let v = validator();
        let candidate = GridRect::new(GridPosition::new(10, 0), GridSize::new(4, 3));
        assert!(!v.validate(&candidate, &[], None));
    }

    proptest! {
        #[test]
        fn free_slot_is_row_major_minimum(
            occupied in proptest::collection::vec((0u32..12, 0u32..8, 2u32..5, 2u32..4), 0..6),
            w in 2u32..6,
            h in 2u32..5,
        ) {
            let v = validator();
            // Build a non-overlapping set by letting the validator filter the raw boxes.
            let mut existing: Vec<Placement> = Vec::new();
            for (i, (x, y, pw, ph)) in occupied.into_iter().enumerate() {
                let rect = GridRect::new(GridPosition::new(x, y), GridSize::new(pw, ph));
                if v.validate(&rect, &existing, None) {
                    existing.push(placement(&i.to_string(), x, y, pw, ph));
                }
            }

            let size = GridSize::new(w, h);
            let found = v.find_free_slot(size, &existing);

            let mut expected = None;
            'scan: for y in 0..8u32 {
                for x in 0..12u32 {
                    let rect = GridRect::new(GridPosition::new(x, y), size);
                    if v.validate(&rect, &existing, None) {
                        expected = Some(GridPosition::new(x, y));
                        break 'scan;
                    }
                }
            }
            prop_assert_eq!(found, expected);
        }
    }
}
