// Grid geometry - positions, sizes and bounds checks in grid cells
use serde::{Deserialize, Serialize};

pub const MIN_WIDTH: u32 = 2;
pub const MIN_HEIGHT: u32 = 2;
pub const MAX_WIDTH: u32 = 8;
pub const MAX_HEIGHT: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: u32,
    pub y: u32,
}

impl GridPosition {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

impl GridSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when both dimensions sit inside the fixed min/max widget bounds.
    pub fn in_limits(&self) -> bool {
        (MIN_WIDTH..=MAX_WIDTH).contains(&self.width)
            && (MIN_HEIGHT..=MAX_HEIGHT).contains(&self.height)
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self::new(4, 3)
    }
}

/// A rectangle on the grid, half-open on its right and bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridRect {
    pub position: GridPosition,
    pub size: GridSize,
}

impl GridRect {
    pub fn new(position: GridPosition, size: GridSize) -> Self {
        Self { position, size }
    }

    pub fn right(&self) -> u64 {
        u64::from(self.position.x) + u64::from(self.size.width)
    }

    pub fn bottom(&self) -> u64 {
        u64::from(self.position.y) + u64::from(self.size.height)
    }
}

/// Grid dimensions as stored on a dashboard. `gap` is presentational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    pub columns: u32,
    pub rows: u32,
    #[serde(default)]
    pub gap: u32,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            columns: 12,
            rows: 8,
            gap: 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridModel {
    columns: u32,
    rows: u32,
}

impl GridModel {
    pub fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    pub fn from_layout(layout: &GridLayout) -> Self {
        Self::new(layout.columns, layout.rows)
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn is_within_bounds(&self, position: GridPosition, size: GridSize) -> bool {
        let rect = GridRect::new(position, size);
        rect.right() <= u64::from(self.columns) && rect.bottom() <= u64::from(self.rows)
    }

    /// Touching edges do not count as an overlap.
    pub fn overlaps(a: &GridRect, b: &GridRect) -> bool {
        u64::from(a.position.x) < b.right()
            && u64::from(b.position.x) < a.right()
            && u64::from(a.position.y) < b.bottom()
            && u64::from(b.position.y) < a.bottom()
    }
}
