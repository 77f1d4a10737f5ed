// Dashboard domain model
use super::grid::{GridLayout, GridPosition, GridRect, GridSize};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub id: String,
    /// Lookup-only reference into the chart registry.
    pub chart_id: String,
    pub position: GridPosition,
    pub size: GridSize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<serde_json::Value>,
}

impl Placement {
    pub fn new(id: String, chart_id: String, position: GridPosition, size: GridSize) -> Self {
        Self {
            id,
            chart_id,
            position,
            size,
            title: None,
            settings: None,
        }
    }

    pub fn rect(&self) -> GridRect {
        GridRect::new(self.position, self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub layout: GridLayout,
    #[serde(default)]
    pub placements: Vec<Placement>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Dashboard {
    pub fn new(id: String, name: String, description: String, layout: GridLayout) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            description,
            layout,
            placements: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn placement(&self, placement_id: &str) -> Option<&Placement> {
        self.placements.iter().find(|p| p.id == placement_id)
    }

    pub fn placement_mut(&mut self, placement_id: &str) -> Option<&mut Placement> {
        self.placements.iter_mut().find(|p| p.id == placement_id)
    }

    pub fn remove_placement(&mut self, placement_id: &str) -> Option<Placement> {
        let index = self.placements.iter().position(|p| p.id == placement_id)?;
        Some(self.placements.remove(index))
    }
}
