// Chart metadata as seen by the layout engine (read-only)
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    Line,
    MultiLine,
    Bar,
    Area,
    Pie,
    Scatter,
    Table,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartInfo {
    pub id: String,
    pub name: String,
    pub kind: ChartKind,
    #[serde(default)]
    pub unit: Option<String>,
}

impl ChartInfo {
    pub fn new(id: String, name: String, kind: ChartKind) -> Self {
        Self {
            id,
            name,
            kind,
            unit: None,
        }
    }
}

/// Result of resolving a placement's chart reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ChartLookup {
    Found(ChartInfo),
    Missing {
        #[serde(rename = "chartId")]
        chart_id: String,
    },
}

impl ChartLookup {
    /// Label to show on the widget frame.
    pub fn display_name(&self) -> &str {
        match self {
            ChartLookup::Found(info) => &info.name,
            ChartLookup::Missing { .. } => "Missing chart",
        }
    }
}
