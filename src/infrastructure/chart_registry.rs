// Chart registry backed by configuration
use crate::application::dashboard_repository::ChartRegistry;
use crate::domain::chart::ChartInfo;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct InMemoryChartRegistry {
    charts: HashMap<String, ChartInfo>,
}

impl InMemoryChartRegistry {
    pub fn new(charts: Vec<ChartInfo>) -> Self {
        let mut registry = HashMap::with_capacity(charts.len());
        for chart in charts {
            if let Some(previous) = registry.insert(chart.id.clone(), chart) {
                tracing::warn!("Duplicate chart id {} in registry, keeping last", previous.id);
            }
        }
        Self { charts: registry }
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }
}

impl ChartRegistry for InMemoryChartRegistry {
    fn get(&self, chart_id: &str) -> Option<ChartInfo> {
        self.charts.get(chart_id).cloned()
    }
}
