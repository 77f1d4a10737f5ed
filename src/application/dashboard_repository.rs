// Repository traits for dashboard storage and chart lookup
use crate::domain::chart::ChartInfo;
use crate::domain::dashboard::Dashboard;
use async_trait::async_trait;

#[async_trait]
pub trait DashboardRepository: Send + Sync {
    /// Fetch a dashboard by id, `None` if it does not exist
    async fn get(&self, id: &str) -> anyhow::Result<Option<Dashboard>>;

    /// Upsert a dashboard, stamping `updated_at`
    async fn save(&self, dashboard: Dashboard) -> anyhow::Result<()>;

    /// Delete a dashboard. Referenced charts are untouched.
    async fn delete(&self, id: &str) -> anyhow::Result<()>;

    /// List all stored dashboards
    async fn list(&self) -> anyhow::Result<Vec<Dashboard>>;
}

/// Lookup-only view of the chart registry. The layout engine never mutates charts.
pub trait ChartRegistry: Send + Sync {
    fn get(&self, chart_id: &str) -> Option<ChartInfo>;
}
