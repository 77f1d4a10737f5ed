// In-memory dashboard repository
use crate::application::dashboard_repository::DashboardRepository;
use crate::domain::dashboard::Dashboard;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryDashboardRepository {
    dashboards: RwLock<HashMap<String, Dashboard>>,
}

impl InMemoryDashboardRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DashboardRepository for InMemoryDashboardRepository {
    async fn get(&self, id: &str) -> Result<Option<Dashboard>> {
        Ok(self.dashboards.read().await.get(id).cloned())
    }

    async fn save(&self, mut dashboard: Dashboard) -> Result<()> {
        dashboard.updated_at = Utc::now();
        self.dashboards
            .write()
            .await
            .insert(dashboard.id.clone(), dashboard);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.dashboards.write().await.remove(id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Dashboard>> {
        let mut dashboards: Vec<Dashboard> =
            self.dashboards.read().await.values().cloned().collect();
        dashboards.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(dashboards)
    }
}
