// Dashboard catalog - Use cases for creating, listing and deleting dashboards
use crate::application::dashboard_repository::DashboardRepository;
use crate::domain::dashboard::Dashboard;
use crate::domain::grid::{GridLayout, MIN_HEIGHT, MIN_WIDTH};
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("dashboard name must not be empty")]
    EmptyName,

    #[error("grid {columns}x{rows} cannot hold the smallest widget")]
    GridTooSmall { columns: u32, rows: u32 },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct DashboardCatalog {
    repository: Arc<dyn DashboardRepository>,
    default_layout: GridLayout,
    sequence: Arc<AtomicU64>,
}

impl DashboardCatalog {
    pub fn new(repository: Arc<dyn DashboardRepository>, default_layout: GridLayout) -> Self {
        Self {
            repository,
            default_layout,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create an empty dashboard. `layout` falls back to the configured default.
    pub async fn create(
        &self,
        name: &str,
        description: &str,
        layout: Option<GridLayout>,
    ) -> Result<Dashboard, CatalogError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::EmptyName);
        }

        let layout = layout.unwrap_or(self.default_layout);
        if layout.columns < MIN_WIDTH || layout.rows < MIN_HEIGHT {
            return Err(CatalogError::GridTooSmall {
                columns: layout.columns,
                rows: layout.rows,
            });
        }

        let id = format!(
            "dashboard-{}-{}",
            Utc::now().timestamp_millis(),
            self.sequence.fetch_add(1, Ordering::Relaxed)
        );
        let dashboard = Dashboard::new(id, name.to_string(), description.to_string(), layout);
        self.repository.save(dashboard.clone()).await?;

        tracing::info!("Created dashboard {} ({})", dashboard.id, dashboard.name);
        Ok(dashboard)
    }

    pub async fn list(&self) -> Result<Vec<Dashboard>, CatalogError> {
        Ok(self.repository.list().await?)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Dashboard>, CatalogError> {
        Ok(self.repository.get(id).await?)
    }

    /// Delete a dashboard as a unit. Charts it referenced are left alone.
    pub async fn delete(&self, id: &str) -> Result<(), CatalogError> {
        self.repository.delete(id).await?;
        tracing::info!("Deleted dashboard {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory_repository::InMemoryDashboardRepository;

    fn catalog() -> DashboardCatalog {
        DashboardCatalog::new(
            Arc::new(InMemoryDashboardRepository::new()),
            GridLayout::default(),
        )
    }

    #[tokio::test]
    async fn test_create_list_delete() {
        let catalog = catalog();
        let first = catalog.create("  Sales ", "", None).await.unwrap();
        let second = catalog
            .create(
                "Ops",
                "on-call",
                Some(GridLayout {
                    columns: 6,
                    rows: 4,
                    gap: 8,
                }),
            )
            .await
            .unwrap();

        assert_eq!(first.name, "Sales");
        assert!(first.placements.is_empty());
        assert_ne!(first.id, second.id);
        assert_eq!(second.layout.columns, 6);
        assert_eq!(catalog.list().await.unwrap().len(), 2);

        catalog.delete(&first.id).await.unwrap();
        assert!(catalog.get(&first.id).await.unwrap().is_none());
        assert_eq!(catalog.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_bad_input() {
        let catalog = catalog();
        assert!(matches!(
            catalog.create(" ", "", None).await,
            Err(CatalogError::EmptyName)
        ));
        assert!(matches!(
            catalog
                .create(
                    "Tiny",
                    "",
                    Some(GridLayout {
                        columns: 1,
                        rows: 8,
                        gap: 0
                    })
                )
                .await,
            Err(CatalogError::GridTooSmall { .. })
        ));
    }
}
