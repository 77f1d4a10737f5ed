// File-backed dashboard repository - one JSON document per dashboard id
use crate::application::dashboard_repository::DashboardRepository;
use crate::domain::dashboard::Dashboard;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FileDashboardRepository {
    root: PathBuf,
}

impl FileDashboardRepository {
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("Failed to create storage directory {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            anyhow::bail!("Invalid dashboard id for file storage: {:?}", id);
        }
        Ok(self.root.join(format!("{}.json", id)))
    }
}

#[async_trait]
impl DashboardRepository for FileDashboardRepository {
    async fn get(&self, id: &str) -> Result<Option<Dashboard>> {
        let path = self.document_path(id)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };

        let dashboard = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse dashboard document {}", path.display()))?;
        Ok(Some(dashboard))
    }

    async fn save(&self, mut dashboard: Dashboard) -> Result<()> {
        let path = self.document_path(&dashboard.id)?;
        dashboard.updated_at = Utc::now();
        let bytes = serde_json::to_vec_pretty(&dashboard).context("Failed to encode dashboard")?;

        // Write-then-rename so readers never see a torn document
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("Failed to move {} into place", tmp.display()))?;

        tracing::debug!("Wrote dashboard {} to {}", dashboard.id, path.display());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let path = self.document_path(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete {}", path.display())),
        }
    }

    async fn list(&self) -> Result<Vec<Dashboard>> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .with_context(|| format!("Failed to list {}", self.root.display()))?;

        let mut dashboards = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            match serde_json::from_slice::<Dashboard>(&bytes) {
                Ok(dashboard) => dashboards.push(dashboard),
                Err(e) => tracing::warn!("Skipping unreadable document {}: {}", path.display(), e),
            }
        }

        dashboards.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(dashboards)
    }
}
