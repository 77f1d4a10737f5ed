// Session registry - At most one live session per dashboard
use crate::application::dashboard_repository::{ChartRegistry, DashboardRepository};
use crate::application::persistence::FlushOutcome;
use crate::application::session::{DashboardSession, SessionError, SessionOptions};
use crate::application::timer::Timer;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub type SharedSession = Arc<Mutex<DashboardSession>>;

#[derive(Clone)]
pub struct SessionRegistry {
    repository: Arc<dyn DashboardRepository>,
    charts: Arc<dyn ChartRegistry>,
    timer: Arc<dyn Timer>,
    options: SessionOptions,
    sessions: Arc<Mutex<HashMap<String, SharedSession>>>,
}

impl SessionRegistry {
    pub fn new(
        repository: Arc<dyn DashboardRepository>,
        charts: Arc<dyn ChartRegistry>,
        timer: Arc<dyn Timer>,
        options: SessionOptions,
    ) -> Self {
        Self {
            repository,
            charts,
            timer,
            options,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Return the live session for `dashboard_id`, opening it on first use.
    /// The store read runs without the registry lock held.
    pub async fn open(&self, dashboard_id: &str) -> Result<SharedSession, SessionError> {
        if let Some(session) = self.get(dashboard_id).await {
            return Ok(session);
        }

        let session = DashboardSession::open(
            dashboard_id,
            self.repository.clone(),
            self.charts.clone(),
            self.timer.clone(),
            self.options,
        )
        .await?;

        // Another caller may have opened the same dashboard meanwhile; the
        // first one inserted wins and the fresh copy (no edits yet) is dropped.
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .entry(dashboard_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(session)))
            .clone();
        Ok(session)
    }

    pub async fn get(&self, dashboard_id: &str) -> Option<SharedSession> {
        self.sessions.lock().await.get(dashboard_id).cloned()
    }

    /// Remove the session and flush its pending edits. `None` when no session
    /// was open.
    pub async fn close(&self, dashboard_id: &str) -> Result<Option<FlushOutcome>, SessionError> {
        let session = self.sessions.lock().await.remove(dashboard_id);
        let Some(session) = session else {
            return Ok(None);
        };

        let outcome = session.lock().await.close().await?;
        Ok(Some(outcome))
    }

    /// Remove the session and drop its pending edits unwritten. Returns
    /// false when no session was open.
    pub async fn discard(&self, dashboard_id: &str) -> bool {
        let session = self.sessions.lock().await.remove(dashboard_id);
        match session {
            Some(session) => {
                session.lock().await.discard().await;
                true
            }
            None => false,
        }
    }

    /// Flush and drop every open session. Failures are logged and the
    /// remaining sessions are still closed.
    pub async fn close_all(&self) {
        let sessions: Vec<(String, SharedSession)> = self.sessions.lock().await.drain().collect();
        for (id, session) in sessions {
            if let Err(e) = session.lock().await.close().await {
                tracing::error!("Failed to flush dashboard {} on shutdown: {}", id, e);
            }
        }
    }

    pub async fn open_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::timer::ManualTimer;
    use crate::domain::dashboard::Dashboard;
    use crate::domain::grid::{GridLayout, GridSize};
    use crate::infrastructure::chart_registry::InMemoryChartRegistry;
    use crate::test_support::RecordingRepository;
    use std::time::Duration;

    async fn registry() -> (Arc<RecordingRepository>, SessionRegistry) {
        let repo = Arc::new(RecordingRepository::new());
        repo.seed(Dashboard::new(
            "d1".to_string(),
            "Board".to_string(),
            String::new(),
            GridLayout::default(),
        ))
        .await;
        let registry = SessionRegistry::new(
            repo.clone(),
            Arc::new(InMemoryChartRegistry::default()),
            Arc::new(ManualTimer::new()),
            SessionOptions::default(),
        );
        (repo, registry)
    }

    #[tokio::test]
    async fn test_open_reuses_session() {
        let (_, registry) = registry().await;
        let a = registry.open("d1").await.unwrap();
        let b = registry.open("d1").await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.open_count().await, 1);
        assert!(matches!(
            registry.open("missing").await,
            Err(SessionError::DashboardNotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_load_does_not_block_other_dashboards() {
        let (repo, registry) = registry().await;
        repo.seed(Dashboard::new(
            "d2".to_string(),
            "Other".to_string(),
            String::new(),
            GridLayout::default(),
        ))
        .await;

        let hold = repo.hold_gets();
        let slow = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.open("d2").await })
        };
        hold.entered().await;

        let fast = tokio::time::timeout(Duration::from_secs(1), registry.open("d1")).await;
        assert!(fast.expect("d1 open blocked behind d2 load").is_ok());

        hold.release();
        slow.await.unwrap().unwrap();
        assert_eq!(registry.open_count().await, 2);
    }

    #[tokio::test]
    async fn test_racing_opens_share_one_session() {
        let (repo, registry) = registry().await;

        let hold = repo.hold_gets();
        let slow = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.open("d1").await })
        };
        hold.entered().await;

        let first = registry.open("d1").await.unwrap();
        hold.release();
        let second = slow.await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.open_count().await, 1);
    }

    #[tokio::test]
    async fn test_discard_writes_nothing() {
        let (repo, registry) = registry().await;
        let session = registry.open("d1").await.unwrap();
        session
            .lock()
            .await
            .add_chart("revenue", GridSize::new(4, 3))
            .unwrap();
        drop(session);

        assert!(registry.discard("d1").await);
        assert!(!registry.discard("d1").await);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(repo.save_count(), 0);
        assert_eq!(registry.open_count().await, 0);
    }

    #[tokio::test]
    async fn test_close_all_flushes() {
        let (repo, registry) = registry().await;
        let session = registry.open("d1").await.unwrap();
        session
            .lock()
            .await
            .add_chart("revenue", GridSize::new(4, 3))
            .unwrap();
        drop(session);

        registry.close_all().await;
        assert_eq!(repo.save_count(), 1);
        assert_eq!(registry.open_count().await, 0);
        assert_eq!(registry.close("d1").await.unwrap(), None);
    }
}
