// Shared test doubles
use crate::application::dashboard_repository::DashboardRepository;
use crate::domain::dashboard::Dashboard;
use crate::infrastructure::memory_repository::InMemoryDashboardRepository;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Parks the next save (or load) until released.
#[derive(Default)]
pub struct SaveHold {
    entered: Notify,
    released: Notify,
}

impl SaveHold {
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.released.notify_one();
    }
}

/// In-memory repository that counts saves and can be told to fail or block.
#[derive(Default)]
pub struct RecordingRepository {
    store: InMemoryDashboardRepository,
    saves: AtomicUsize,
    saves_in_flight: AtomicUsize,
    max_saves_in_flight: AtomicUsize,
    fail: AtomicBool,
    last_saved: Mutex<Option<Dashboard>>,
    hold: Mutex<Option<Arc<SaveHold>>>,
    hold_get: Mutex<Option<Arc<SaveHold>>>,
}

impl RecordingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, dashboard: Dashboard) {
        self.store.save(dashboard).await.unwrap();
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn last_saved(&self) -> Option<Dashboard> {
        self.last_saved.lock().unwrap().clone()
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Highest number of saves that were running at the same time.
    pub fn max_concurrent_saves(&self) -> usize {
        self.max_saves_in_flight.load(Ordering::SeqCst)
    }

    pub fn hold_saves(&self) -> Arc<SaveHold> {
        let hold = Arc::new(SaveHold::default());
        *self.hold.lock().unwrap() = Some(hold.clone());
        hold
    }

    pub fn hold_gets(&self) -> Arc<SaveHold> {
        let hold = Arc::new(SaveHold::default());
        *self.hold_get.lock().unwrap() = Some(hold.clone());
        hold
    }
}

#[async_trait]
impl DashboardRepository for RecordingRepository {
    async fn get(&self, id: &str) -> anyhow::Result<Option<Dashboard>> {
        let hold = self.hold_get.lock().unwrap().take();
        if let Some(hold) = hold {
            hold.entered.notify_one();
            hold.released.notified().await;
        }
        self.store.get(id).await
    }

    async fn save(&self, dashboard: Dashboard) -> anyhow::Result<()> {
        let running = self.saves_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_saves_in_flight.fetch_max(running, Ordering::SeqCst);

        let hold = self.hold.lock().unwrap().take();
        if let Some(hold) = hold {
            hold.entered.notify_one();
            hold.released.notified().await;
        }

        let result = if self.fail.load(Ordering::SeqCst) {
            Err(anyhow::anyhow!("storage quota exceeded"))
        } else {
            self.saves.fetch_add(1, Ordering::SeqCst);
            *self.last_saved.lock().unwrap() = Some(dashboard.clone());
            self.store.save(dashboard).await
        };

        self.saves_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn delete(&self, id: &str) -> anyhow::Result<()> {
        self.store.delete(id).await
    }

    async fn list(&self) -> anyhow::Result<Vec<Dashboard>> {
        self.store.list().await
    }
}
