// Persistence coordinator - Debounced, serialized writes of placement changes
//
// High-frequency edits are merged into a pending map keyed by placement id.
// A single read-modify-write against the repository is issued once the
// debounce window elapses (or on an explicit flush). Writes for one dashboard
// never overlap.
use crate::application::dashboard_repository::DashboardRepository;
use crate::application::events::SessionEvent;
use crate::application::timer::{Timer, TimerId};
use crate::domain::dashboard::{Dashboard, Placement};
use crate::domain::grid::{GridPosition, GridSize};
use anyhow::Context;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, watch};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(800);

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("dashboard {0} not found")]
    DashboardNotFound(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PendingChange {
    Geometry { position: GridPosition, size: GridSize },
    Added(Placement),
    Removed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveStatus {
    pub has_unsaved_changes: bool,
    pub is_saving: bool,
    pub last_error: Option<String>,
}

/// What a flush request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "result", content = "changes", rename_all = "camelCase")]
pub enum FlushOutcome {
    /// Nothing was pending.
    Clean,
    /// A write was issued with this many placement changes.
    Written(usize),
}

#[derive(Debug)]
struct PendingEntry {
    /// Position of the first record for this id; writes apply in this order.
    order: u64,
    /// Bumped on every record; detects edits made during a write.
    seq: u64,
    change: PendingChange,
}

#[derive(Debug, Default)]
struct PendingState {
    entries: HashMap<String, PendingEntry>,
    next_seq: u64,
    timer: Option<TimerId>,
    timer_epoch: u64,
    is_saving: bool,
    last_error: Option<String>,
}

impl PendingState {
    fn status(&self) -> SaveStatus {
        SaveStatus {
            has_unsaved_changes: !self.entries.is_empty(),
            is_saving: self.is_saving,
            last_error: self.last_error.clone(),
        }
    }
}

struct Inner {
    dashboard_id: String,
    repository: Arc<dyn DashboardRepository>,
    timer: Arc<dyn Timer>,
    debounce: Duration,
    state: Mutex<PendingState>,
    write_gate: tokio::sync::Mutex<()>,
    status: watch::Sender<SaveStatus>,
    events: broadcast::Sender<SessionEvent>,
}

#[derive(Clone)]
pub struct PersistenceCoordinator {
    inner: Arc<Inner>,
}

impl PersistenceCoordinator {
    pub fn new(
        dashboard_id: String,
        repository: Arc<dyn DashboardRepository>,
        timer: Arc<dyn Timer>,
        debounce: Duration,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        let (status, _) = watch::channel(SaveStatus::default());
        Self {
            inner: Arc::new(Inner {
                dashboard_id,
                repository,
                timer,
                debounce,
                state: Mutex::new(PendingState::default()),
                write_gate: tokio::sync::Mutex::new(()),
                status,
                events,
            }),
        }
    }

    pub fn dashboard_id(&self) -> &str {
        &self.inner.dashboard_id
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.lock_state().entries.is_empty()
    }

    pub fn is_saving(&self) -> bool {
        self.lock_state().is_saving
    }

    pub fn status(&self) -> SaveStatus {
        self.lock_state().status()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SaveStatus> {
        self.inner.status.subscribe()
    }

    /// Latest pending change for a placement, if any.
    pub fn pending_change(&self, placement_id: &str) -> Option<PendingChange> {
        self.lock_state()
            .entries
            .get(placement_id)
            .map(|e| e.change.clone())
    }

    pub fn record_change(&self, placement_id: &str, position: GridPosition, size: GridSize) {
        self.record(placement_id, PendingChange::Geometry { position, size });
    }

    pub fn record_added(&self, placement: Placement) {
        let id = placement.id.clone();
        self.record(&id, PendingChange::Added(placement));
    }

    pub fn record_removed(&self, placement_id: &str) {
        self.record(placement_id, PendingChange::Removed);
    }

    fn record(&self, placement_id: &str, change: PendingChange) {
        let mut state = self.lock_state();
        let seq = state.next_seq;
        state.next_seq += 1;

        let previous = state.entries.remove(placement_id);
        let order = previous.as_ref().map_or(seq, |e| e.order);
        let merged = match (previous.map(|e| e.change), change) {
            // A not-yet-written placement keeps being an insert
            (Some(PendingChange::Added(mut placement)), PendingChange::Geometry { position, size }) => {
                placement.position = position;
                placement.size = size;
                PendingChange::Added(placement)
            }
            (Some(PendingChange::Removed), PendingChange::Geometry { .. }) => {
                tracing::warn!("Ignoring geometry change for removed placement {}", placement_id);
                PendingChange::Removed
            }
            (_, change) => change,
        };
        state.entries.insert(
            placement_id.to_string(),
            PendingEntry {
                order,
                seq,
                change: merged,
            },
        );

        self.restart_timer(&mut state);
        self.publish(&state);
    }

    /// Cancel any running debounce timer and write all pending changes now.
    /// Waits for an in-flight write to finish first, then writes whatever is
    /// pending at that point.
    pub async fn flush_now(&self) -> Result<FlushOutcome, PersistenceError> {
        self.cancel_timer();
        let gate = self.inner.write_gate.lock().await;
        self.write(gate).await
    }

    /// Drop every pending change without writing it. Waits for an in-flight
    /// write so nothing reaches the store after this returns.
    pub async fn discard(&self) -> usize {
        let _gate = self.inner.write_gate.lock().await;
        self.cancel_timer();

        let mut state = self.lock_state();
        let dropped = state.entries.len();
        state.entries.clear();
        state.last_error = None;
        self.publish(&state);
        if dropped > 0 {
            tracing::debug!(
                "Discarded {} pending changes for dashboard {}",
                dropped,
                self.inner.dashboard_id
            );
        }
        dropped
    }

    async fn on_timer_fired(&self, epoch: u64) {
        {
            let mut state = self.lock_state();
            if state.timer_epoch != epoch {
                // Superseded by a newer timer
                return;
            }
            state.timer = None;
        }

        let Ok(gate) = self.inner.write_gate.try_lock() else {
            tracing::debug!(
                "Save already in flight for dashboard {}, skipping timer flush",
                self.inner.dashboard_id
            );
            return;
        };

        if let Err(e) = self.write(gate).await {
            tracing::error!(
                "Debounced save failed for dashboard {}: {}",
                self.inner.dashboard_id,
                e
            );
        }
    }

    async fn write(
        &self,
        _gate: tokio::sync::MutexGuard<'_, ()>,
    ) -> Result<FlushOutcome, PersistenceError> {
        let snapshot = {
            let mut state = self.lock_state();
            if state.entries.is_empty() {
                return Ok(FlushOutcome::Clean);
            }
            let mut ordered: Vec<(&String, &PendingEntry)> = state.entries.iter().collect();
            ordered.sort_by_key(|(_, e)| e.order);
            let snapshot: Vec<(String, u64, PendingChange)> = ordered
                .into_iter()
                .map(|(id, e)| (id.clone(), e.seq, e.change.clone()))
                .collect();
            state.is_saving = true;
            self.publish(&state);
            snapshot
        };

        let result = self.read_modify_write(&snapshot).await;

        let mut state = self.lock_state();
        state.is_saving = false;
        let outcome = match result {
            Ok(()) => {
                // Entries touched during the write stay for the next one
                for (id, seq, _) in &snapshot {
                    if state.entries.get(id).is_some_and(|e| e.seq == *seq) {
                        state.entries.remove(id);
                    }
                }
                state.last_error = None;
                if !state.entries.is_empty() && state.timer.is_none() {
                    self.restart_timer(&mut state);
                }

                tracing::debug!(
                    "Saved {} placement changes for dashboard {}",
                    snapshot.len(),
                    self.inner.dashboard_id
                );
                let _ = self.inner.events.send(SessionEvent::Saved {
                    dashboard_id: self.inner.dashboard_id.clone(),
                    changes: snapshot.len(),
                });
                Ok(FlushOutcome::Written(snapshot.len()))
            }
            Err(e) => {
                state.last_error = Some(e.to_string());
                let _ = self.inner.events.send(SessionEvent::SaveFailed {
                    dashboard_id: self.inner.dashboard_id.clone(),
                    error: e.to_string(),
                });
                Err(e)
            }
        };
        self.publish(&state);
        outcome
    }

    async fn read_modify_write(
        &self,
        snapshot: &[(String, u64, PendingChange)],
    ) -> Result<(), PersistenceError> {
        let id = &self.inner.dashboard_id;
        let mut dashboard = self
            .inner
            .repository
            .get(id)
            .await
            .with_context(|| format!("Failed to load dashboard {}", id))?
            .ok_or_else(|| PersistenceError::DashboardNotFound(id.clone()))?;

        for (placement_id, _, change) in snapshot {
            apply_change(&mut dashboard, placement_id, change);
        }

        self.inner
            .repository
            .save(dashboard)
            .await
            .with_context(|| format!("Failed to save dashboard {}", id))?;
        Ok(())
    }

    fn restart_timer(&self, state: &mut PendingState) {
        if let Some(id) = state.timer.take() {
            self.inner.timer.cancel(id);
        }
        state.timer_epoch += 1;
        let epoch = state.timer_epoch;
        let this = self.clone();
        let id = self.inner.timer.start(
            self.inner.debounce,
            Box::pin(async move { this.on_timer_fired(epoch).await }),
        );
        state.timer = Some(id);
    }

    fn cancel_timer(&self) {
        let mut state = self.lock_state();
        state.timer_epoch += 1;
        if let Some(id) = state.timer.take() {
            self.inner.timer.cancel(id);
        }
    }

    fn publish(&self, state: &PendingState) {
        self.inner.status.send_replace(state.status());
    }

    fn lock_state(&self) -> MutexGuard<'_, PendingState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn apply_change(dashboard: &mut Dashboard, placement_id: &str, change: &PendingChange) {
    match change {
        PendingChange::Geometry { position, size } => match dashboard.placement_mut(placement_id) {
            Some(placement) => {
                placement.position = *position;
                placement.size = *size;
            }
            None => {
                tracing::warn!(
                    "Placement {} missing from stored dashboard {}, dropping geometry change",
                    placement_id,
                    dashboard.id
                );
            }
        },
        PendingChange::Added(placement) => match dashboard.placement_mut(placement_id) {
            Some(existing) => *existing = placement.clone(),
            None => dashboard.placements.push(placement.clone()),
        },
        PendingChange::Removed => {
            dashboard.remove_placement(placement_id);
        }
    }
}
