// Notifications published to whatever UI layer drives a session
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SessionEvent {
    /// Placement list or geometry changed (live preview included).
    PlacementsChanged,
    /// The last pointer move produced an invalid candidate.
    CandidateRejected { placement_id: String },
    /// A batched write reached the store.
    Saved { dashboard_id: String, changes: usize },
    /// A batched write failed; pending changes were kept.
    SaveFailed { dashboard_id: String, error: String },
}
