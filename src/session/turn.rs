use serde::Serialize;

use crate::engine::ResponseOutcome;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum CheckpointStatus {
    NotDue,
    Saved,
    Failed(String),
}

impl CheckpointStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, CheckpointStatus::Failed(_))
    }
}

/// Result of one learner turn within a session.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub turn: u64,
    #[serde(flatten)]
    pub response: ResponseOutcome,
    pub checkpoint: CheckpointStatus,
}
