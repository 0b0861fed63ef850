use std::fmt;

use serde::{Deserialize, Serialize};

use super::lifecycle::LifecycleState;
use crate::conversations::ConversationDescriptor;
use crate::error::TransitionError;

/// Which optional steps a run performs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mode {
    /// Read-only simulation; short-circuits every mutating step.
    pub dry: bool,
    /// Evict participants after closing.
    pub hard: bool,
    /// Delete conversations once closed.
    pub delete: bool,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut flags = Vec::new();
        if self.dry {
            flags.push("dry");
        }
        if self.hard {
            flags.push("hard");
        }
        if self.delete {
            flags.push("delete");
        }
        if flags.is_empty() {
            write!(f, "close-only")
        } else {
            write!(f, "{}", flags.join("+"))
        }
    }
}

/// Result of driving one conversation through the pipeline. Produced exactly once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub id: String,
    pub display_name: Option<String>,
    pub previous_state: String,
    pub new_state: String,
    pub participants_removed: u32,
    pub deleted: bool,
    pub skipped: bool,
    pub error: Option<TransitionError>,
    /// Final logical state.
    pub lifecycle: LifecycleState,
    /// Logical states visited, starting state included.
    pub transitions: Vec<LifecycleState>,
}

impl TransitionOutcome {
    /// Outcome for a conversation left untouched by a dry run.
    pub fn skipped(conversation: &ConversationDescriptor) -> Self {
        let start = LifecycleState::from_platform(&conversation.current_state);
        Self {
            id: conversation.id.clone(),
            display_name: conversation.display_name.clone(),
            previous_state: conversation.current_state.clone(),
            new_state: conversation.current_state.clone(),
            participants_removed: 0,
            deleted: false,
            skipped: true,
            error: None,
            lifecycle: LifecycleState::Skipped,
            transitions: vec![start, LifecycleState::Skipped],
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_closed(&self) -> bool {
        !self.skipped && self.new_state == crate::conversations::STATE_CLOSED
    }
}

/// Kind of recovered or recorded problem surfaced during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Primary close rejected; the timer fallback is about to be tried.
    CloseRejected,
    /// Primary close and timer fallback both rejected.
    CloseFailed,
    /// The transition exceeded the configured timeout.
    TransitionTimedOut,
    ParticipantListFailed,
    ParticipantRemovalFailed,
    DeletionFailed,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EventKind::CloseRejected => "close rejected",
            EventKind::CloseFailed => "close failed",
            EventKind::TransitionTimedOut => "transition timed out",
            EventKind::ParticipantListFailed => "participant listing failed",
            EventKind::ParticipantRemovalFailed => "participant removal failed",
            EventKind::DeletionFailed => "deletion failed",
        };
        write!(f, "{label}")
    }
}

/// Structured warning emitted alongside the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepEvent {
    pub conversation_id: String,
    pub kind: EventKind,
    pub message: String,
}

impl SweepEvent {
    pub fn new(conversation_id: &str, kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.to_string(),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for SweepEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.conversation_id, self.kind, self.message)
    }
}

/// What one pipeline invocation hands back to the aggregator.
#[derive(Debug, Clone)]
pub struct Settled {
    pub outcome: TransitionOutcome,
    pub events: Vec<SweepEvent>,
}
