use std::fmt;

use serde::{Deserialize, Serialize};

use crate::conversations::STATE_CLOSED;

/// Logical lifecycle of a conversation within one reconciliation run.
///
/// Each conversation flows forward through:
/// ACTIVE → CLOSING → CLOSED → (PARTICIPANTS_EVICTED) → DELETED
///
/// `Skipped` (dry run) and `Failed` (close and fallback both rejected) are
/// terminal. This is not a 1:1 mapping of platform state strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Active,
    Closing,
    Closed,
    ParticipantsEvicted,
    Deleted,
    Skipped,
    Failed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Active => write!(f, "ACTIVE"),
            LifecycleState::Closing => write!(f, "CLOSING"),
            LifecycleState::Closed => write!(f, "CLOSED"),
            LifecycleState::ParticipantsEvicted => write!(f, "PARTICIPANTS_EVICTED"),
            LifecycleState::Deleted => write!(f, "DELETED"),
            LifecycleState::Skipped => write!(f, "SKIPPED"),
            LifecycleState::Failed => write!(f, "FAILED"),
        }
    }
}

impl LifecycleState {
    /// Map a platform state tag onto the logical starting state.
    /// Anything that is not `closed` (active, inactive, unknown) still needs closing.
    pub fn from_platform(state: &str) -> Self {
        if state == STATE_CLOSED {
            LifecycleState::Closed
        } else {
            LifecycleState::Active
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            LifecycleState::Deleted | LifecycleState::Skipped | LifecycleState::Failed
        )
    }

    /// Whether `next` is a legal forward step from `self`.
    pub fn can_advance_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Active, Closing)
                | (Active, Skipped)
                | (Closed, Skipped)
                | (Closing, Closed)
                | (Closing, Failed)
                | (Closed, ParticipantsEvicted)
                | (Closed, Deleted)
                | (ParticipantsEvicted, Deleted)
        )
    }
}

/// Records the forward walk of one conversation through [`LifecycleState`].
#[derive(Debug, Clone)]
pub struct Lifecycle {
    state: LifecycleState,
    history: Vec<LifecycleState>,
}

impl Lifecycle {
    pub fn start(platform_state: &str) -> Self {
        let state = LifecycleState::from_platform(platform_state);
        Self {
            state,
            history: vec![state],
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Advance to `next`. Backward or skipping moves are ignored and reported as `false`.
    pub fn advance(&mut self, next: LifecycleState) -> bool {
        if !self.state.can_advance_to(next) {
            return false;
        }
        self.state = next;
        self.history.push(next);
        true
    }

    pub fn into_history(self) -> Vec<LifecycleState> {
        self.history
    }
}
