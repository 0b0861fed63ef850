use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use super::lifecycle::{Lifecycle, LifecycleState};
use super::outcome::{EventKind, Mode, Settled, SweepEvent, TransitionOutcome};
use crate::conversations::{ConversationDescriptor, ConversationsApi, STATE_CLOSED, StateUpdate};
use crate::error::TransitionError;

/// Tunables for the per-conversation transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Upper bound on participants listed for eviction.
    pub participant_limit: u32,
    /// Fixed pause between participant removals.
    pub eviction_pause: Duration,
    /// Give up on a conversation after this long. `None` waits indefinitely.
    pub transition_timeout: Option<Duration>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            participant_limit: 200,
            eviction_pause: Duration::from_millis(50),
            transition_timeout: None,
        }
    }
}

/// Drives one conversation through close → evict → delete.
///
/// Never returns an error: every failure ends up either recovered (logged,
/// recorded as a [`SweepEvent`]) or recorded in the conversation's
/// [`TransitionOutcome`].
pub struct TransitionPipeline<'a, C> {
    api: &'a C,
    mode: Mode,
    options: PipelineOptions,
}

/// Everything a transition has reached so far. Owned by [`TransitionPipeline::run`]
/// so an abandoned transition still reports the steps that completed.
struct Progress {
    lifecycle: Lifecycle,
    events: Vec<SweepEvent>,
    new_state: String,
    error: Option<TransitionError>,
    participants_removed: u32,
    deleted: bool,
}

impl Progress {
    fn start(conversation: &ConversationDescriptor) -> Self {
        Self {
            lifecycle: Lifecycle::start(&conversation.current_state),
            events: Vec::new(),
            new_state: conversation.current_state.clone(),
            error: None,
            participants_removed: 0,
            deleted: false,
        }
    }

    fn finish(self, conversation: &ConversationDescriptor) -> Settled {
        Settled {
            outcome: TransitionOutcome {
                id: conversation.id.clone(),
                display_name: conversation.display_name.clone(),
                previous_state: conversation.current_state.clone(),
                new_state: self.new_state,
                participants_removed: self.participants_removed,
                deleted: self.deleted,
                skipped: false,
                error: self.error,
                lifecycle: self.lifecycle.state(),
                transitions: self.lifecycle.into_history(),
            },
            events: self.events,
        }
    }
}

impl<'a, C: ConversationsApi> TransitionPipeline<'a, C> {
    pub fn new(api: &'a C, mode: Mode, options: PipelineOptions) -> Self {
        Self { api, mode, options }
    }

    pub async fn run(&self, conversation: &ConversationDescriptor) -> Settled {
        if self.mode.dry {
            debug!(conversation = %conversation.id, "dry run, skipping");
            return Settled {
                outcome: TransitionOutcome::skipped(conversation),
                events: Vec::new(),
            };
        }

        let mut progress = Progress::start(conversation);
        match self.options.transition_timeout {
            None => self.transition(conversation, &mut progress).await,
            Some(limit) => {
                let timed_out = timeout(limit, self.transition(conversation, &mut progress))
                    .await
                    .is_err();
                if timed_out {
                    abandon(&conversation.id, &mut progress, limit);
                }
            }
        }
        progress.finish(conversation)
    }

    async fn transition(&self, conversation: &ConversationDescriptor, progress: &mut Progress) {
        let id = conversation.id.as_str();

        // Already-closed conversations skip straight to the optional steps.
        if !conversation.is_closed() {
            progress.lifecycle.advance(LifecycleState::Closing);
            match self.close(id, &mut progress.events).await {
                Ok(()) => {
                    progress.lifecycle.advance(LifecycleState::Closed);
                    progress.new_state = STATE_CLOSED.to_string();
                }
                Err(err) => {
                    progress.lifecycle.advance(LifecycleState::Failed);
                    progress.error = Some(err);
                    return;
                }
            }
        }

        if self.mode.hard && self.evict(id, progress).await {
            progress.lifecycle.advance(LifecycleState::ParticipantsEvicted);
        }

        if self.mode.delete {
            match self.api.delete_conversation(id).await {
                Ok(()) => {
                    progress.deleted = true;
                    progress.lifecycle.advance(LifecycleState::Deleted);
                }
                Err(e) => {
                    warn!(conversation = id, error = %e, "delete failed");
                    progress
                        .events
                        .push(SweepEvent::new(id, EventKind::DeletionFailed, e.to_string()));
                }
            }
        }
    }

    /// Primary close, then at most one timer-based fallback.
    async fn close(&self, id: &str, events: &mut Vec<SweepEvent>) -> Result<(), TransitionError> {
        let primary = match self.api.update_conversation(id, StateUpdate::Close).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };
        warn!(conversation = id, error = %primary, "close rejected, expiring timers instead");
        events.push(SweepEvent::new(id, EventKind::CloseRejected, primary.to_string()));

        match self.api.update_conversation(id, StateUpdate::ExpireTimers).await {
            Ok(()) => Ok(()),
            Err(fallback) => {
                let err = TransitionError::CloseRejected {
                    primary: primary.to_string(),
                    fallback: fallback.to_string(),
                };
                warn!(conversation = id, error = %err, "close failed");
                events.push(SweepEvent::new(id, EventKind::CloseFailed, err.to_string()));
                Err(err)
            }
        }
    }

    /// Remove participants one at a time, counting each success as it lands.
    /// Returns `false` when the participants could not be listed.
    async fn evict(&self, id: &str, progress: &mut Progress) -> bool {
        let participants = match self
            .api
            .list_participants(id, self.options.participant_limit)
            .await
        {
            Ok(p) => p,
            Err(e) => {
                warn!(conversation = id, error = %e, "could not list participants");
                progress
                    .events
                    .push(SweepEvent::new(id, EventKind::ParticipantListFailed, e.to_string()));
                return false;
            }
        };

        for (i, participant) in participants.iter().enumerate() {
            if i > 0 && !self.options.eviction_pause.is_zero() {
                sleep(self.options.eviction_pause).await;
            }
            match self.api.remove_participant(id, &participant.sid).await {
                Ok(()) => progress.participants_removed += 1,
                Err(e) => {
                    warn!(conversation = id, participant = %participant.sid, error = %e, "participant removal failed");
                    progress.events.push(SweepEvent::new(
                        id,
                        EventKind::ParticipantRemovalFailed,
                        format!("{}: {e}", participant.sid),
                    ));
                }
            }
        }
        true
    }
}

/// Record a timed-out transition. Only an unfinished close makes the
/// conversation `Failed`; steps already completed stay in the outcome.
fn abandon(id: &str, progress: &mut Progress, limit: Duration) {
    let error = TransitionError::TimedOut {
        ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
    };
    warn!(conversation = id, %error, "abandoning conversation");
    progress
        .events
        .push(SweepEvent::new(id, EventKind::TransitionTimedOut, error.to_string()));
    if progress.lifecycle.state() == LifecycleState::Closing {
        progress.lifecycle.advance(LifecycleState::Failed);
    }
    progress.error = Some(error);
}
