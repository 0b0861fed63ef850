//! In-memory [`ConversationsApi`] double shared by the sweep tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::conversations::{
    ApiError, ConversationDescriptor, ConversationPage, ConversationsApi, Participant, StateUpdate,
};

/// Mutating call observed by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Update(String, StateUpdate),
    Delete(String),
    Remove(String, String),
}

#[derive(Default)]
struct Faults {
    listing_page: Option<usize>,
    cursorless_page: Option<usize>,
    close: HashSet<String>,
    fallback: HashSet<String>,
    participant_listing: HashSet<String>,
    removal: HashSet<String>,
    delete: HashSet<String>,
}

#[derive(Default)]
pub struct FakeApi {
    conversations: Vec<ConversationDescriptor>,
    participants: Mutex<HashMap<String, Vec<Participant>>>,
    faults: Mutex<Faults>,
    latency: Mutex<Option<Duration>>,
    calls: Mutex<Vec<Call>>,
    /// `(conversation, finished)` markers around every update call.
    trace: Mutex<Vec<(String, bool)>>,
    list_calls: AtomicUsize,
    participant_listings: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

fn rejected(message: &str) -> ApiError {
    ApiError::Status {
        status: 409,
        code: Some(50353),
        message: message.to_string(),
    }
}

impl FakeApi {
    /// `count` conversations named `CH000`, `CH001`, ... all in `state`.
    pub fn with_conversations(count: usize, state: &str) -> Self {
        Self::from_descriptors(
            (0..count)
                .map(|i| {
                    ConversationDescriptor::new(
                        format!("CH{i:03}"),
                        Some(format!("Conversation {i}")),
                        state,
                    )
                })
                .collect(),
        )
    }

    pub fn from_descriptors(conversations: Vec<ConversationDescriptor>) -> Self {
        Self {
            conversations,
            ..Default::default()
        }
    }

    pub fn conversations(&self) -> Vec<ConversationDescriptor> {
        self.conversations.clone()
    }

    pub fn set_participants(&self, id: &str, count: usize) {
        let list = (0..count)
            .map(|k| Participant {
                sid: format!("{id}-MB{k}"),
                identity: Some(format!("agent-{k}")),
            })
            .collect();
        self.participants.lock().unwrap().insert(id.to_string(), list);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    pub fn fail_listing_on_page(&self, page: usize) {
        self.faults.lock().unwrap().listing_page = Some(page);
    }

    /// Page `page` claims a successor but carries no cursor.
    pub fn drop_cursor_on_page(&self, page: usize) {
        self.faults.lock().unwrap().cursorless_page = Some(page);
    }

    pub fn reject_close(&self, id: &str) {
        self.faults.lock().unwrap().close.insert(id.to_string());
    }

    pub fn reject_fallback(&self, id: &str) {
        self.faults.lock().unwrap().fallback.insert(id.to_string());
    }

    pub fn fail_participant_listing(&self, id: &str) {
        self.faults
            .lock()
            .unwrap()
            .participant_listing
            .insert(id.to_string());
    }

    pub fn fail_removal(&self, participant_sid: &str) {
        self.faults
            .lock()
            .unwrap()
            .removal
            .insert(participant_sid.to_string());
    }

    pub fn fail_delete(&self, id: &str) {
        self.faults.lock().unwrap().delete.insert(id.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn trace(&self) -> Vec<(String, bool)> {
        self.trace.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn participant_listings(&self) -> usize {
        self.participant_listings.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn removal_attempts(&self, id: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Remove(conv, _) if conv == id))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    async fn suspend(&self) {
        let latency = *self.latency.lock().unwrap();
        match latency {
            Some(d) => tokio::time::sleep(d).await,
            None => tokio::task::yield_now().await,
        }
    }
}

impl ConversationsApi for FakeApi {
    async fn list_page(
        &self,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<ConversationPage, ApiError> {
        let page = self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.suspend().await;
        let (failing, cursorless) = {
            let faults = self.faults.lock().unwrap();
            (faults.listing_page, faults.cursorless_page)
        };
        if failing == Some(page) {
            return Err(ApiError::Timeout);
        }

        let offset = cursor
            .and_then(|c| c.strip_prefix("offset:"))
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(0);
        let end = (offset + page_size as usize).min(self.conversations.len());
        let has_next_page = end < self.conversations.len();
        Ok(ConversationPage {
            items: self.conversations[offset..end].to_vec(),
            has_next_page,
            next_cursor: (has_next_page && cursorless != Some(page)).then(|| format!("offset:{end}")),
        })
    }

    async fn update_conversation(&self, id: &str, update: StateUpdate) -> Result<(), ApiError> {
        self.record(Call::Update(id.to_string(), update));
        self.trace.lock().unwrap().push((id.to_string(), false));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        self.suspend().await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.trace.lock().unwrap().push((id.to_string(), true));

        let faults = self.faults.lock().unwrap();
        match update {
            StateUpdate::Close if faults.close.contains(id) => {
                Err(rejected("Conversation state transition is not allowed"))
            }
            StateUpdate::ExpireTimers if faults.fallback.contains(id) => {
                Err(rejected("Timers cannot be updated"))
            }
            _ => Ok(()),
        }
    }

    async fn delete_conversation(&self, id: &str) -> Result<(), ApiError> {
        self.record(Call::Delete(id.to_string()));
        self.suspend().await;
        if self.faults.lock().unwrap().delete.contains(id) {
            return Err(ApiError::Status {
                status: 404,
                code: Some(20404),
                message: "not found".into(),
            });
        }
        Ok(())
    }

    async fn list_participants(&self, id: &str, limit: u32) -> Result<Vec<Participant>, ApiError> {
        self.participant_listings.fetch_add(1, Ordering::SeqCst);
        self.suspend().await;
        if self.faults.lock().unwrap().participant_listing.contains(id) {
            return Err(ApiError::Status {
                status: 500,
                code: None,
                message: "upstream failure".into(),
            });
        }
        let mut list = self
            .participants
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default();
        list.truncate(limit as usize);
        Ok(list)
    }

    async fn remove_participant(&self, id: &str, participant_id: &str) -> Result<(), ApiError> {
        self.record(Call::Remove(id.to_string(), participant_id.to_string()));
        self.suspend().await;
        if self.faults.lock().unwrap().removal.contains(participant_id) {
            return Err(rejected("participant is locked"));
        }
        Ok(())
    }
}
