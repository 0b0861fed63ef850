//! Wire types for the Conversations REST API and the descriptors derived from them.
//!
//! Listing endpoints return a resource array plus a `meta` block carrying the
//! absolute URL of the next page. The reconciler never looks at the raw wire
//! shape: [`ConversationResource`] is converted into a [`ConversationDescriptor`]
//! as soon as a page is decoded.

use serde::{Deserialize, Serialize};

/// Platform state tag for a conversation that has been closed.
pub const STATE_CLOSED: &str = "closed";

/// Read-only snapshot of one remote conversation, fetched once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationDescriptor {
    /// Opaque, unique conversation identifier (the platform SID).
    pub id: String,
    /// Optional human label.
    pub display_name: Option<String>,
    /// Platform lifecycle tag, normalized to lower case.
    pub current_state: String,
}

impl ConversationDescriptor {
    pub fn new(id: impl Into<String>, display_name: Option<String>, state: &str) -> Self {
        Self {
            id: id.into(),
            display_name,
            current_state: normalize_state(state),
        }
    }

    /// Whether the platform already reports this conversation as closed.
    pub fn is_closed(&self) -> bool {
        self.current_state == STATE_CLOSED
    }
}

/// Lower-cases and trims a platform state tag.
pub fn normalize_state(state: &str) -> String {
    state.trim().to_lowercase()
}

/// One page of the conversation listing, independent of the wire format.
#[derive(Debug, Clone, Default)]
pub struct ConversationPage {
    pub items: Vec<ConversationDescriptor>,
    pub has_next_page: bool,
    /// Opaque cursor for the next page; only meaningful when `has_next_page` is set.
    pub next_cursor: Option<String>,
}

/// A participant attached to a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Participant SID.
    pub sid: String,
    /// Chat identity, absent for SMS/WhatsApp participants.
    #[serde(default)]
    pub identity: Option<String>,
}

/// Fields sent with a conversation update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateUpdate {
    /// Ask the platform to move the conversation straight to `closed`.
    Close,
    /// Zero both lifecycle timers so the platform closes the conversation itself.
    ExpireTimers,
}

impl StateUpdate {
    /// Form-encoded body for the update call.
    pub fn form_fields(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            StateUpdate::Close => &[("State", "closed")],
            StateUpdate::ExpireTimers => &[("Timers.Inactive", "PT0S"), ("Timers.Closed", "PT0S")],
        }
    }
}

/// Raw conversation resource as returned by the listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationResource {
    pub sid: String,
    #[serde(default)]
    pub friendly_name: Option<String>,
    #[serde(default)]
    pub unique_name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl From<ConversationResource> for ConversationDescriptor {
    fn from(raw: ConversationResource) -> Self {
        let display_name = raw
            .friendly_name
            .filter(|n| !n.is_empty())
            .or(raw.unique_name.filter(|n| !n.is_empty()));
        ConversationDescriptor::new(raw.sid, display_name, raw.state.as_deref().unwrap_or(""))
    }
}

/// Pagination block shared by every listing response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub next_page_url: Option<String>,
}

/// Body of `GET .../Conversations`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationListResponse {
    #[serde(default)]
    pub conversations: Vec<ConversationResource>,
    #[serde(default)]
    pub meta: PageMeta,
}

impl From<ConversationListResponse> for ConversationPage {
    fn from(body: ConversationListResponse) -> Self {
        let next_cursor = body.meta.next_page_url.filter(|u| !u.is_empty());
        Self {
            items: body.conversations.into_iter().map(Into::into).collect(),
            has_next_page: next_cursor.is_some(),
            next_cursor,
        }
    }
}

/// Body of `GET .../Participants`.
#[derive(Debug, Clone, Deserialize)]
pub struct ParticipantListResponse {
    #[serde(default)]
    pub participants: Vec<Participant>,
}

/// Error body returned by the platform on 4xx/5xx.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformErrorBody {
    #[serde(default)]
    pub code: Option<u32>,
    #[serde(default)]
    pub message: Option<String>,
}
