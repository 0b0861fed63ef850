pub mod client;
pub mod error;
pub mod types;

pub use client::{ClientOptions, ConversationsApi, DEFAULT_BASE_URL, HttpConversationsClient};
pub use error::ApiError;
pub use types::{
    ConversationDescriptor, ConversationPage, Participant, STATE_CLOSED, StateUpdate,
};
