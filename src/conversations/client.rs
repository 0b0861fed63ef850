use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::debug;

use super::error::ApiError;
use super::types::{
    ConversationListResponse, ConversationPage, Participant, ParticipantListResponse,
    PlatformErrorBody, StateUpdate,
};

pub const DEFAULT_BASE_URL: &str = "https://conversations.twilio.com/v1";

/// The remote resource API the reconciler drives.
///
/// Implemented over HTTP by [`HttpConversationsClient`] and by in-memory
/// doubles in tests. Every call may fail with a typed [`ApiError`].
#[allow(async_fn_in_trait)]
pub trait ConversationsApi {
    /// Fetch one page of conversations. `cursor` is `None` for the first page.
    async fn list_page(
        &self,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<ConversationPage, ApiError>;

    async fn update_conversation(&self, id: &str, update: StateUpdate) -> Result<(), ApiError>;

    async fn delete_conversation(&self, id: &str) -> Result<(), ApiError>;

    /// List up to `limit` participants of a conversation (first page only).
    async fn list_participants(&self, id: &str, limit: u32) -> Result<Vec<Participant>, ApiError>;

    async fn remove_participant(&self, id: &str, participant_id: &str) -> Result<(), ApiError>;
}

/// Connection parameters for [`HttpConversationsClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub account_sid: String,
    pub auth_token: String,
    pub service_sid: String,
    pub request_timeout: Duration,
}

pub struct HttpConversationsClient {
    client: Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    service_sid: String,
}

impl HttpConversationsClient {
    pub fn new(options: ClientOptions) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(options.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            account_sid: options.account_sid,
            auth_token: options.auth_token,
            service_sid: options.service_sid,
        })
    }

    fn conversations_url(&self) -> String {
        format!(
            "{}/Services/{}/Conversations",
            self.base_url, self.service_sid
        )
    }

    fn conversation_url(&self, id: &str) -> String {
        format!("{}/{id}", self.conversations_url())
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        let response = req
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000)
                .unwrap_or(1000);
            return Err(ApiError::RateLimited {
                retry_after_ms: retry_after,
            });
        }

        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            let (code, message) = match serde_json::from_str::<PlatformErrorBody>(&text) {
                Ok(body) => (body.code, body.message.unwrap_or(text)),
                Err(_) => (None, text),
            };
            return Err(ApiError::Status {
                status: status.as_u16(),
                code,
                message,
            });
        }

        Ok(response)
    }
}

impl ConversationsApi for HttpConversationsClient {
    async fn list_page(
        &self,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<ConversationPage, ApiError> {
        // The cursor is the absolute next-page URL and already carries the page size.
        let req = match cursor {
            Some(url) => self.client.get(url),
            None => self
                .client
                .get(self.conversations_url())
                .query(&[("PageSize", page_size)]),
        };
        debug!(cursor = cursor.unwrap_or("<first>"), page_size, "listing conversations");
        let body = self
            .send(req)
            .await?
            .json::<ConversationListResponse>()
            .await?;
        Ok(body.into())
    }

    async fn update_conversation(&self, id: &str, update: StateUpdate) -> Result<(), ApiError> {
        debug!(conversation = id, ?update, "updating conversation");
        let req = self
            .client
            .post(self.conversation_url(id))
            .form(update.form_fields());
        self.send(req).await?;
        Ok(())
    }

    async fn delete_conversation(&self, id: &str) -> Result<(), ApiError> {
        debug!(conversation = id, "deleting conversation");
        self.send(self.client.delete(self.conversation_url(id)))
            .await?;
        Ok(())
    }

    async fn list_participants(&self, id: &str, limit: u32) -> Result<Vec<Participant>, ApiError> {
        let req = self
            .client
            .get(format!("{}/Participants", self.conversation_url(id)))
            .query(&[("PageSize", limit)]);
        let body = self
            .send(req)
            .await?
            .json::<ParticipantListResponse>()
            .await?;
        let mut participants = body.participants;
        participants.truncate(limit as usize);
        Ok(participants)
    }

    async fn remove_participant(&self, id: &str, participant_id: &str) -> Result<(), ApiError> {
        debug!(conversation = id, participant = participant_id, "removing participant");
        let url = format!("{}/Participants/{participant_id}", self.conversation_url(id));
        self.send(self.client.delete(url)).await?;
        Ok(())
    }
}
