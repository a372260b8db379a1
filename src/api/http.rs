use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    domain::{
        conversation::Conversation,
        ids::{ConversationId, MessageId},
        message::Message,
    },
    usecases::contracts::{ConversationRepository, RepositoryError, SendMessageRequest},
};

const API_REQUEST_FAILED: &str = "API_REQUEST_FAILED";
const API_STATUS_REJECTED: &str = "API_STATUS_REJECTED";
const API_BODY_INVALID: &str = "API_BODY_INVALID";

#[derive(Debug, thiserror::Error)]
#[error("failed to build HTTP client: {0}")]
pub struct HttpClientError(#[from] reqwest::Error);

/// REST client for the conversation API.
#[derive(Debug, Clone)]
pub struct HttpConversationRepository {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

/// Responses come either bare or wrapped in `{"data": ...}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Payload<T> {
    Enveloped { data: T },
    Bare(T),
}

impl<T> Payload<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Enveloped { data } => data,
            Self::Bare(value) => value,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkReadBody<'a> {
    conversation_id: &'a ConversationId,
    message_ids: &'a [MessageId],
}

impl HttpConversationRepository {
    pub fn new(
        base_url: &str,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, HttpClientError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            auth_token: auth_token.filter(|token| !token.is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute(&self, request: RequestBuilder) -> Result<String, RepositoryError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(request_failed)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                code = API_STATUS_REJECTED,
                status = status.as_u16(),
                url = %response.url(),
                "API request rejected"
            );
            return Err(map_status(status));
        }

        response.text().await.map_err(request_failed)
    }

    async fn execute_json<T>(&self, request: RequestBuilder) -> Result<T, RepositoryError>
    where
        T: DeserializeOwned,
    {
        let body = self.execute(request).await?;
        decode_payload(&body)
    }
}

#[async_trait]
impl ConversationRepository for HttpConversationRepository {
    async fn conversation(&self, id: &ConversationId) -> Result<Conversation, RepositoryError> {
        let url = self.url(&format!("conversations/{id}"));
        self.execute_json(self.client.get(url)).await
    }

    async fn fetch_messages(
        &self,
        id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError> {
        let url = self.url(&format!("conversations/{id}/messages"));
        let request = self.client.get(url).query(&[("limit", limit)]);
        self.execute_json(request).await
    }

    async fn send_message(&self, request: &SendMessageRequest) -> Result<Message, RepositoryError> {
        let http = self.client.post(self.url("messages")).json(request);
        self.execute_json(http).await
    }

    async fn mark_messages_as_read(
        &self,
        id: &ConversationId,
        message_ids: &[MessageId],
    ) -> Result<(), RepositoryError> {
        let body = MarkReadBody {
            conversation_id: id,
            message_ids,
        };
        let request = self.client.post(self.url("messages/read")).json(&body);
        self.execute(request).await.map(|_| ())
    }
}

fn map_status(status: StatusCode) -> RepositoryError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RepositoryError::Unauthorized,
        StatusCode::NOT_FOUND => RepositoryError::NotFound,
        _ => RepositoryError::Unavailable,
    }
}

fn request_failed(error: reqwest::Error) -> RepositoryError {
    tracing::warn!(
        code = API_REQUEST_FAILED,
        timeout = error.is_timeout(),
        connect = error.is_connect(),
        error = %error,
        "API request failed"
    );
    RepositoryError::Unavailable
}

fn decode_payload<T>(body: &str) -> Result<T, RepositoryError>
where
    T: DeserializeOwned,
{
    serde_json::from_str::<Payload<T>>(body)
        .map(Payload::into_inner)
        .map_err(|error| {
            tracing::warn!(code = API_BODY_INVALID, error = %error, "API body did not decode");
            RepositoryError::InvalidData
        })
}
