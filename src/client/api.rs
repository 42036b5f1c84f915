//! Calls from the chat client to the backend API.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use http::header;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::config::ClientConfig;
use super::error::ChatError;
use crate::api::SESSION_COOKIE;
use crate::api::public::Envelope;
use crate::api::public::chat::{
    CreateChatRequest, CreatedChat, HistoryItem, SavedMessage, UpdateChatRequest, UpdatedChat,
};
use crate::api::public::user::UserProfile;

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Start a new conversation with its first prompt.
    async fn create(&self, prompt: &str) -> Result<CreatedChat, ChatError>;

    /// Add a prompt to an existing conversation.
    async fn update(&self, prompt: &str, chat_id: &str) -> Result<UpdatedChat, ChatError>;

    async fn history(&self) -> Result<Vec<HistoryItem>, ChatError>;

    async fn saved(&self, chat_id: &str) -> Result<Vec<SavedMessage>, ChatError>;

    async fn delete_all(&self) -> Result<(), ChatError>;

    async fn check_logged(&self) -> Result<UserProfile, ChatError>;

    /// Forget the local session credentials.
    fn clear_session(&self);
}

/// `ChatBackend` over HTTP, authenticating with the session cookie.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: RwLock::new(config.session_token.clone()),
        })
    }

    pub fn has_session(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_session(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match token {
            Some(token) => request.header(header::COOKIE, format!("{}={}", SESSION_COOKIE, token)),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ChatError> {
        let response = self.with_session(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body: Value = response.json().await.unwrap_or(Value::Null);
        let err = ChatError::from_status(
            status.as_u16(),
            body["message"].as_str(),
            body["reason"].as_str(),
        );
        tracing::debug!("Backend responded {}: {}", status, err);
        Err(err)
    }

    async fn data<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ChatError> {
        let envelope: Envelope<T> = self.send(request).await?.json().await?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn create(&self, prompt: &str) -> Result<CreatedChat, ChatError> {
        let body = CreateChatRequest {
            prompt: prompt.to_string(),
        };
        self.data(self.client.post(self.url("/api/chat")).json(&body))
            .await
    }

    async fn update(&self, prompt: &str, chat_id: &str) -> Result<UpdatedChat, ChatError> {
        let body = UpdateChatRequest {
            prompt: prompt.to_string(),
            chat_id: chat_id.to_string(),
        };
        self.data(self.client.put(self.url("/api/chat")).json(&body))
            .await
    }

    async fn history(&self) -> Result<Vec<HistoryItem>, ChatError> {
        self.data(self.client.get(self.url("/api/chat/history")))
            .await
    }

    async fn saved(&self, chat_id: &str) -> Result<Vec<SavedMessage>, ChatError> {
        self.data(
            self.client
                .get(self.url("/api/chat/saved"))
                .query(&[("chatId", chat_id)]),
        )
        .await
    }

    async fn delete_all(&self) -> Result<(), ChatError> {
        self.send(self.client.delete(self.url("/api/chat/all")))
            .await?;
        Ok(())
    }

    async fn check_logged(&self) -> Result<UserProfile, ChatError> {
        self.data(self.client.post(self.url("/api/user/checkLogged")))
            .await
    }

    fn clear_session(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
