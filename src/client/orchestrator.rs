//! Drives a chat view: sends prompts to the backend, keeps the chat
//! state current and hands responses to the reveal engine.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::api::ChatBackend;
use super::error::ChatError;
use super::models::{Message, MessageId, Route, SharedChat, lock};
use super::reveal::{RevealEngine, RevealState};
use super::timestamp::now_ms;
use crate::api::public::user::UserProfile;

/// Where the client should go next. Implemented by whatever hosts the
/// chat view.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Nothing submitted yet
    Idle,
    /// Waiting on the backend
    Loading,
    /// A response arrived (it may still be revealing)
    Ready,
    /// The last submit failed and can be retried
    Failed { message_id: MessageId, prompt: String },
}

pub struct Orchestrator {
    backend: Arc<dyn ChatBackend>,
    navigator: Arc<dyn Navigator>,
    chat: SharedChat,
    engine: RevealEngine,
    phase: Phase,
    refresh: Option<JoinHandle<()>>,
}

impl Orchestrator {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        navigator: Arc<dyn Navigator>,
        chat: SharedChat,
        engine: RevealEngine,
    ) -> Self {
        Self {
            backend,
            navigator,
            chat,
            engine,
            phase: Phase::Idle,
            refresh: None,
        }
    }

    pub fn chat(&self) -> &SharedChat {
        &self.chat
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn reveal_state(&self) -> RevealState {
        self.engine.state()
    }

    pub fn watch_reveal(&self) -> watch::Receiver<RevealState> {
        self.engine.subscribe()
    }

    /// Send `prompt` to the open conversation, or start a new one, and
    /// reveal the response. Returns the conversation id.
    pub async fn submit(&mut self, prompt: &str) -> Result<String, ChatError> {
        if prompt.trim().is_empty() {
            return Err(ChatError::EmptyPrompt);
        }

        self.engine.stop();
        let (message_id, conversation_id) = {
            let mut chat = lock(&self.chat);
            let message_id = next_local_id(&chat.messages);
            chat.messages
                .push(Message::pending(message_id.clone(), prompt));
            (message_id, chat.conversation_id.clone())
        };
        self.engine.clear();
        self.phase = Phase::Loading;

        let result = match &conversation_id {
            Some(chat_id) => self
                .backend
                .update(prompt, chat_id)
                .await
                .map(|updated| (chat_id.clone(), updated.content)),
            None => self
                .backend
                .create(prompt)
                .await
                .map(|created| (created.id, created.content)),
        };

        let (chat_id, content) = match result {
            Ok(response) => response,
            Err(err) => return Err(self.fail(err, message_id, prompt)),
        };

        {
            let mut chat = lock(&self.chat);
            if let Some(message) = chat.message_mut(&message_id) {
                message.content = content.clone();
            }
            chat.set_active(Some(&chat_id));
        }
        self.phase = Phase::Ready;
        self.engine.start(&content, message_id);
        self.spawn_history_refresh();

        if conversation_id.is_none() {
            self.navigator.navigate(Route::Chat(chat_id.clone()));
        }

        Ok(chat_id)
    }

    /// Send the prompt of the last failed submit again.
    pub async fn retry(&mut self) -> Result<String, ChatError> {
        let Phase::Failed { message_id, prompt } = self.phase.clone() else {
            return Err(ChatError::NothingToRetry);
        };

        // The failed exchange is replaced by the new attempt
        {
            let mut chat = lock(&self.chat);
            if let Some(pos) = chat.messages.iter().rposition(|m| m.id == message_id) {
                chat.messages.remove(pos);
            }
        }
        self.submit(&prompt).await
    }

    /// Reveal the last received response again without asking the
    /// backend. Returns `false` when there is nothing to reveal.
    pub fn regenerate(&mut self) -> bool {
        let latest = {
            let chat = lock(&self.chat);
            chat.messages
                .iter()
                .rev()
                .find(|m| !m.content.is_empty())
                .map(|m| (m.content.clone(), m.id.clone()))
        };
        match latest {
            Some((content, message_id)) => {
                self.engine.start(&content, message_id);
                true
            }
            None => false,
        }
    }

    pub fn stop(&mut self) {
        self.engine.stop();
    }

    /// Load a saved conversation.
    pub async fn open(&mut self, chat_id: &str) -> Result<(), ChatError> {
        self.engine.stop();
        self.phase = Phase::Loading;

        match self.backend.saved(chat_id).await {
            Ok(saved) => {
                {
                    let mut chat = lock(&self.chat);
                    chat.messages = saved.into_iter().map(Message::from).collect();
                    chat.set_active(Some(chat_id));
                }
                self.engine.clear();
                self.phase = Phase::Ready;
                Ok(())
            }
            Err(ChatError::NotFound) => {
                self.phase = Phase::Idle;
                self.navigator.navigate(Route::NotFound);
                Err(ChatError::NotFound)
            }
            Err(ChatError::AuthExpired) => {
                self.sign_out();
                Err(ChatError::AuthExpired)
            }
            Err(err) => {
                tracing::warn!("Failed to load chat {}: {}", chat_id, err);
                self.phase = Phase::Idle;
                Err(err)
            }
        }
    }

    /// Close the open conversation so the next submit starts a new one.
    pub fn new_chat(&mut self) {
        self.engine.stop();
        self.engine.clear();
        lock(&self.chat).reset_conversation();
        self.phase = Phase::Idle;
        self.navigator.navigate(Route::Home);
    }

    /// Delete every conversation of the user.
    pub async fn clear_all(&mut self) -> Result<(), ChatError> {
        match self.backend.delete_all().await {
            Ok(()) => {
                self.engine.stop();
                self.engine.clear();
                {
                    let mut chat = lock(&self.chat);
                    chat.reset_conversation();
                    chat.history.clear();
                }
                self.phase = Phase::Idle;
                self.navigator.navigate(Route::Home);
                Ok(())
            }
            Err(ChatError::AuthExpired) => {
                self.sign_out();
                Err(ChatError::AuthExpired)
            }
            Err(err) => Err(err),
        }
    }

    /// Check the session is still valid and remember who it belongs to.
    pub async fn restore_session(&mut self) -> Result<UserProfile, ChatError> {
        match self.backend.check_logged().await {
            Ok(user) => {
                lock(&self.chat).user = Some(user.clone());
                Ok(user)
            }
            Err(ChatError::AuthExpired) => {
                self.sign_out();
                Err(ChatError::AuthExpired)
            }
            Err(err) => Err(err),
        }
    }

    /// Reload the conversation list.
    pub async fn refresh_history(&mut self) -> Result<(), ChatError> {
        match refresh_history(self.backend.as_ref(), &self.chat).await {
            Err(ChatError::AuthExpired) => {
                self.sign_out();
                Err(ChatError::AuthExpired)
            }
            result => result,
        }
    }

    /// Wait for the background history refresh started by the last
    /// successful submit.
    pub async fn history_settled(&mut self) {
        if let Some(refresh) = self.refresh.take() {
            let _ = refresh.await;
        }
    }

    fn fail(&mut self, err: ChatError, message_id: MessageId, prompt: &str) -> ChatError {
        match err {
            ChatError::AuthExpired => {
                tracing::info!("Session expired, signing out");
                self.sign_out();
            }
            ChatError::NotFound => {
                tracing::warn!("Conversation is gone");
                lock(&self.chat).reset_conversation();
                self.phase = Phase::Idle;
                self.navigator.navigate(Route::NotFound);
            }
            ref err => {
                tracing::warn!("Chat request failed: {}", err);
                self.phase = Phase::Failed {
                    message_id,
                    prompt: prompt.to_string(),
                };
            }
        }
        err
    }

    fn sign_out(&mut self) {
        self.engine.stop();
        self.engine.clear();
        self.backend.clear_session();
        lock(&self.chat).sign_out();
        self.phase = Phase::Idle;
        self.navigator.navigate(Route::Login);
    }

    // Refreshing the history never blocks or fails the submit that
    // triggered it
    fn spawn_history_refresh(&mut self) {
        let backend = Arc::clone(&self.backend);
        let chat = Arc::clone(&self.chat);
        self.refresh = Some(tokio::spawn(async move {
            if let Err(err) = refresh_history(backend.as_ref(), &chat).await {
                let err = ChatError::HistoryRefreshFailed(err.to_string());
                tracing::warn!("{}", err);
            }
        }));
    }
}

// Local ids must stay unique within a conversation
fn next_local_id(messages: &[Message]) -> MessageId {
    let now = now_ms();
    let last = messages.iter().rev().find_map(|m| match m.id {
        MessageId::Local(ms) => Some(ms),
        MessageId::Remote(_) => None,
    });
    match last {
        Some(last) if last >= now => MessageId::Local(last + 1),
        _ => MessageId::Local(now),
    }
}

async fn refresh_history(backend: &dyn ChatBackend, chat: &SharedChat) -> Result<(), ChatError> {
    let items = backend.history().await?;
    lock(chat).set_history(items);
    Ok(())
}
