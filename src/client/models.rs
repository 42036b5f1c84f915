//! Client side chat state.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::public::chat::{HistoryItem, SavedMessage};
use crate::api::public::user::UserProfile;

use super::timestamp::TimestampKey;

pub type SharedChat = Arc<Mutex<ChatState>>;

/// Lock the shared chat state. A panic while holding the lock can't
/// leave it half written so poisoning is ignored.
pub fn lock(chat: &Mutex<ChatState>) -> MutexGuard<'_, ChatState> {
    chat.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageId {
    /// Client clock in milliseconds, for a message that hasn't been
    /// loaded from the server
    Local(i64),
    /// Server object id
    Remote(String),
}

impl MessageId {
    pub fn timestamp_key(&self) -> TimestampKey<'_> {
        match self {
            MessageId::Local(ms) => TimestampKey::Millis(*ms),
            MessageId::Remote(id) => TimestampKey::Text(id),
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageId::Local(ms) => write!(f, "{}", ms),
            MessageId::Remote(id) => f.write_str(id),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub prompt: String,
    /// Full response text, empty until the backend answers
    pub content: String,
    /// The part of `content` revealed so far
    pub revealed: String,
    /// Set while the response is still being revealed
    pub resume: bool,
}

impl Message {
    pub fn pending(id: MessageId, prompt: &str) -> Self {
        Self {
            id,
            prompt: prompt.to_string(),
            content: String::new(),
            revealed: String::new(),
            resume: false,
        }
    }
}

impl From<SavedMessage> for Message {
    fn from(saved: SavedMessage) -> Self {
        Self {
            id: MessageId::Remote(saved.id),
            prompt: saved.prompt,
            revealed: saved.content.clone(),
            content: saved.content,
            resume: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub chat_id: String,
    pub prompt: String,
    pub active: bool,
}

/// One revealed character. `first` marks the start of the response so
/// the receiver replaces instead of appending.
#[derive(Clone, Debug, PartialEq)]
pub struct RevealDelta {
    pub message_id: MessageId,
    pub ch: char,
    pub first: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Home,
    Chat(String),
    Login,
    NotFound,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => f.write_str("/"),
            Route::Chat(id) => write!(f, "/chat/{}", id),
            Route::Login => f.write_str("/login"),
            Route::NotFound => f.write_str("/404"),
        }
    }
}

#[derive(Default, Debug)]
pub struct ChatState {
    pub user: Option<UserProfile>,
    pub conversation_id: Option<String>,
    pub messages: Vec<Message>,
    pub history: Vec<HistoryEntry>,
}

impl ChatState {
    pub fn shared() -> SharedChat {
        Arc::new(Mutex::new(Self::default()))
    }

    pub fn latest(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn message_mut(&mut self, id: &MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().rev().find(|m| m.id == *id)
    }

    /// Write one revealed character into the message's revealed
    /// prefix. Returns `false` when the message is gone.
    pub fn apply_delta(&mut self, delta: &RevealDelta) -> bool {
        let Some(message) = self.message_mut(&delta.message_id) else {
            return false;
        };
        if delta.first {
            message.revealed = delta.ch.to_string();
        } else {
            message.revealed.push(delta.ch);
        }
        message.resume = true;
        true
    }

    /// Mark the message as being revealed.
    pub fn begin(&mut self, id: &MessageId) {
        if let Some(message) = self.message_mut(id) {
            message.resume = true;
        }
    }

    /// Mark the message as no longer being revealed.
    pub fn finish(&mut self, id: &MessageId) {
        if let Some(message) = self.message_mut(id) {
            message.resume = false;
        }
    }

    pub fn set_history(&mut self, items: Vec<HistoryItem>) {
        self.history = items
            .into_iter()
            .map(|item| HistoryEntry {
                active: self.conversation_id.as_deref() == Some(item.chat_id.as_str()),
                chat_id: item.chat_id,
                prompt: item.prompt,
            })
            .collect();
    }

    pub fn set_active(&mut self, chat_id: Option<&str>) {
        self.conversation_id = chat_id.map(String::from);
        for entry in self.history.iter_mut() {
            entry.active = chat_id == Some(entry.chat_id.as_str());
        }
    }

    /// Forget the open conversation.
    pub fn reset_conversation(&mut self) {
        self.messages.clear();
        self.set_active(None);
    }

    /// Forget everything tied to the signed in user.
    pub fn sign_out(&mut self) {
        self.reset_conversation();
        self.history.clear();
        self.user = None;
    }
}
