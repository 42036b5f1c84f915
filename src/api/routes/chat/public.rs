//! Public types for the chat API
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CreateChatRequest {
    pub prompt: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChatRequest {
    pub prompt: String,
    pub chat_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CreatedChat {
    #[serde(rename = "_id")]
    pub id: String,
    pub content: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UpdatedChat {
    pub content: String,
}

/// One conversation in the history list. The first prompt doubles as
/// the title.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub chat_id: String,
    pub prompt: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SavedMessage {
    pub id: String,
    pub prompt: String,
    pub content: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQuery {
    pub chat_id: String,
}
