//! Router for the chat API

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get},
};
use axum_extra::extract::Query;
use serde_json::{Value, json};

use super::db::{
    append_message, chat_exists, chat_history, create_chat, delete_all_chats, saved_messages,
};
use super::public;
use crate::api::auth::CurrentUser;
use crate::api::public::{ApiError, Envelope};
use crate::api::state::AppState;

type SharedState = Arc<AppState>;

fn validate_prompt(prompt: &str) -> Result<(), ApiError> {
    if prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("Prompt is empty".to_string()));
    }
    Ok(())
}

async fn version() -> &'static str {
    "Chat API v1"
}

/// Start a new chat with the first prompt
async fn create_handler(
    State(state): State<SharedState>,
    user: CurrentUser,
    Json(payload): Json<public::CreateChatRequest>,
) -> Result<Json<Envelope<public::CreatedChat>>, ApiError> {
    validate_prompt(&payload.prompt)?;

    let content = state
        .llm
        .generate(&state.config.build_prompt(&payload.prompt))
        .await
        .map_err(ApiError::from_completion)?;
    let chat_id = create_chat(&state.db, user.id, &payload.prompt, &content).await?;
    tracing::debug!("Created chat {} for user {}", chat_id, user.id);

    Ok(Json(Envelope::ok(public::CreatedChat {
        id: chat_id,
        content,
    })))
}

/// Add the next prompt to an existing chat
async fn update_handler(
    State(state): State<SharedState>,
    user: CurrentUser,
    Json(payload): Json<public::UpdateChatRequest>,
) -> Result<Json<Envelope<public::UpdatedChat>>, ApiError> {
    validate_prompt(&payload.prompt)?;

    // Check ownership before spending a completion on it
    if !chat_exists(&state.db, user.id, &payload.chat_id).await? {
        return Err(ApiError::NotFound(format!(
            "Chat {} not found",
            payload.chat_id
        )));
    }

    let content = state
        .llm
        .generate(&state.config.build_prompt(&payload.prompt))
        .await
        .map_err(ApiError::from_completion)?;

    // The chat can be deleted while the completion is running
    if !append_message(&state.db, user.id, &payload.chat_id, &payload.prompt, &content).await? {
        return Err(ApiError::NotFound(format!(
            "Chat {} not found",
            payload.chat_id
        )));
    }

    Ok(Json(Envelope::ok(public::UpdatedChat { content })))
}

/// List the user's chats
async fn history_handler(
    State(state): State<SharedState>,
    user: CurrentUser,
) -> Result<Json<Envelope<Vec<public::HistoryItem>>>, ApiError> {
    let history = chat_history(&state.db, user.id).await?;
    Ok(Json(Envelope::ok(history)))
}

/// Get the messages of a single chat
async fn saved_handler(
    State(state): State<SharedState>,
    user: CurrentUser,
    Query(params): Query<public::SavedQuery>,
) -> Result<Json<Envelope<Vec<public::SavedMessage>>>, ApiError> {
    match saved_messages(&state.db, user.id, &params.chat_id).await? {
        Some(messages) => Ok(Json(Envelope::ok(messages))),
        None => Err(ApiError::NotFound(format!(
            "Chat {} not found",
            params.chat_id
        ))),
    }
}

/// Delete all of the user's chats
async fn delete_all_handler(
    State(state): State<SharedState>,
    user: CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let deleted = delete_all_chats(&state.db, user.id).await?;
    tracing::info!("Deleted {} chats for user {}", deleted, user.id);
    Ok(Json(json!({ "status": 200, "message": "Deleted" })))
}

/// Create the chat router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/",
            get(version).post(create_handler).put(update_handler),
        )
        .route("/history", get(history_handler))
        .route("/saved", get(saved_handler))
        .route("/all", delete(delete_all_handler))
}
