use anyhow::{Error, Result};
use chrono::Utc;
use rusqlite::OptionalExtension;
use tokio_rusqlite::{Connection, params};

use super::public;
use crate::core::object_id::object_id_at;

/// Create a new chat owned by `user_id` with its first exchange.
/// Returns the chat id.
pub async fn create_chat(
    db: &Connection,
    user_id: i64,
    prompt: &str,
    content: &str,
) -> Result<String, Error> {
    let now = Utc::now().timestamp();
    let chat_id = object_id_at(now);
    let message_id = object_id_at(now);
    let c_id = chat_id.clone();
    let prompt = prompt.to_owned();
    let content = content.to_owned();

    db.call(move |conn| {
        // The chat and its first message are written together so a
        // chat never exists without a title
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO chat (id, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![c_id, user_id, now],
        )?;
        tx.execute(
            "INSERT INTO chat_message (id, chat_id, prompt, content, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![message_id, c_id, prompt, content, now],
        )?;
        tx.commit()?;
        Ok(())
    })
    .await?;

    Ok(chat_id)
}

pub async fn chat_exists(db: &Connection, user_id: i64, chat_id: &str) -> Result<bool, Error> {
    let c_id = chat_id.to_owned();
    let found = db
        .call(move |conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM chat WHERE id = ?1 AND user_id = ?2",
                    params![c_id, user_id],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await?;

    Ok(found)
}

/// Append an exchange to an existing chat. Returns `false` when the
/// chat doesn't exist or belongs to another user.
pub async fn append_message(
    db: &Connection,
    user_id: i64,
    chat_id: &str,
    prompt: &str,
    content: &str,
) -> Result<bool, Error> {
    let now = Utc::now().timestamp();
    let message_id = object_id_at(now);
    let c_id = chat_id.to_owned();
    let prompt = prompt.to_owned();
    let content = content.to_owned();

    let inserted = db
        .call(move |conn| {
            let inserted = conn.execute(
                r#"
                INSERT INTO chat_message (id, chat_id, prompt, content, created_at)
                SELECT ?1, c.id, ?3, ?4, ?5 FROM chat c WHERE c.id = ?2 AND c.user_id = ?6
                "#,
                params![message_id, c_id, prompt, content, now, user_id],
            )?;
            Ok(inserted)
        })
        .await?;

    Ok(inserted == 1)
}

/// List the user's chats, most recent first, titled by their first
/// prompt.
pub async fn chat_history(db: &Connection, user_id: i64) -> Result<Vec<public::HistoryItem>, Error> {
    let history = db
        .call(move |conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT c.id,
                       (SELECT m.prompt FROM chat_message m
                        WHERE m.chat_id = c.id
                        ORDER BY m.rowid ASC LIMIT 1) AS prompt
                FROM chat c
                WHERE c.user_id = ?1
                ORDER BY c.created_at DESC, c.rowid DESC
                "#,
            )?;
            let rows = stmt
                .query_map([user_id], |row| {
                    let prompt: Option<String> = row.get(1)?;
                    Ok(public::HistoryItem {
                        chat_id: row.get(0)?,
                        prompt: prompt.unwrap_or_default(),
                    })
                })?
                .filter_map(Result::ok)
                .collect::<Vec<_>>();
            Ok(rows)
        })
        .await?;

    Ok(history)
}

/// Messages of a chat in the order they were written. `None` when the
/// chat doesn't exist for this user.
pub async fn saved_messages(
    db: &Connection,
    user_id: i64,
    chat_id: &str,
) -> Result<Option<Vec<public::SavedMessage>>, Error> {
    if !chat_exists(db, user_id, chat_id).await? {
        return Ok(None);
    }

    let c_id = chat_id.to_owned();
    let messages = db
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, prompt, content FROM chat_message WHERE chat_id = ?1 ORDER BY rowid ASC",
            )?;
            let rows = stmt
                .query_map([c_id], |row| {
                    Ok(public::SavedMessage {
                        id: row.get(0)?,
                        prompt: row.get(1)?,
                        content: row.get(2)?,
                    })
                })?
                .filter_map(Result::ok)
                .collect::<Vec<_>>();
            Ok(rows)
        })
        .await?;

    Ok(Some(messages))
}

/// Delete every chat (and their messages) owned by the user.
pub async fn delete_all_chats(db: &Connection, user_id: i64) -> Result<usize, Error> {
    let deleted = db
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM chat_message WHERE chat_id IN (SELECT id FROM chat WHERE user_id = ?1)",
                [user_id],
            )?;
            let deleted = tx.execute("DELETE FROM chat WHERE user_id = ?1", [user_id])?;
            tx.commit()?;
            Ok(deleted)
        })
        .await?;

    Ok(deleted)
}
