use std::path::Path;

use anyhow::{Error, Result};
use rusqlite::Connection as SyncConnection;
use tokio_rusqlite::Connection;

const DB_FILE_NAME: &str = "iguana.sqlite3";

/// Open the async connection to the database stored in the `db_path`
/// directory.
pub async fn async_db(db_path: &str) -> Result<Connection, Error> {
    let file = Path::new(db_path).join(DB_FILE_NAME);
    let db = Connection::open(file).await?;
    db.call(|conn| {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(())
    })
    .await?;
    Ok(db)
}

pub fn initialize_db(conn: &SyncConnection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS user (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            name TEXT,
            created_at INTEGER NOT NULL DEFAULT (unixepoch())
        );

        CREATE TABLE IF NOT EXISTS user_session (
            token TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            created_at INTEGER NOT NULL DEFAULT (unixepoch())
        );

        CREATE TABLE IF NOT EXISTS chat (
            id TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            created_at INTEGER NOT NULL DEFAULT (unixepoch())
        );

        CREATE TABLE IF NOT EXISTS chat_message (
            id TEXT PRIMARY KEY,
            chat_id TEXT NOT NULL REFERENCES chat(id) ON DELETE CASCADE,
            prompt TEXT NOT NULL,
            content TEXT NOT NULL,
            created_at INTEGER NOT NULL DEFAULT (unixepoch())
        );
        "#,
    )?;
    migrate_db(conn)
}

/// Idempotent schema changes applied on top of `initialize_db`.
pub fn migrate_db(conn: &SyncConnection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE INDEX IF NOT EXISTS idx_chat_user ON chat(user_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_chat_message_chat ON chat_message(chat_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_user_session_user ON user_session(user_id);
        "#,
    )
}
