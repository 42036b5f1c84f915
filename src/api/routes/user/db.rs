use anyhow::{Error, Result};
use chrono::Utc;
use rusqlite::OptionalExtension;
use tokio_rusqlite::{Connection, params};
use uuid::Uuid;

/// A session row joined with its user.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub user_id: i64,
    pub email: String,
    pub name: Option<String>,
    pub created_at: i64,
}

impl SessionRecord {
    pub fn is_expired(&self, ttl_hours: i64) -> bool {
        Utc::now().timestamp() - self.created_at > ttl_hours * 60 * 60
    }
}

pub async fn get_or_create_user(
    db: &Connection,
    email: &str,
    name: Option<&str>,
) -> Result<i64, Error> {
    let email = email.trim().to_lowercase();
    let name = name.map(String::from);
    let user_id = db
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT OR IGNORE INTO user (email, name) VALUES (?1, ?2)",
                params![email, name],
            )?;
            let id: i64 =
                tx.query_row("SELECT id FROM user WHERE email = ?1", [&email], |row| {
                    row.get(0)
                })?;
            tx.commit()?;
            Ok(id)
        })
        .await?;

    Ok(user_id)
}

/// Issue a new opaque session token for the user.
pub async fn create_session(db: &Connection, user_id: i64) -> Result<String, Error> {
    let token = Uuid::new_v4().simple().to_string();
    let t = token.clone();
    let now = Utc::now().timestamp();
    db.call(move |conn| {
        conn.execute(
            "INSERT INTO user_session (token, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![t, user_id, now],
        )?;
        Ok(())
    })
    .await?;

    Ok(token)
}

pub async fn find_session(db: &Connection, token: &str) -> Result<Option<SessionRecord>, Error> {
    let token = token.to_owned();
    let session = db
        .call(move |conn| {
            let session = conn
                .query_row(
                    r#"
                    SELECT u.id, u.email, u.name, s.created_at
                    FROM user_session s
                    JOIN user u ON u.id = s.user_id
                    WHERE s.token = ?1
                    "#,
                    [token],
                    |row| {
                        Ok(SessionRecord {
                            user_id: row.get(0)?,
                            email: row.get(1)?,
                            name: row.get(2)?,
                            created_at: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(session)
        })
        .await?;

    Ok(session)
}

pub async fn delete_session(db: &Connection, token: &str) -> Result<usize, Error> {
    let token = token.to_owned();
    let deleted = db
        .call(move |conn| {
            let deleted = conn.execute("DELETE FROM user_session WHERE token = ?1", [token])?;
            Ok(deleted)
        })
        .await?;

    Ok(deleted)
}

/// Delete every session older than `ttl_hours`. Returns the number
/// of sessions removed.
pub async fn prune_sessions(db: &Connection, ttl_hours: i64) -> Result<usize, Error> {
    let cutoff = Utc::now().timestamp() - ttl_hours * 60 * 60;
    let deleted = db
        .call(move |conn| {
            let deleted =
                conn.execute("DELETE FROM user_session WHERE created_at < ?1", [cutoff])?;
            Ok(deleted)
        })
        .await?;

    Ok(deleted)
}
