use anyhow::Result;

use crate::api::routes::user::db::{create_session, get_or_create_user};
use crate::core::AppConfig;
use crate::core::db::async_db;

/// Prints a session token for `email`. Use it as `IGUANA_SESSION_TOKEN`
/// or as the `userToken` cookie.
pub async fn run(email: &str, name: Option<&str>) -> Result<()> {
    let config = AppConfig::default();
    let db = async_db(&config.db_path).await?;

    let user_id = get_or_create_user(&db, email, name).await?;
    let token = create_session(&db, user_id).await?;
    eprintln!(
        "Session for {} expires in {} hours",
        email.trim().to_lowercase(),
        config.session_ttl_hours
    );
    println!("{}", token);

    Ok(())
}
