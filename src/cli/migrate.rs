use anyhow::{Result, anyhow};

use crate::core::AppConfig;
use crate::core::db::{async_db, migrate_db};

pub async fn run(db: bool) -> Result<()> {
    if !db {
        return Err(anyhow!("Missing value for migrate \"--db\""));
    }

    let config = AppConfig::default();
    println!("Migrating db...");
    let db = async_db(&config.db_path).await?;
    db.call(|conn| {
        migrate_db(conn)?;
        Ok(())
    })
    .await?;
    println!("Finished migrating db");

    Ok(())
}
