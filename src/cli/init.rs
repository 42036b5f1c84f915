use anyhow::{Result, anyhow};
use std::fs;

use crate::core::AppConfig;
use crate::core::db::{async_db, initialize_db};

pub async fn run(db: bool) -> Result<()> {
    if !db {
        return Err(anyhow!("Missing value for init \"--db\""));
    }

    let config = AppConfig::default();
    println!("Initializing db...");
    fs::create_dir_all(&config.db_path)
        .unwrap_or_else(|err| println!("Ignoring DB directory create failed: {}", err));

    let db = async_db(&config.db_path).await?;
    db.call(|conn| {
        initialize_db(conn)?;
        Ok(())
    })
    .await?;
    println!("Finished initializing db");

    Ok(())
}
