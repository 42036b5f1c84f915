use anyhow::Result;

use crate::api::init_tracing;
use crate::core::AppConfig;
use crate::core::db::async_db;
use crate::jobs::{PeriodicJob, PruneExpiredSessions};

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum JobId {
    PruneSessions,
}

pub async fn run(id: JobId) -> Result<()> {
    init_tracing(&format!("{}=debug", env!("CARGO_CRATE_NAME")));

    let config = AppConfig::default();
    let db = async_db(&config.db_path).await?;

    let job: Box<dyn PeriodicJob> = match id {
        JobId::PruneSessions => Box::new(PruneExpiredSessions),
    };

    println!("Running job: {:?}", id);
    job.run_job(&config, &db).await;
    println!("Job completed");

    Ok(())
}
