use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use tokio_rusqlite::Connection;

use crate::core::AppConfig;

mod prune_sessions;
pub use prune_sessions::PruneExpiredSessions;

#[async_trait]
pub trait PeriodicJob: Debug + Send + Sync + 'static {
    /// How long to wait between runs
    fn interval(&self) -> Duration;

    async fn run_job(&self, config: &AppConfig, db: &Connection);
}

/// Run `job` forever in its own task, once per interval starting
/// immediately.
pub fn spawn_periodic_job<J: PeriodicJob>(config: AppConfig, db: Connection, job: J) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(job.interval());
        loop {
            interval.tick().await;
            tracing::debug!("Running periodic job {:?}", job);
            job.run_job(&config, &db).await;
        }
    });
}
