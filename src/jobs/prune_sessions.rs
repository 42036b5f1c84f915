use async_trait::async_trait;
use std::time::Duration;
use tokio_rusqlite::Connection;

use super::PeriodicJob;
use crate::api::routes::user::db::prune_sessions;
use crate::core::AppConfig;

/// Removes session tokens older than the configured TTL. The auth
/// extractor already rejects them; this keeps the table from growing.
#[derive(Debug)]
pub struct PruneExpiredSessions;

#[async_trait]
impl PeriodicJob for PruneExpiredSessions {
    fn interval(&self) -> Duration {
        // Run every hour
        Duration::from_secs(60 * 60)
    }

    async fn run_job(&self, config: &AppConfig, db: &Connection) {
        match prune_sessions(db, config.session_ttl_hours).await {
            Ok(0) => {}
            Ok(count) => tracing::info!("Pruned {} expired sessions", count),
            Err(e) => tracing::error!("Failed to prune expired sessions: {}", e),
        }
    }
}
