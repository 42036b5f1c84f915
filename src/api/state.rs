use tokio_rusqlite::Connection;

use crate::core::AppConfig;
use crate::llm::CompletionClient;

pub struct AppState {
    pub db: Connection,
    pub config: AppConfig,
    pub llm: CompletionClient,
}

impl AppState {
    pub fn new(db: Connection, config: AppConfig) -> Self {
        let llm = CompletionClient::from_config(&config);
        Self { db, config, llm }
    }
}
