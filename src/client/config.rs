use std::env;
use std::time::Duration;

/// Default period between two revealed characters.
pub const REVEAL_PERIOD: Duration = Duration::from_millis(20);

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: String,
    pub session_token: Option<String>,
    pub reveal_period: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let api_url =
            env::var("IGUANA_API_URL").unwrap_or_else(|_| "http://localhost:5000".to_string());
        let session_token = env::var("IGUANA_SESSION_TOKEN").ok();
        let reveal_period = env::var("IGUANA_REVEAL_MS")
            .ok()
            .and_then(|ms| ms.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(REVEAL_PERIOD);

        Self {
            api_url,
            session_token,
            reveal_period,
            request_timeout: Duration::from_secs(30),
        }
    }
}
