use std::env;
use std::str::FromStr;

use crate::llm::Provider;

pub const DEFAULT_PROMPT_TEMPLATE: &str = "\nExplain briefly using bullet points:\n\n{prompt}\n";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub storage_path: String,
    pub db_path: String,
    pub llm_provider: Provider,
    pub llm_api_hostname: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub prompt_template: String,
    pub session_ttl_hours: i64,
}

impl AppConfig {
    /// Wraps the user's prompt in the configured template before it is
    /// sent upstream.
    pub fn build_prompt(&self, prompt: &str) -> String {
        self.prompt_template.replace("{prompt}", prompt)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let storage_path = env::var("IGUANA_STORAGE_PATH").unwrap_or("./".to_string());
        let db_path = format!("{}/db", storage_path);
        let llm_provider = env::var("IGUANA_LLM_PROVIDER")
            .ok()
            .and_then(|p| Provider::from_str(&p).ok())
            .unwrap_or(Provider::Gemini);
        let llm_api_hostname = env::var("IGUANA_LLM_HOST").unwrap_or_else(|_| match llm_provider {
            Provider::Gemini => "https://generativelanguage.googleapis.com".to_string(),
            Provider::OpenAi => "https://api.openai.com".to_string(),
        });
        let llm_api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .unwrap_or_else(|_| "missing-api-key".to_string());
        let llm_model = env::var("GEMINI_MODEL").unwrap_or_else(|_| match llm_provider {
            Provider::Gemini => "gemini-1.0-pro".to_string(),
            Provider::OpenAi => "gpt-4.1-mini".to_string(),
        });
        let prompt_template = env::var("IGUANA_PROMPT_TEMPLATE")
            .unwrap_or_else(|_| DEFAULT_PROMPT_TEMPLATE.to_string());
        let session_ttl_hours = env::var("IGUANA_SESSION_TTL_HOURS")
            .ok()
            .and_then(|h| h.parse().ok())
            .unwrap_or(24);

        Self {
            storage_path,
            db_path,
            llm_provider,
            llm_api_hostname,
            llm_api_key,
            llm_model,
            prompt_template,
            session_ttl_hours,
        }
    }
}
