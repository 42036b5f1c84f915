use thiserror::Error;

/// Everything that can go wrong between submitting a prompt and
/// having a response to reveal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("Prompt is empty")]
    EmptyPrompt,
    #[error("There is no failed prompt to retry")]
    NothingToRetry,
    #[error("Session expired, log in again")]
    AuthExpired,
    #[error("Conversation not found")]
    NotFound,
    #[error("The model returned no text ({reason})")]
    UpstreamEmpty { reason: String },
    #[error("Request failed: {0}")]
    NetworkOrServerError(String),
    #[error("Failed to refresh history: {0}")]
    HistoryRefreshFailed(String),
}

impl ChatError {
    /// Map an unsuccessful backend response to an error. Only 401 means
    /// the session is gone.
    pub fn from_status(status: u16, message: Option<&str>, reason: Option<&str>) -> Self {
        match status {
            401 => ChatError::AuthExpired,
            404 => ChatError::NotFound,
            502 => ChatError::UpstreamEmpty {
                reason: reason.unwrap_or("empty").to_string(),
            },
            _ => ChatError::NetworkOrServerError(match message {
                Some(message) => format!("{} {}", status, message),
                None => status.to_string(),
            }),
        }
    }

    /// Errors the user can recover from by sending the same prompt again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ChatError::UpstreamEmpty { .. } | ChatError::NetworkOrServerError(_)
        )
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::NetworkOrServerError(err.to_string())
    }
}
