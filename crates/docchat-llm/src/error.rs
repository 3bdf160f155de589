#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rate limited")]
    RateLimited,

    #[error("{provider} API request failed (status {status})")]
    Api {
        provider: &'static str,
        status: u16,
    },

    #[error("embedding count mismatch: sent {expected} texts, got {actual} vectors")]
    EmbeddingMismatch { expected: usize, actual: usize },

    #[error("{0}")]
    Other(String),
}
