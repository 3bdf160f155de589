use docchat_llm::LlmError;
use docchat_memory::IndexError;

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("retrieval failed: {0}")]
    Retrieval(#[from] IndexError),
}

/// Failure of one orchestrator turn. Never shown to the user verbatim.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Chain(#[from] ChainError),
}
