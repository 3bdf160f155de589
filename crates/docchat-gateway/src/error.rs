use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("cannot listen on {0}")]
    Bind(String, #[source] std::io::Error),

    #[error("chat server stopped: {0}")]
    Server(String),
}
