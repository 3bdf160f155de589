//! LLM provider abstraction and the Gemini backend.

pub mod any;
pub mod error;
pub mod gemini;
pub(crate) mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod provider;
pub(crate) mod retry;

pub use any::AnyProvider;
pub use error::LlmError;
pub use provider::{ImageData, LlmProvider, Message, MessagePart, Role};
