//! Configuration, conversation chain, and the per-session orchestrator.

pub mod chain;
pub mod config;
pub mod describer;
pub mod error;
pub mod memory;
pub mod orchestrator;
pub mod prompts;
pub mod secrets;
pub mod session;

pub use chain::{ChainAnswer, ConversationChain};
pub use config::Config;
pub use describer::ImageDescriber;
pub use error::{ChainError, TurnError};
pub use orchestrator::Orchestrator;
pub use session::{Attachment, IncomingMessage, Reply, Session, SessionState};
