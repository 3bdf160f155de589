use std::path::PathBuf;

use docchat_llm::ImageData;
use docchat_memory::SessionIndex;
use uuid::Uuid;

use crate::chain::ConversationChain;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing indexed yet.
    Empty,
    Indexed,
}

/// Per-conversation state, mutated only by the orchestrator.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    pub(crate) index: Option<SessionIndex>,
    pub(crate) chain: Option<ConversationChain>,
    pub(crate) pending_image: Option<ImageData>,
    pub(crate) ended: bool,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            index: None,
            chain: None,
            pending_image: None,
            ended: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.index.is_some() {
            SessionState::Indexed
        } else {
            SessionState::Empty
        }
    }

    #[must_use]
    pub fn index(&self) -> Option<&SessionIndex> {
        self.index.as_ref()
    }

    #[must_use]
    pub fn chain(&self) -> Option<&ConversationChain> {
        self.chain.as_ref()
    }

    #[must_use]
    pub fn pending_image(&self) -> Option<&ImageData> {
        self.pending_image.as_ref()
    }

    /// Set by `Orchestrator::end_session`; an ended session takes no more turns.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// An uploaded file already written to local disk.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Original file name as sent by the client.
    pub name: String,
    pub path: PathBuf,
    /// Declared mime type; may be missing or unreliable.
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct IncomingMessage {
    pub content: String,
    pub attachments: Vec<Attachment>,
}

impl IncomingMessage {
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            attachments: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_attachments(attachments: Vec<Attachment>) -> Self {
        Self {
            content: String::new(),
            attachments,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// Source tags of the chunks an answer was built from.
    pub sources: Vec<String>,
}

impl Reply {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_empty() {
        let session = Session::new();
        assert_eq!(session.state(), SessionState::Empty);
        assert!(session.pending_image().is_none());
        assert!(session.chain().is_none());
        assert_ne!(session.id(), Session::new().id());
    }
}
