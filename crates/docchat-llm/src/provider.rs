use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Boxed future returned by embedding closures handed to the index layer.
pub type EmbedFuture = Pin<Box<dyn Future<Output = Result<Vec<Vec<f32>>, LlmError>> + Send>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Raw image payload sent to vision-capable models.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl ImageData {
    #[must_use]
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }
}

impl std::fmt::Debug for ImageData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageData")
            .field("bytes", &self.data.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessagePart {
    Text { text: String },
    Image(ImageData),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<MessagePart>,
}

impl Message {
    #[must_use]
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![MessagePart::Text { text: text.into() }],
        }
    }

    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::text(Role::User, text)
    }

    /// A user message carrying an instruction followed by an image.
    #[must_use]
    pub fn user_with_image(text: impl Into<String>, image: ImageData) -> Self {
        Self {
            role: Role::User,
            parts: vec![
                MessagePart::Text { text: text.into() },
                MessagePart::Image(image),
            ],
        }
    }

    /// Concatenated text parts, ignoring images.
    #[must_use]
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                MessagePart::Text { text } => Some(text.as_str()),
                MessagePart::Image(_) => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    #[must_use]
    pub fn has_image(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, MessagePart::Image(_)))
    }
}

pub trait LlmProvider: Send + Sync {
    /// Send messages to the model and return the generated text.
    ///
    /// An empty string means the model produced no text; callers decide which
    /// sentinel to show.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails to communicate or the response is invalid.
    fn chat(&self, messages: &[Message]) -> impl Future<Output = Result<String, LlmError>> + Send;

    /// Embed a batch of texts, returning one vector per input in input order.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedding request fails or the vector count does
    /// not match the input count.
    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Result<Vec<Vec<f32>>, LlmError>> + Send;

    fn name(&self) -> &str;

    fn supports_vision(&self) -> bool {
        false
    }
}
