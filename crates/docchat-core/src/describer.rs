use docchat_llm::{AnyProvider, ImageData, LlmError, LlmProvider, Message};

use crate::prompts::IMAGE_EXTRACTION_PROMPT;

pub const NO_TEXT_EXTRACTED: &str = "No text extracted.";
pub const NO_IMAGE_RESPONSE: &str = "No relevant response from the image.";

/// Vision calls: describe an uploaded image, or answer a question about it.
#[derive(Debug, Clone)]
pub struct ImageDescriber {
    provider: AnyProvider,
}

impl ImageDescriber {
    #[must_use]
    pub fn new(provider: AnyProvider) -> Self {
        Self { provider }
    }

    /// # Errors
    ///
    /// Returns an error if the model call fails. An empty reply is not an error.
    pub async fn describe(&self, image: &ImageData) -> Result<String, LlmError> {
        self.ask_image(IMAGE_EXTRACTION_PROMPT, image, NO_TEXT_EXTRACTED)
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the model call fails.
    pub async fn query(&self, image: &ImageData, question: &str) -> Result<String, LlmError> {
        self.ask_image(question, image, NO_IMAGE_RESPONSE).await
    }

    async fn ask_image(
        &self,
        prompt: &str,
        image: &ImageData,
        fallback: &str,
    ) -> Result<String, LlmError> {
        if !self.provider.supports_vision() {
            tracing::warn!(provider = self.provider.name(), "provider does not advertise vision support");
        }
        let reply = self
            .provider
            .chat(&[Message::user_with_image(prompt, image.clone())])
            .await?;
        let reply = reply.trim();
        Ok(if reply.is_empty() {
            fallback.to_owned()
        } else {
            reply.to_owned()
        })
    }
}
