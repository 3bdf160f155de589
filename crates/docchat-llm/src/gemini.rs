use std::fmt;

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message, MessagePart, Role};
use crate::retry::send_with_retry;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Upper bound on texts per `batchEmbedContents` request.
const MAX_EMBED_BATCH: usize = 100;

const PROVIDER: &str = "gemini";

#[derive(Clone)]
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    embedding_model: String,
    temperature: f32,
    max_retries: u32,
}

impl fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .field("temperature", &self.temperature)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl GeminiProvider {
    #[must_use]
    pub fn new(
        api_key: String,
        mut base_url: String,
        model: &str,
        embedding_model: &str,
        temperature: f32,
    ) -> Self {
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: crate::http::default_client(),
            api_key,
            base_url,
            model: strip_models_prefix(model).to_owned(),
            embedding_model: strip_models_prefix(embedding_model).to_owned(),
            temperature,
            max_retries: 3,
        }
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{model}:{method}", self.base_url)
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
        operation: &str,
    ) -> Result<String, LlmError> {
        let response = send_with_retry(PROVIDER, self.max_retries, || {
            self.client
                .post(url)
                .header("x-goog-api-key", &self.api_key)
                .header("Content-Type", "application/json")
                .json(body)
                .send()
        })
        .await?;

        let status = response.status();
        let text = response.text().await.map_err(LlmError::Http)?;

        if !status.is_success() {
            tracing::error!(operation, "Gemini API error {status}: {text}");
            return Err(LlmError::Api {
                provider: PROVIDER,
                status: status.as_u16(),
            });
        }

        Ok(text)
    }

    async fn embed_chunk(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let model_ref = format!("models/{}", self.embedding_model);
        let body = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|t| EmbedContentRequest {
                    model: &model_ref,
                    content: RequestContent {
                        role: None,
                        parts: vec![RequestPart::Text { text: t.clone() }],
                    },
                })
                .collect(),
        };

        let url = self.endpoint(&self.embedding_model, "batchEmbedContents");
        let text = self.post_json(&url, &body, "embed").await?;
        let resp: BatchEmbedResponse = serde_json::from_str(&text)?;

        if resp.embeddings.len() != texts.len() {
            return Err(LlmError::EmbeddingMismatch {
                expected: texts.len(),
                actual: resp.embeddings.len(),
            });
        }

        Ok(resp.embeddings.into_iter().map(|e| e.values).collect())
    }
}

fn strip_models_prefix(model: &str) -> &str {
    model.strip_prefix("models/").unwrap_or(model)
}

impl LlmProvider for GeminiProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        let body = build_generate_request(messages, self.temperature);
        let url = self.endpoint(&self.model, "generateContent");
        let text = self.post_json(&url, &body, "generate").await?;
        let resp: GenerateContentResponse = serde_json::from_str(&text)?;

        if let Some(reason) = resp
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            tracing::warn!("Gemini blocked the prompt: {reason}");
        }

        Ok(resp.first_text())
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_EMBED_BATCH) {
            vectors.extend(self.embed_chunk(batch).await?);
        }
        tracing::debug!(count = vectors.len(), "computed Gemini embeddings");
        Ok(vectors)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        PROVIDER
    }

    fn supports_vision(&self) -> bool {
        true
    }
}

fn build_generate_request(messages: &[Message], temperature: f32) -> GenerateContentRequest {
    let system_text: Vec<String> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(Message::text_content)
        .filter(|t| !t.is_empty())
        .collect();

    let system_instruction = if system_text.is_empty() {
        None
    } else {
        Some(RequestContent {
            role: None,
            parts: vec![RequestPart::Text {
                text: system_text.join("\n\n"),
            }],
        })
    };

    let contents = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| RequestContent {
            role: Some(match m.role {
                Role::Assistant => "model",
                Role::User | Role::System => "user",
            }),
            parts: m.parts.iter().map(convert_part).collect(),
        })
        .collect();

    GenerateContentRequest {
        system_instruction,
        contents,
        generation_config: GenerationConfig { temperature },
    }
}

fn convert_part(part: &MessagePart) -> RequestPart {
    match part {
        MessagePart::Text { text } => RequestPart::Text { text: text.clone() },
        MessagePart::Image(image) => RequestPart::InlineData {
            inline_data: InlineData {
                mime_type: image.mime_type.clone(),
                data: STANDARD.encode(&image.data),
            },
        },
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<RequestContent>,
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Serialize)]
struct RequestContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    InlineData { inline_data: InlineData },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, empty when the model returned none.
    fn first_text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Serialize)]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: RequestContent,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}
