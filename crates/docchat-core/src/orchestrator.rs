use std::sync::Arc;

use docchat_llm::{AnyProvider, ImageData};
use docchat_memory::document::{
    Chunk, DOCX_MIME, DEFAULT_MAX_FILE_SIZE, Document, DocumentMetadata, FileKind, PDF_MIME,
    TextSplitter, extract_text,
};
use docchat_memory::{DEFAULT_TOP_K, EmbedFn, SessionIndex, VectorStore};

use crate::chain::ConversationChain;
use crate::describer::ImageDescriber;
use crate::error::TurnError;
use crate::session::{Attachment, IncomingMessage, Reply, Session, SessionState};

pub const WELCOME: &str = "Welcome! Please upload files (text or image) to begin!";
pub const NO_SESSION: &str = "No active session! Upload a file first.";
pub const EMPTY_QUESTION: &str = "Please enter a question.";
pub const FILES_PROCESSED: &str = "Files processed! You can now ask questions.";
pub const NOTHING_EXTRACTED: &str = "No text could be extracted from the uploaded files.";
pub const GENERIC_ERROR: &str = "An error occurred while processing your request.";
pub const IMAGE_ERROR: &str = "Error while processing the image.";

/// Result of reading one upload batch, before anything touches the session.
#[derive(Default)]
struct Ingested {
    chunks: Vec<Chunk>,
    processed: Vec<String>,
    skipped: Vec<String>,
    last_image: Option<ImageData>,
}

/// Per-turn dispatcher: routes uploads into the session index and questions
/// to the image path or the conversation chain.
pub struct Orchestrator {
    provider: AnyProvider,
    store: Arc<dyn VectorStore>,
    embed: EmbedFn,
    describer: ImageDescriber,
    splitter: TextSplitter,
    top_k: usize,
    max_file_size: u64,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("provider", &self.provider)
            .field("splitter", &self.splitter)
            .field("top_k", &self.top_k)
            .field("max_file_size", &self.max_file_size)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    #[must_use]
    pub fn new(provider: AnyProvider, store: Arc<dyn VectorStore>) -> Self {
        Self {
            embed: Arc::new(provider.embed_fn()),
            describer: ImageDescriber::new(provider.clone()),
            provider,
            store,
            splitter: TextSplitter::default(),
            top_k: DEFAULT_TOP_K,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    #[must_use]
    pub fn with_splitter(mut self, splitter: TextSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    #[must_use]
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    #[must_use]
    pub fn new_session(&self) -> Session {
        let session = Session::new();
        tracing::info!(session = %session.id(), "session started");
        session
    }

    #[must_use]
    pub fn welcome(&self) -> &'static str {
        WELCOME
    }

    /// Release the session's vector collection, reset it to `Empty` and mark
    /// it ended so late turns are refused.
    pub async fn end_session(&self, session: &mut Session) {
        session.ended = true;
        session.chain = None;
        session.pending_image = None;
        if let Some(index) = session.index.take()
            && let Err(e) = index.drop_collection().await
        {
            tracing::warn!(session = %session.id(), "failed to drop session collection: {e}");
        }
        tracing::info!(session = %session.id(), "session ended");
    }

    /// Run one chat turn. Always produces a reply; failures are logged and
    /// mapped to a user-facing notice with the session left unchanged.
    pub async fn handle_message(&self, session: &mut Session, message: IncomingMessage) -> Reply {
        if session.is_ended() {
            tracing::warn!(session = %session.id(), "message for ended session ignored");
            return Reply::text(NO_SESSION);
        }

        if !message.attachments.is_empty() {
            return match self.handle_upload(session, &message.attachments).await {
                Ok(reply) => reply,
                Err(e) => {
                    tracing::error!(session = %session.id(), operation = "upload", "turn failed: {e}");
                    Reply::text(GENERIC_ERROR)
                }
            };
        }

        let question = message.content.trim();
        if question.is_empty() {
            return Reply::text(match session.state() {
                SessionState::Empty => NO_SESSION,
                SessionState::Indexed => EMPTY_QUESTION,
            });
        }

        if let Some(image) = session.pending_image() {
            return match self.describer.query(image, question).await {
                Ok(text) => Reply::text(text),
                Err(e) => {
                    tracing::error!(session = %session.id(), operation = "image_query", "image query failed: {e}");
                    Reply::text(IMAGE_ERROR)
                }
            };
        }

        let session_id = session.id();
        let Some(chain) = session.chain.as_mut() else {
            return Reply::text(NO_SESSION);
        };
        match chain.ask(question).await {
            Ok(answer) => Reply {
                text: answer.answer,
                sources: answer.sources.into_iter().map(|c| c.source).collect(),
            },
            Err(e) => {
                tracing::error!(session = %session_id, operation = "ask", "question failed: {e}");
                Reply::text(GENERIC_ERROR)
            }
        }
    }

    async fn handle_upload(
        &self,
        session: &mut Session,
        attachments: &[Attachment],
    ) -> Result<Reply, TurnError> {
        let ingested = self.ingest(attachments).await?;

        if ingested.chunks.is_empty() {
            session.pending_image = None;
            return Ok(Reply::text(with_skipped(NOTHING_EXTRACTED, &ingested.skipped)));
        }

        match session.index.as_mut() {
            None => {
                let index = SessionIndex::create(
                    Arc::clone(&self.store),
                    Arc::clone(&self.embed),
                    &ingested.chunks,
                )
                .await?;
                let retriever = index.retriever_with_top_k(self.top_k);
                session.chain = Some(ConversationChain::new(self.provider.clone(), retriever));
                session.index = Some(index);
                tracing::info!(session = %session.id(), chunks = ingested.chunks.len(), "created session index");
            }
            Some(index) => {
                index.append(&ingested.chunks).await?;
                let retriever = index.retriever_with_top_k(self.top_k);
                session.chain = Some(match session.chain.take() {
                    Some(chain) => chain.with_retriever(retriever),
                    None => ConversationChain::new(self.provider.clone(), retriever),
                });
                tracing::info!(session = %session.id(), chunks = ingested.chunks.len(), "appended to session index");
            }
        }
        session.pending_image = ingested.last_image;

        tracing::info!(
            session = %session.id(),
            files = ?ingested.processed,
            skipped = ingested.skipped.len(),
            "upload processed"
        );
        Ok(Reply::text(with_skipped(FILES_PROCESSED, &ingested.skipped)))
    }

    /// Classify, extract, and chunk every attachment in order. Local failures
    /// skip the file; a failed remote call aborts the batch.
    async fn ingest(&self, attachments: &[Attachment]) -> Result<Ingested, TurnError> {
        let mut out = Ingested::default();

        for attachment in attachments {
            let name = attachment.name.as_str();
            let kind = FileKind::classify(attachment.mime_type.as_deref(), name);
            tracing::info!(file = name, kind = %kind, "processing file");

            let (text, content_type) = match &kind {
                FileKind::Image { mime_type } => {
                    let Some(image) = self.read_image(attachment, mime_type, &mut out.skipped).await
                    else {
                        continue;
                    };
                    let description = self.describer.describe(&image).await.map_err(|e| {
                        tracing::error!(file = name, operation = "describe_image", "{e}");
                        e
                    })?;
                    tracing::info!(file = name, chars = description.len(), "described image");
                    out.last_image = Some(image);
                    (description, mime_type.clone())
                }
                FileKind::Unsupported { mime_type } => {
                    tracing::warn!(file = name, mime_type = %mime_type, "skipping unsupported file");
                    out.skipped.push(format!("{name} (unsupported type {mime_type})"));
                    continue;
                }
                FileKind::Pdf | FileKind::Docx | FileKind::PlainText => {
                    match extract_text(&attachment.path, &kind, self.max_file_size).await {
                        Ok(text) => (text, content_type_for(&kind).to_owned()),
                        Err(e) => {
                            tracing::warn!(file = name, operation = "extract_text", "skipping file: {e}");
                            out.skipped.push(format!("{name} ({e})"));
                            continue;
                        }
                    }
                }
            };

            if text.trim().is_empty() {
                tracing::warn!(file = name, "no text extracted");
                out.skipped.push(format!("{name} (no text found)"));
                continue;
            }

            let document = Document {
                content: text,
                metadata: DocumentMetadata::new(name, content_type),
            };
            let chunks = self.splitter.split(&document);
            tracing::debug!(file = name, chars = document.content.len(), chunks = chunks.len(), "chunked");
            out.chunks.extend(chunks);
            out.processed.push(name.to_owned());
        }

        Ok(out)
    }

    async fn read_image(
        &self,
        attachment: &Attachment,
        mime_type: &str,
        skipped: &mut Vec<String>,
    ) -> Option<ImageData> {
        let name = attachment.name.as_str();
        let bytes = match tokio::fs::read(&attachment.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(file = name, operation = "read_image", "skipping image: {e}");
                skipped.push(format!("{name} (unreadable)"));
                return None;
            }
        };
        if bytes.is_empty() {
            tracing::warn!(file = name, "skipping empty image");
            skipped.push(format!("{name} (empty image)"));
            return None;
        }
        if bytes.len() as u64 > self.max_file_size {
            tracing::warn!(file = name, bytes = bytes.len(), "skipping oversized image");
            skipped.push(format!("{name} (file too large)"));
            return None;
        }
        Some(ImageData::new(bytes, mime_type))
    }
}

fn content_type_for(kind: &FileKind) -> &'static str {
    match kind {
        FileKind::Pdf => PDF_MIME,
        FileKind::Docx => DOCX_MIME,
        _ => "text/plain",
    }
}

fn with_skipped(message: &str, skipped: &[String]) -> String {
    if skipped.is_empty() {
        message.to_owned()
    } else {
        format!("{message}\nSkipped: {}", skipped.join(", "))
    }
}
