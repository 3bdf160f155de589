use docchat_llm::{AnyProvider, LlmProvider, Message, Role};
use docchat_memory::{RetrievedChunk, Retriever};

use crate::error::ChainError;
use crate::memory::ConversationMemory;
use crate::prompts::{condense_prompt, qa_system_prompt};

pub const NO_ANSWER: &str = "No relevant answer found in the uploaded documents.";

#[derive(Debug, Clone)]
pub struct ChainAnswer {
    pub answer: String,
    /// Retrieved chunks the answer was conditioned on, best first.
    pub sources: Vec<RetrievedChunk>,
}

/// Retrieval-augmented question answering with conversation memory.
#[derive(Debug)]
pub struct ConversationChain {
    provider: AnyProvider,
    retriever: Retriever,
    memory: ConversationMemory,
}

impl ConversationChain {
    #[must_use]
    pub fn new(provider: AnyProvider, retriever: Retriever) -> Self {
        Self {
            provider,
            retriever,
            memory: ConversationMemory::new(),
        }
    }

    /// Rebuild the chain around `retriever`, keeping the conversation memory.
    #[must_use]
    pub fn with_retriever(self, retriever: Retriever) -> Self {
        Self { retriever, ..self }
    }

    #[must_use]
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    #[must_use]
    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// Answer `question` from the indexed documents and prior turns.
    ///
    /// Memory is only updated when the whole turn succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if condensing, retrieval, or generation fails.
    pub async fn ask(&mut self, question: &str) -> Result<ChainAnswer, ChainError> {
        let standalone = self.standalone_question(question).await?;
        let sources = self.retriever.retrieve(&standalone).await?;
        tracing::debug!(
            question = %standalone,
            retrieved = sources.len(),
            "retrieved context"
        );

        let mut messages = Vec::with_capacity(self.memory.len() * 2 + 2);
        messages.push(Message::text(Role::System, qa_system_prompt(&sources)));
        messages.extend(self.memory.to_messages());
        messages.push(Message::user(standalone));

        let answer = self.provider.chat(&messages).await?;
        let answer = match answer.trim() {
            "" => NO_ANSWER.to_owned(),
            text => text.to_owned(),
        };

        self.memory.push(question, answer.clone());
        Ok(ChainAnswer { answer, sources })
    }

    async fn standalone_question(&self, question: &str) -> Result<String, ChainError> {
        if self.memory.is_empty() {
            return Ok(question.to_owned());
        }
        let prompt = condense_prompt(&self.memory.transcript(), question);
        let condensed = self.provider.chat(&[Message::user(prompt)]).await?;
        let condensed = condensed.trim();
        Ok(if condensed.is_empty() {
            question.to_owned()
        } else {
            condensed.to_owned()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use docchat_llm::mock::MockProvider;
    use docchat_memory::document::{Chunk, DocumentMetadata};
    use docchat_memory::{InMemoryVectorStore, SessionIndex};

    use super::*;

    fn chunk(source: &str, content: &str) -> Chunk {
        Chunk {
            content: content.into(),
            metadata: DocumentMetadata::new(source, "text/plain"),
            chunk_index: 0,
            char_offset: 0,
        }
    }

    async fn index_for(mock: &MockProvider, chunks: &[Chunk]) -> SessionIndex {
        let provider = AnyProvider::Mock(mock.clone());
        SessionIndex::create(
            Arc::new(InMemoryVectorStore::new()),
            Arc::new(provider.embed_fn()),
            chunks,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn first_question_skips_condensing() {
        let mock = MockProvider::with_responses(vec!["Blue.".into()]);
        let index = index_for(&mock, &[chunk("a.txt", "The sky is blue.")]).await;
        let mut chain = ConversationChain::new(mock.clone().into(), index.retriever());

        let answer = chain.ask("What color is the sky?").await.unwrap();
        assert_eq!(answer.answer, "Blue.");
        assert_eq!(answer.sources[0].source, "a.txt-0");
        assert_eq!(mock.requests().len(), 1);

        let request = mock.last_request().unwrap();
        assert_eq!(request[0].role, Role::System);
        assert!(request[0].text_content().contains("The sky is blue."));
        assert_eq!(request.last().unwrap().text_content(), "What color is the sky?");
        assert_eq!(chain.memory().len(), 1);
    }

    #[tokio::test]
    async fn follow_up_is_condensed_with_history() {
        let mock = MockProvider::with_responses(vec![
            "Blue.".into(),
            "What color is the grass?".into(),
            "Green.".into(),
        ]);
        let index = index_for(
            &mock,
            &[chunk("a.txt", "The sky is blue."), chunk("b.txt", "The grass is green.")],
        )
        .await;
        let mut chain = ConversationChain::new(mock.clone().into(), index.retriever());

        chain.ask("What color is the sky?").await.unwrap();
        let answer = chain.ask("and the grass?").await.unwrap();
        assert_eq!(answer.answer, "Green.");
        assert_eq!(answer.sources[0].content, "The grass is green.");

        let requests = mock.requests();
        assert_eq!(requests.len(), 3);
        let condense = requests[1][0].text_content();
        assert!(condense.contains("Human: What color is the sky?\nAssistant: Blue."));
        assert!(condense.contains("Follow Up Input: and the grass?"));

        let final_request = &requests[2];
        assert_eq!(final_request.len(), 4);
        assert_eq!(final_request[1].text_content(), "What color is the sky?");
        assert_eq!(final_request[3].text_content(), "What color is the grass?");

        let turns = chain.memory().turns();
        assert_eq!(turns[1].question, "and the grass?");
    }

    #[tokio::test]
    async fn empty_answer_becomes_sentinel() {
        let mock = MockProvider::with_responses(vec!["   ".into()]);
        let index = index_for(&mock, &[chunk("a.txt", "text")]).await;
        let mut chain = ConversationChain::new(mock.into(), index.retriever());

        let answer = chain.ask("anything?").await.unwrap();
        assert_eq!(answer.answer, NO_ANSWER);
    }

    #[tokio::test]
    async fn failed_ask_leaves_memory_unchanged() {
        let mock = MockProvider::with_responses(vec!["Blue.".into()]);
        let index = index_for(&mock, &[chunk("a.txt", "The sky is blue.")]).await;
        let mut chain = ConversationChain::new(mock.clone().into(), index.retriever());
        chain.ask("What color is the sky?").await.unwrap();

        let mut failing = mock.clone();
        failing.fail_chat = true;
        let mut chain = ConversationChain {
            provider: failing.into(),
            ..chain
        };
        assert!(matches!(
            chain.ask("Really?").await,
            Err(ChainError::Llm(_))
        ));
        assert_eq!(chain.memory().len(), 1);
    }

    #[tokio::test]
    async fn with_retriever_keeps_memory() {
        let mock = MockProvider::with_responses(vec!["Blue.".into()]);
        let mut index = index_for(&mock, &[chunk("a.txt", "The sky is blue.")]).await;
        let mut chain = ConversationChain::new(mock.clone().into(), index.retriever_with_top_k(1));
        chain.ask("What color is the sky?").await.unwrap();

        index.append(&[chunk("b.txt", "Roses are red.")]).await.unwrap();
        let chain = chain.with_retriever(index.retriever_with_top_k(2));
        assert_eq!(chain.memory().len(), 1);
        assert_eq!(chain.retriever().top_k(), 2);
    }
}
