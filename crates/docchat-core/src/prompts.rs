use docchat_memory::RetrievedChunk;

pub const IMAGE_EXTRACTION_PROMPT: &str = "Extract information from this image:";

const CONDENSE_INSTRUCTION: &str = "Given the following conversation and a follow up question, \
rephrase the follow up question to be a standalone question, in its original language.";

const QA_TEMPLATE: &str = "Use the following pieces of context to answer the user's question. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.\n\
----------------\n{context}";

#[must_use]
pub fn condense_prompt(history: &str, question: &str) -> String {
    format!(
        "{CONDENSE_INSTRUCTION}\n\nChat History:\n{history}\nFollow Up Input: {question}\nStandalone question:"
    )
}

/// System prompt carrying the retrieved chunks, separated by blank lines.
#[must_use]
pub fn qa_system_prompt(chunks: &[RetrievedChunk]) -> String {
    let context = chunks
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    QA_TEMPLATE.replace("{context}", &context)
}
