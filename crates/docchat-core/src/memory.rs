use docchat_llm::{Message, Role};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}

/// Unbounded, ordered buffer of completed question/answer turns.
#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    turns: Vec<Turn>,
}

impl ConversationMemory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.push(Turn {
            question: question.into(),
            answer: answer.into(),
        });
    }

    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Turns as alternating user / assistant messages.
    #[must_use]
    pub fn to_messages(&self) -> Vec<Message> {
        self.turns
            .iter()
            .flat_map(|t| {
                [
                    Message::text(Role::User, t.question.clone()),
                    Message::text(Role::Assistant, t.answer.clone()),
                ]
            })
            .collect()
    }

    /// Plain-text transcript used by the question condenser.
    #[must_use]
    pub fn transcript(&self) -> String {
        let mut out = String::new();
        for t in &self.turns {
            out.push_str("Human: ");
            out.push_str(&t.question);
            out.push_str("\nAssistant: ");
            out.push_str(&t.answer);
            out.push('\n');
        }
        out
    }
}
