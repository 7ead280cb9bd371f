//! Ordered question/answer history for one conversation.

use docqa_model::ChatMessage;
use serde::{Deserialize, Serialize};

/// One completed exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}

/// Append-only conversation log.
///
/// Only completed turns are recorded; a question whose generation failed never
/// appears here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMemory {
    turns: Vec<Turn>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.push(Turn { question: question.into(), answer: answer.into() });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The history as alternating user/assistant messages.
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        self.turns
            .iter()
            .flat_map(|t| [ChatMessage::user(&t.question), ChatMessage::assistant(&t.answer)])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use docqa_model::Role;

    use super::*;

    #[test]
    fn messages_alternate_in_order() {
        let mut memory = ConversationMemory::new();
        memory.push("q1", "a1");
        memory.push("q2", "a2");

        let messages = memory.to_messages();
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User, Role::Assistant]);
        assert_eq!(messages[2].content, "q2");
        assert_eq!(memory.len(), 2);
    }
}
