//! Prompt templates for the conversational chain.

use docqa_model::ChatMessage;

use crate::document::SearchResult;
use crate::memory::ConversationMemory;

const ANSWER_INSTRUCTIONS: &str = "Use the following pieces of context to answer the user's \
question. If you don't know the answer, just say that you don't know, don't try to make up an \
answer.";

const CONDENSE_INSTRUCTIONS: &str = "Given the following conversation and a follow up question, \
rephrase the follow up question to be a standalone question, in its original language. Reply \
with the standalone question only.";

/// Messages asking the model to rewrite `question` so it stands on its own.
pub fn condense_messages(memory: &ConversationMemory, question: &str) -> Vec<ChatMessage> {
    let history = memory
        .turns()
        .iter()
        .map(|t| format!("Human: {}\nAssistant: {}", t.question, t.answer))
        .collect::<Vec<_>>()
        .join("\n");

    vec![
        ChatMessage::system(CONDENSE_INSTRUCTIONS),
        ChatMessage::user(format!(
            "Chat History:\n{history}\nFollow Up Input: {question}\nStandalone question:"
        )),
    ]
}

/// "Stuff" prompt: every retrieved chunk goes into the system message,
/// followed by the history and the question.
pub fn answer_messages(
    context: &[SearchResult],
    memory: &ConversationMemory,
    question: &str,
) -> Vec<ChatMessage> {
    let context = context.iter().map(|r| r.chunk.text.as_str()).collect::<Vec<_>>().join("\n\n");

    let mut messages = Vec::with_capacity(memory.len() * 2 + 2);
    messages.push(ChatMessage::system(format!("{ANSWER_INSTRUCTIONS}\n----------------\n{context}")));
    messages.extend(memory.to_messages());
    messages.push(ChatMessage::user(question));
    messages
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use docqa_model::Role;

    use super::*;
    use crate::document::Chunk;

    fn result(text: &str) -> SearchResult {
        SearchResult {
            chunk: Chunk {
                id: text.to_string(),
                text: text.to_string(),
                metadata: HashMap::new(),
                document_id: "doc".to_string(),
            },
            score: 1.0,
        }
    }

    #[test]
    fn answer_prompt_layout() {
        let mut memory = ConversationMemory::new();
        memory.push("earlier", "reply");
        let messages = answer_messages(&[result("alpha"), result("beta")], &memory, "now?");

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.ends_with("alpha\n\nbeta"));
        assert_eq!(messages[3].content, "now?");
    }

    #[test]
    fn condense_prompt_carries_history() {
        let mut memory = ConversationMemory::new();
        memory.push("Who wrote it?", "Ada.");
        let messages = condense_messages(&memory, "When?");
        assert!(messages[1].content.contains("Human: Who wrote it?\nAssistant: Ada."));
        assert!(messages[1].content.contains("Follow Up Input: When?"));
    }
}
