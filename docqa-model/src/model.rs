//! The chat model capability trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ChatRequest, ChatResponse};

/// A language model that turns a conversation into a reply.
///
/// Implementations wrap a specific backend behind a unified async
/// interface. They never retry on their own; retry policy belongs to the
/// caller.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_model::{ChatMessage, ChatModel, ChatRequest};
///
/// let reply = model.generate(ChatRequest::new(vec![ChatMessage::user("hi")])).await?;
/// ```
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// The model identifier sent to the provider.
    fn name(&self) -> &str;

    /// Generate a reply for the given request.
    async fn generate(&self, request: ChatRequest) -> Result<ChatResponse>;
}
