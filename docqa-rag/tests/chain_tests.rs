//! Conversational chain behaviour with a scripted model.

use std::sync::Arc;
use std::time::Duration;

use docqa_model::{MockChatModel, Role};
use docqa_rag::chunking::{Chunker, RecursiveChunker};
use docqa_rag::{
    ChainOptions, ConversationalRetrievalChain, Document, HashEmbeddingProvider, RagError,
    Retriever, SearchOptions, Turn, VectorStoreBuilder,
};

async fn retriever() -> Retriever {
    let docs = vec![
        Document::new("guide", "The warranty covers parts and labour for two years.")
            .with_metadata("page", "0"),
        Document::new("guide2", "Returns are accepted within thirty days of purchase.")
            .with_metadata("page", "1"),
    ];
    let chunks = RecursiveChunker::new(1000, 300).unwrap().split_documents(&docs);
    VectorStoreBuilder::new(Arc::new(HashEmbeddingProvider::default()))
        .build(chunks)
        .await
        .unwrap()
        .as_retriever("similarity", SearchOptions::default())
        .unwrap()
}

fn turn(question: &str, answer: &str) -> Turn {
    Turn { question: question.to_string(), answer: answer.to_string() }
}

#[tokio::test]
async fn memory_records_turns_in_order() {
    let model = Arc::new(
        MockChatModel::new()
            .with_reply("ans_X")
            .with_reply("standalone Y")
            .with_reply("ans_Y"),
    );
    let mut chain = ConversationalRetrievalChain::new(retriever().await, model.clone());

    chain.ask("X").await.unwrap();
    chain.ask("Y").await.unwrap();

    assert_eq!(chain.memory().turns(), &[turn("X", "ans_X"), turn("Y", "ans_Y")]);
    assert_eq!(model.call_count(), 3);
}

#[tokio::test]
async fn follow_up_question_is_condensed_before_retrieval() {
    let model = Arc::new(MockChatModel::new().with_reply("first").with_reply("standalone"));
    let mut chain = ConversationalRetrievalChain::new(retriever().await, model.clone());

    chain.ask("How long is the warranty?").await.unwrap();
    chain.ask("And returns?").await.unwrap();

    let requests = model.requests();
    let condense = &requests[1];
    assert!(condense.messages[1].content.contains("Human: How long is the warranty?"));
    assert!(condense.messages[1].content.contains("Follow Up Input: And returns?"));

    let answer = &requests[2];
    assert_eq!(answer.messages[0].role, Role::System);
    assert_eq!(answer.messages.len(), 4);
    assert_eq!(answer.last_user_text(), Some("And returns?"));
}

#[tokio::test]
async fn condensing_can_be_disabled() {
    let model = Arc::new(MockChatModel::new());
    let options = ChainOptions { condense_question: false, ..ChainOptions::default() };
    let mut chain =
        ConversationalRetrievalChain::new(retriever().await, model.clone()).with_options(options);

    chain.ask("one").await.unwrap();
    chain.ask("two").await.unwrap();
    assert_eq!(model.call_count(), 2);
}

#[tokio::test]
async fn answer_cites_labeled_sources_with_pages() {
    let model = Arc::new(MockChatModel::new().with_reply("Two years."));
    let mut chain = ConversationalRetrievalChain::new(retriever().await, model);

    let answer = chain.ask("What does the warranty cover?").await.unwrap();
    assert_eq!(answer.answer, "Two years.");
    assert_eq!(answer.sources.len(), 2);
    assert_eq!(answer.sources[0].label, "source_0");
    assert_eq!(answer.sources[0].page, Some(0));
    assert!(answer.sources[0].excerpt.contains("warranty"));
    assert!(answer.render().starts_with("Two years.\nSources: source_0"));
}

#[tokio::test]
async fn generation_failure_leaves_memory_unchanged() {
    let model = Arc::new(MockChatModel::new().with_failure("quota exceeded"));
    let mut chain = ConversationalRetrievalChain::new(retriever().await, model.clone());

    let err = chain.ask("anything").await.unwrap_err();
    assert!(matches!(err, RagError::GenerationFailed(ref m) if m.contains("quota exceeded")));
    assert!(chain.memory().is_empty());

    let answer = chain.ask("again").await.unwrap();
    assert_eq!(answer.answer, "Answer to: again");
    assert_eq!(chain.memory().turns(), &[turn("again", "Answer to: again")]);
}

#[tokio::test(start_paused = true)]
async fn slow_model_times_out() {
    let model = Arc::new(MockChatModel::new().with_delay(Duration::from_secs(30)));
    let options =
        ChainOptions { generation_timeout: Duration::from_millis(50), ..ChainOptions::default() };
    let mut chain = ConversationalRetrievalChain::new(retriever().await, model).with_options(options);

    let err = chain.ask("hello").await.unwrap_err();
    assert!(matches!(err, RagError::GenerationFailed(_)));
    assert!(chain.memory().is_empty());
}
