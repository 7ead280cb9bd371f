//! Interactive loops for `ask` and `chat`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use docqa_model::{ChatMessage, ChatModel, ChatRequest, load_llm};
use docqa_rag::{Answer, SessionDeps, SessionManager, load_embedding_model};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{error, info};

use crate::cli::{AskArgs, ChatArgs};
use crate::config::{check_size, file_upload, rag_config};

pub const WELCOME_MESSAGE: &str = "Welcome to the PDF QA! To get started: \n
1. Upload a PDF or text file
2. Ask a question about the file";

const CHAT_GREETING: &str = "Hello! How can I help you today?";
const EXCERPT_PREVIEW_CHARS: usize = 200;

/// Format an answer with a numbered preview of each cited source.
pub fn format_answer(answer: &Answer) -> String {
    let mut out = answer.render();
    for source in &answer.sources {
        let preview: String = source.excerpt.chars().take(EXCERPT_PREVIEW_CHARS).collect();
        let preview = preview.split_whitespace().collect::<Vec<_>>().join(" ");
        let page = source.page.map(|p| format!(" (page {})", p + 1)).unwrap_or_default();
        out.push_str(&format!("\n  [{}{page}] {preview}", source.label));
        if source.excerpt.chars().count() > EXCERPT_PREVIEW_CHARS {
            out.push_str("...");
        }
    }
    out
}

/// Read lines until EOF or Ctrl-C, handing each non-empty line to `handle`.
async fn read_loop<F, Fut>(prompt: &str, mut handle: F) -> Result<()>
where
    F: FnMut(String) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    let mut rl = DefaultEditor::new()?;
    loop {
        match rl.readline(prompt) {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                if matches!(input, "exit" | "quit") {
                    break;
                }
                let _ = rl.add_history_entry(input);
                handle(input.to_string()).await;
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => {
                error!(error = %err, "failed to read input");
                break;
            }
        }
    }
    Ok(())
}

/// `docqa ask`: index one file, then answer questions about it.
pub async fn run_ask(args: AskArgs) -> Result<()> {
    let config = rag_config(&args)?;
    let upload = file_upload(&args)?;
    check_size(&upload.path, args.max_size_mb)?;

    let embedder = load_embedding_model(&args.embedding)?;
    let model = load_llm(&args.llm)?;
    let manager = SessionManager::new(SessionDeps::new(embedder, model).with_config(config)?);
    let session_id = manager.create_session().await;

    println!("{WELCOME_MESSAGE}\n");
    let name = upload.name();
    println!("Processing '{name}'...");

    let timeout = Duration::from_secs(args.upload_timeout_secs);
    let report = tokio::time::timeout(timeout, manager.upload_file(&session_id, upload))
        .await
        .with_context(|| format!("indexing '{name}' took longer than {}s", timeout.as_secs()))??;
    info!(
        file = %report.file_name,
        documents = report.document_count,
        chunks = report.chunk_count,
        "indexed file"
    );
    println!("'{name}' processed. You can now ask questions!");

    read_loop("> ", |question| {
        let manager = manager.clone();
        let session_id = session_id.clone();
        async move {
            match manager.ask(&session_id, &question).await {
                Ok(answer) => println!("{}\n", format_answer(&answer)),
                Err(e) => eprintln!("Error: {e}"),
            }
        }
    })
    .await?;

    manager.end_session(&session_id).await?;
    Ok(())
}

/// `docqa chat`: plain conversation with a model, no document.
pub async fn run_chat(args: ChatArgs) -> Result<()> {
    let model: Arc<dyn ChatModel> = load_llm(&args.llm)?;
    println!("{CHAT_GREETING}");

    let mut history: Vec<ChatMessage> = Vec::new();
    let mut rl = DefaultEditor::new()?;
    loop {
        let line = match rl.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => {
                error!(error = %err, "failed to read input");
                break;
            }
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "exit" | "quit") {
            break;
        }
        let _ = rl.add_history_entry(input);

        history.push(ChatMessage::user(input));
        match model.generate(ChatRequest::new(history.clone())).await {
            Ok(response) => {
                println!("{}\n", response.text);
                history.push(ChatMessage::assistant(response.text));
            }
            Err(e) => {
                history.pop();
                eprintln!("Error: {e}");
            }
        }
    }
    Ok(())
}
