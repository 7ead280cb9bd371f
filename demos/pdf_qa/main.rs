//! # Document Q&A Example
//!
//! Uploads a file into a session, then asks a few questions about it,
//! including a follow-up that relies on conversation memory.
//!
//! Uses `HashEmbeddingProvider` and a scripted `MockChatModel` so it runs
//! with **zero API keys**. Pass a `.pdf` or `.txt` path to index your own
//! file; otherwise a small sample text is written to the temp directory.
//!
//! Run: `cargo run -p docqa-demos --example pdf_qa -- [FILE]`

use std::path::PathBuf;
use std::sync::Arc;

use docqa_model::MockChatModel;
use docqa_rag::{
    FileUpload, HashEmbeddingProvider, RagConfig, SessionDeps, SessionManager,
};

const SAMPLE: &str = "\
The Voyager program launched two probes in 1977 to study the outer planets.

Voyager 1 flew past Jupiter and Saturn, then headed out of the plane of the \
solar system. In 2012 it became the first spacecraft to enter interstellar space.

Voyager 2 is the only spacecraft to have visited Uranus and Neptune. It crossed \
into interstellar space in 2018.

Both probes carry a golden record with sounds and images selected to portray \
the diversity of life and culture on Earth.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("docqa_rag=info").init();

    // -- 1. Pick the file to index ----------------------------------------
    let path = match std::env::args().nth(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let path = std::env::temp_dir().join("docqa_voyager.txt");
            std::fs::write(&path, SAMPLE)?;
            path
        }
    };
    let upload = FileUpload::from_path(&path)?;

    // -- 2. Wire up offline dependencies ----------------------------------
    // Small chunks so the sample splits into several labeled sources.
    let config = RagConfig::builder().chunk_size(200).chunk_overlap(50).k(2).build()?;
    let model = Arc::new(
        MockChatModel::new()
            .with_reply("Two probes were launched in 1977.")
            .with_reply("Which planets did Voyager 2 visit?")
            .with_reply("Voyager 2 visited Uranus and Neptune."),
    );
    let deps = SessionDeps::new(Arc::new(HashEmbeddingProvider::default()), model.clone())
        .with_config(config)?;
    let manager = SessionManager::new(deps);
    let session = manager.create_session().await;

    // -- 3. Asking before upload gets the idle reply ----------------------
    let idle = manager.ask(&session, "What is this about?").await?;
    println!("Before upload: {}\n", idle.answer);

    // -- 4. Upload and index ----------------------------------------------
    println!("Processing '{}'...", upload.name());
    let report = manager.upload_file(&session, upload).await?;
    println!(
        "'{}' processed into {} chunks. You can now ask questions!\n",
        report.file_name, report.chunk_count
    );

    // -- 5. Ask, then follow up -------------------------------------------
    for question in ["How many probes were launched?", "Which planets did the second one visit?"] {
        let answer = manager.ask(&session, question).await?;
        println!("Q: {question}\nA: {}", answer.render());
        for source in &answer.sources {
            println!("   [{}] {}", source.label, source.excerpt.replace('\n', " "));
        }
        println!();
    }

    // -- 6. Conversation memory -------------------------------------------
    for (i, turn) in manager.history(&session).await?.iter().enumerate() {
        println!("Turn {}: {} -> {}", i + 1, turn.question, turn.answer);
    }
    println!("Model calls: {}", model.call_count());

    manager.end_session(&session).await?;
    Ok(())
}
