//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Ask questions about a PDF or text file.
#[derive(Debug, Parser)]
#[command(name = "docqa")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Index a file and answer questions about it
    Ask(AskArgs),

    /// Chat with a model without any document
    Chat(ChatArgs),
}

#[derive(Debug, Args)]
pub struct AskArgs {
    /// File to index (.pdf or plain text)
    pub file: PathBuf,

    /// MIME type of the file; guessed from the extension when omitted
    #[arg(long)]
    pub mime: Option<String>,

    /// Chat model alias (gpt-3.5, gpt-4o-mini, gpt-4o, gemini-pro, gemini-flash, mock)
    #[arg(long, env = "DOCQA_LLM", default_value = "gpt-3.5")]
    pub llm: String,

    /// Embedding model (openai, gemini, hash)
    #[arg(long, env = "DOCQA_EMBEDDING", default_value = "openai")]
    pub embedding: String,

    /// Retrieval strategy: similarity or mmr
    #[arg(long, env = "DOCQA_SEARCH_TYPE", default_value = "similarity")]
    pub search_type: String,

    /// Number of chunks retrieved per question
    #[arg(short = 'k', default_value_t = 2)]
    pub k: usize,

    /// Candidates considered by mmr
    #[arg(long, default_value_t = 20)]
    pub fetch_k: usize,

    /// Maximum chunk size in characters
    #[arg(long, env = "DOCQA_CHUNK_SIZE", default_value_t = 1000)]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[arg(long, env = "DOCQA_CHUNK_OVERLAP", default_value_t = 300)]
    pub chunk_overlap: usize,

    /// Refuse files larger than this
    #[arg(long, default_value_t = 20)]
    pub max_size_mb: u64,

    /// Give up indexing after this many seconds
    #[arg(long, default_value_t = 180)]
    pub upload_timeout_secs: u64,

    /// Give up on a model call after this many seconds
    #[arg(long, default_value_t = 120)]
    pub generation_timeout_secs: u64,
}

#[derive(Debug, Args)]
pub struct ChatArgs {
    /// Chat model alias
    #[arg(long, env = "DOCQA_CHAT_LLM", default_value = "gemini-pro")]
    pub llm: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_defaults() {
        let cli = Cli::try_parse_from(["docqa", "ask", "report.pdf"]).unwrap();
        let Commands::Ask(args) = cli.command else { panic!("expected ask") };
        assert_eq!(args.file, PathBuf::from("report.pdf"));
        assert_eq!(args.k, 2);
        assert_eq!(args.chunk_size, 1000);
        assert_eq!(args.chunk_overlap, 300);
        assert_eq!(args.max_size_mb, 20);
        assert!(!cli.verbose);
    }

    #[test]
    fn ask_overrides() {
        let cli = Cli::try_parse_from([
            "docqa", "-v", "ask", "notes.txt", "--search-type", "mmr", "-k", "4", "--llm", "mock",
        ])
        .unwrap();
        let Commands::Ask(args) = cli.command else { panic!("expected ask") };
        assert_eq!(args.search_type, "mmr");
        assert_eq!(args.k, 4);
        assert_eq!(args.llm, "mock");
        assert!(cli.verbose);
    }

    #[test]
    fn ask_requires_a_file() {
        assert!(Cli::try_parse_from(["docqa", "ask"]).is_err());
    }
}
