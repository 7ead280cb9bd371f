//! # docqa-cli
//!
//! The `docqa` command: index a PDF or text file and ask questions about it
//! in an interactive loop, or chat with a model directly.
//!
//! ```text
//! docqa ask report.pdf --llm gpt-3.5 --search-type mmr -k 4
//! docqa chat --llm gemini-pro
//! ```

pub mod cli;
pub mod config;
pub mod repl;
pub mod telemetry;

pub use cli::{AskArgs, ChatArgs, Cli, Commands};
