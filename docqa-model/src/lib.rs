//! # docqa-model
//!
//! Chat model integrations for docqa.
//!
//! ## Overview
//!
//! Every provider implements the [`ChatModel`] trait, a single async
//! `generate` call taking a list of role-tagged messages and returning text.
//! Currently supports:
//!
//! - [`OpenAIChatModel`] - OpenAI chat completions and OpenAI-compatible APIs
//! - [`GeminiChatModel`] - Google's Gemini `generateContent` API
//! - [`MockChatModel`] - Scripted model for tests and offline demos
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docqa_model::{ChatMessage, ChatModel, ChatRequest, load_llm};
//!
//! let model = load_llm("gpt-3.5")?;
//! let response = model
//!     .generate(ChatRequest::new(vec![ChatMessage::user("Hello!")]))
//!     .await?;
//! println!("{}", response.text);
//! ```
//!
//! ## Model aliases
//!
//! | Alias | Provider | Model |
//! |-------|----------|-------|
//! | `gpt-3.5` | OpenAI | `gpt-3.5-turbo` |
//! | `gpt-4o-mini` | OpenAI | `gpt-4o-mini` |
//! | `gpt-4o` | OpenAI | `gpt-4o` |
//! | `gemini-pro` | Gemini | `gemini-1.5-pro` |
//! | `gemini-flash` | Gemini | `gemini-1.5-flash` |

pub mod error;
#[cfg(feature = "gemini")]
pub mod gemini;
pub mod mock;
pub mod model;
#[cfg(feature = "openai")]
pub mod openai;
pub mod registry;
pub mod types;

pub use error::{ModelError, Result};
#[cfg(feature = "gemini")]
pub use gemini::GeminiChatModel;
pub use mock::MockChatModel;
pub use model::ChatModel;
#[cfg(feature = "openai")]
pub use openai::OpenAIChatModel;
pub use registry::{ModelAlias, Provider, load_llm};
pub use types::{ChatMessage, ChatRequest, ChatResponse, Role};
