//! Model selection by short alias.
//!
//! Maps the aliases used in configuration (`gpt-3.5`, `gemini-pro`, ...)
//! to a provider and a concrete model id, and builds the client from the
//! provider's API key environment variable.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use crate::error::{ModelError, Result};
use crate::mock::MockChatModel;
use crate::model::ChatModel;

/// A supported model alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelAlias {
    Gpt35,
    Gpt4oMini,
    Gpt4o,
    GeminiPro,
    GeminiFlash,
    /// The offline [`MockChatModel`].
    Mock,
}

/// The backend a [`ModelAlias`] resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    Gemini,
    Mock,
}

impl ModelAlias {
    pub const ALL: [ModelAlias; 6] = [
        ModelAlias::Gpt35,
        ModelAlias::Gpt4oMini,
        ModelAlias::Gpt4o,
        ModelAlias::GeminiPro,
        ModelAlias::GeminiFlash,
        ModelAlias::Mock,
    ];

    pub fn alias(&self) -> &'static str {
        match self {
            ModelAlias::Gpt35 => "gpt-3.5",
            ModelAlias::Gpt4oMini => "gpt-4o-mini",
            ModelAlias::Gpt4o => "gpt-4o",
            ModelAlias::GeminiPro => "gemini-pro",
            ModelAlias::GeminiFlash => "gemini-flash",
            ModelAlias::Mock => "mock",
        }
    }

    /// The model id sent to the provider.
    pub fn model_id(&self) -> &'static str {
        match self {
            ModelAlias::Gpt35 => "gpt-3.5-turbo",
            ModelAlias::Gpt4oMini => "gpt-4o-mini",
            ModelAlias::Gpt4o => "gpt-4o",
            ModelAlias::GeminiPro => "gemini-1.5-pro",
            ModelAlias::GeminiFlash => "gemini-1.5-flash",
            ModelAlias::Mock => "mock",
        }
    }

    pub fn provider(&self) -> Provider {
        match self {
            ModelAlias::Gpt35 | ModelAlias::Gpt4oMini | ModelAlias::Gpt4o => Provider::OpenAI,
            ModelAlias::GeminiPro | ModelAlias::GeminiFlash => Provider::Gemini,
            ModelAlias::Mock => Provider::Mock,
        }
    }
}

impl fmt::Display for ModelAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.alias())
    }
}

impl FromStr for ModelAlias {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        ModelAlias::ALL
            .into_iter()
            .find(|alias| alias.alias() == normalized || alias.model_id() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = ModelAlias::ALL.iter().map(|a| a.alias()).collect();
                ModelError::Config(format!(
                    "unknown model '{s}'; choose one of: {}",
                    known.join(", ")
                ))
            })
    }
}

/// Build a chat model from an alias, reading API keys from the environment.
///
/// # Errors
///
/// Returns [`ModelError::Config`] for unknown aliases, missing API keys, or
/// providers compiled out by feature flags.
pub fn load_llm(name: &str) -> Result<Arc<dyn ChatModel>> {
    let alias: ModelAlias = name.parse()?;
    info!(alias = %alias, model = alias.model_id(), "loading chat model");

    match alias.provider() {
        Provider::Mock => Ok(Arc::new(MockChatModel::new())),
        Provider::OpenAI => openai_model(alias),
        Provider::Gemini => gemini_model(alias),
    }
}

#[cfg(feature = "openai")]
fn openai_model(alias: ModelAlias) -> Result<Arc<dyn ChatModel>> {
    let mut model = crate::openai::OpenAIChatModel::from_env(alias.model_id())?;
    if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
        model = model.with_base_url(base_url);
    }
    Ok(Arc::new(model))
}

#[cfg(not(feature = "openai"))]
fn openai_model(alias: ModelAlias) -> Result<Arc<dyn ChatModel>> {
    Err(ModelError::Config(format!("'{alias}' requires the `openai` feature")))
}

#[cfg(feature = "gemini")]
fn gemini_model(alias: ModelAlias) -> Result<Arc<dyn ChatModel>> {
    Ok(Arc::new(crate::gemini::GeminiChatModel::from_env(alias.model_id())?))
}

#[cfg(not(feature = "gemini"))]
fn gemini_model(alias: ModelAlias) -> Result<Arc<dyn ChatModel>> {
    Err(ModelError::Config(format!("'{alias}' requires the `gemini` feature")))
}
