//! Error types for the `docqa-model` crate.

use thiserror::Error;

/// Errors that can occur when calling a chat model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Invalid or missing configuration (API key, model alias, ...).
    #[error("Model configuration error: {0}")]
    Config(String),

    /// The HTTP request could not be sent or did not complete.
    #[error("Request to {provider} failed: {message}")]
    Request {
        /// The provider that was being called.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The provider answered with a non-success status.
    #[error("{provider} API returned {status}: {message}")]
    Api {
        /// The provider that produced the error.
        provider: String,
        /// HTTP status code.
        status: u16,
        /// Error detail extracted from the response body.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("Failed to parse {provider} response: {message}")]
    Parse {
        /// The provider whose response was malformed.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The provider returned no candidate text.
    #[error("{0} returned an empty response")]
    EmptyResponse(String),

    /// Failure injected by [`MockChatModel`](crate::MockChatModel).
    #[error("Mock model error: {0}")]
    Mock(String),
}

/// Result type alias for [`ModelError`].
pub type Result<T> = std::result::Result<T, ModelError>;
