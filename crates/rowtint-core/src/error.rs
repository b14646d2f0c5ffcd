//! Error types for the highlighting engine.

use thiserror::Error;

/// Errors that can occur while building or running the engine.
#[derive(Debug, Error)]
pub enum Error {
    /// A configured selector failed to parse.
    #[error("Invalid selector `{selector}`: {source}")]
    Selector {
        /// The offending selector text.
        selector: String,
        /// Why it failed.
        #[source]
        source: rowtint_dom::SelectorError,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// The rule store could not be read.
    #[error("Rule store error: {0}")]
    Store(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
