//! Error types for the host document layer.

use thiserror::Error;

/// Errors raised by host document writes and tree edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// The node handle does not refer to a node of this document.
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// The operation requires an element but the node is not one.
    #[error("Not an element: {0}")]
    NotAnElement(String),

    /// The tree edit would produce an invalid hierarchy.
    #[error("Hierarchy request error: {0}")]
    Hierarchy(String),

    /// An error reported by a host adapter.
    #[error("Host error: {0}")]
    Host(String),
}

/// Errors raised while parsing a selector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// The selector was empty or whitespace only.
    #[error("Empty selector")]
    Empty,

    /// The selector text is malformed.
    #[error("Selector parse error at position {position}: {message}")]
    Parse {
        /// Byte position where the error occurred.
        position: usize,
        /// Description of what went wrong.
        message: String,
    },

    /// The selector uses syntax outside the supported subset.
    #[error("Unsupported selector syntax at position {position}: {message}")]
    Unsupported {
        /// Byte position of the unsupported construct.
        position: usize,
        /// Description of the construct.
        message: String,
    },
}

/// Result type alias for document operations.
pub type Result<T> = std::result::Result<T, DomError>;
