use std::path::PathBuf;
use thiserror::Error;

/// Result type for extraction operations
pub type Result<T> = std::result::Result<T, ExtractorError>;

/// Errors that can occur while extracting a summary from one source file
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Failed to parse the source code
    #[error("Parse error: {0}")]
    ParseError(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Assembly definition could not be read as JSON
    #[error("Invalid assembly definition {path}: {source}")]
    InvalidDescriptor {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Resolved owner name was empty
    #[error("Could not compute assembly for path: {0}")]
    MissingOwner(PathBuf),

    /// Tree-sitter error
    #[error("Tree-sitter error: {0}")]
    TreeSitterError(String),
}

impl ExtractorError {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create a tree-sitter error
    pub fn tree_sitter(msg: impl Into<String>) -> Self {
        Self::TreeSitterError(msg.into())
    }
}
