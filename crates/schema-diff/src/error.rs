//! Error types for the schema comparison library.

use thiserror::Error;

/// Main error type for schema comparison operations.
#[derive(Error, Debug)]
pub enum DiffError {
    /// Invalid input (empty connection string, illegal migration name,
    /// schema integrity violation).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Back-end cannot open or authenticate a database connection.
    #[error("Connection error: {message}\n  Context: {context}")]
    Connection { message: String, context: String },

    /// A bounded window (connection validation or schema read) was exceeded.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// A catalog query was rejected due to insufficient privilege.
    #[error("Permission denied: {0}")]
    Permission(String),

    /// A back-end received a catalog row shape it cannot normalize.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// IO error (file operations).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Comparison was cancelled (SIGINT, etc.).
    #[error("Comparison cancelled")]
    Cancelled,

    /// Any other failure.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl DiffError {
    /// Create a Connection error with context about where it occurred.
    pub fn connection(message: impl Into<String>, context: impl Into<String>) -> Self {
        DiffError::Connection {
            message: message.into(),
            context: context.into(),
        }
    }

    /// Create a Catalog error.
    pub fn catalog(message: impl Into<String>) -> Self {
        DiffError::Catalog(message.into())
    }

    /// Create a Validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        DiffError::Validation(message.into())
    }

    /// Process exit code for this error category.
    ///
    /// `130` for user cancellation (SIGINT convention), `1` otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            DiffError::Cancelled => 130,
            _ => 1,
        }
    }

    /// Format error with full details including error chain.
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for schema comparison operations.
pub type Result<T> = std::result::Result<T, DiffError>;
