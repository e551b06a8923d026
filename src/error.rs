/// Unified error types for Atomic Uploader
use thiserror::Error;

/// Main error type for listing and upload workflows
#[derive(Error, Debug)]
pub enum UploadError {
    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query service errors
    #[error("Query error: {0}")]
    Query(String),

    /// AO process network errors (spawn, message, result)
    #[error("Process error: {0}")]
    Process(String),

    /// Bundler and transaction upload errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Wallet or keyfile errors
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Data item signing errors
    #[error("Signing error: {0}")]
    Signing(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Upload preconditions not met; carries every unmet condition
    #[error("Upload preconditions not met: {}", .0.join(", "))]
    Precondition(Vec<String>),

    /// Spawned process never became visible to the query service
    #[error("Transaction not found after {attempts} attempts, contract deployment retries failed")]
    PollExhausted { process_id: String, attempts: u32 },

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for uploader operations
pub type UploadResult<T> = Result<T, UploadError>;
