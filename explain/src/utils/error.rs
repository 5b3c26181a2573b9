use serde::Serialize;
use thiserror::Error;

/// Explain Error with rich context and automatic error trait implementations
///
/// Every failure of an explain call travels through this type, whether it
/// happened while serializing the query or while talking to the cluster.
#[derive(Error, Debug)]
pub enum ExplainError {
    // Request building errors 1xxx
    #[error("Failed to serialize explain query: {0}")]
    QuerySerialization(String),

    #[error("Invalid explain request: {0}")]
    InvalidRequest(String),

    // Cluster errors 2xxx
    #[error("Failed to connect to search cluster: {message}")]
    ConnectionFailed { message: String },

    #[error("Search cluster request timeout")]
    Timeout,

    #[error("Search cluster authentication failed")]
    AuthFailed,

    #[error("Search cluster returned {status}: {reason}")]
    ServiceError { status: u16, reason: String },

    // Resource errors 3xxx
    #[error("Document [{index}][{doc_type}][{id}] not found")]
    DocumentNotFound { index: String, doc_type: String, id: String },

    // Validation errors 4xxx
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ExplainError {
    /// Helper to create query serialization error
    pub fn query_serialization(message: impl Into<String>) -> Self {
        Self::QuerySerialization(message.into())
    }

    /// Helper to create invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Helper to create connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed { message: message.into() }
    }

    pub fn service_error(status: u16, reason: impl Into<String>) -> Self {
        Self::ServiceError { status, reason: reason.into() }
    }

    /// Helper to create document not found error
    pub fn document_not_found(
        index: impl Into<String>,
        doc_type: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self::DocumentNotFound { index: index.into(), doc_type: doc_type.into(), id: id.into() }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    /// Numeric error code, grouped by failure family
    pub fn error_code(&self) -> i32 {
        match self {
            // Request building errors 1xxx
            Self::QuerySerialization(_) => 1001,
            Self::InvalidRequest(_) => 1002,

            // Cluster errors 2xxx
            Self::ConnectionFailed { .. } => 2001,
            Self::Timeout => 2002,
            Self::AuthFailed => 2003,
            Self::ServiceError { .. } => 2004,

            // Resource errors 3xxx
            Self::DocumentNotFound { .. } => 3001,

            // Validation errors 4xxx
            Self::InvalidResponse(_) => 4001,
        }
    }
}

/// Serializable error body, printed by the CLI in `--json` mode
#[derive(Debug, Serialize)]
pub struct ExplainErrorResponse {
    pub code: i32,
    pub message: String,
}

impl From<&ExplainError> for ExplainErrorResponse {
    fn from(err: &ExplainError) -> Self {
        Self { code: err.error_code(), message: err.to_string() }
    }
}

impl From<serde_json::Error> for ExplainError {
    fn from(err: serde_json::Error) -> Self {
        ExplainError::query_serialization(err.to_string())
    }
}

impl From<reqwest::Error> for ExplainError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExplainError::Timeout
        } else {
            ExplainError::connection_failed(format!("Request failed: {}", err))
        }
    }
}

pub type ExplainResult<T> = Result<T, ExplainError>;
