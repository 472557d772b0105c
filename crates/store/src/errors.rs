//! Error types for the store boundary.

use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised at the persistence-collaborator boundary. A mutation that
/// fails here never produces a live event.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation failed: {message}")]
    Validation { message: String },

    #[error("not authorized: {reason}")]
    Authorization { reason: String },

    #[error("access denied: {reason}")]
    AccessDenied { reason: String },

    #[error("chat not found: {id}")]
    ChatNotFound { id: String },

    #[error("message not found: {id}")]
    MessageNotFound { id: String },
}

impl StoreError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an authorization error
    pub fn authorization(reason: impl Into<String>) -> Self {
        Self::Authorization {
            reason: reason.into(),
        }
    }

    /// Create an access denied error
    pub fn access_denied(reason: impl Into<String>) -> Self {
        Self::AccessDenied {
            reason: reason.into(),
        }
    }

    /// Create a not found error for chats
    pub fn chat_not_found(id: impl Into<String>) -> Self {
        Self::ChatNotFound { id: id.into() }
    }

    /// Create a not found error for messages
    pub fn message_not_found(id: impl Into<String>) -> Self {
        Self::MessageNotFound { id: id.into() }
    }
}
