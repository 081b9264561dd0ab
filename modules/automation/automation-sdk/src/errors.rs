use thiserror::Error;

/// Errors surfaced to consumers of the automation module.
///
/// Variants carry client-safe messages only; internal details stay in the
/// module's logs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AutomationError {
    #[error("validation failed: {}", messages.join("; "))]
    Validation { messages: Vec<String> },

    #[error("{message}")]
    NotFound { message: String },

    #[error("access forbidden")]
    Forbidden,

    #[error("service unavailable: {message}")]
    Unavailable { message: String },

    #[error("internal error")]
    Internal,
}

impl AutomationError {
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            messages: vec![message.into()],
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Client-facing messages for the `{code, messages}` error body.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Validation { messages } => messages.clone(),
            Self::NotFound { message } | Self::Unavailable { message } => vec![message.clone()],
            Self::Forbidden => vec!["You don't have permission to perform this action.".to_owned()],
            Self::Internal => vec!["Internal server error".to_owned()],
        }
    }
}
