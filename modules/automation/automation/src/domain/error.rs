use authz_oracle_sdk::AuthZResolverError;
use automation_sdk::AutomationError;

use super::dispatch::DispatchError;
use super::pagination::InvalidPage;
use super::repo::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("{0}")]
    NotFound(String),

    #[error("access forbidden")]
    Forbidden,

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("authorization oracle error: {0}")]
    Authorization(#[from] AuthZResolverError),

    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }

    pub fn not_found() -> Self {
        Self::NotFound("Not Found".to_owned())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<InvalidPage> for DomainError {
    fn from(e: InvalidPage) -> Self {
        Self::NotFound(e.to_string())
    }
}

impl From<DomainError> for AutomationError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Validation(messages) => Self::Validation { messages },
            DomainError::NotFound(message) => Self::NotFound { message },
            DomainError::Forbidden => Self::Forbidden,
            DomainError::Dispatch(err) => {
                tracing::error!(error = %err, "project update could not be queued");
                Self::unavailable("Project update could not be queued. Try again later.")
            }
            DomainError::Storage(_) | DomainError::Authorization(_) | DomainError::Internal(_) => {
                tracing::error!(error = %e, "request failed");
                Self::Internal
            }
        }
    }
}
