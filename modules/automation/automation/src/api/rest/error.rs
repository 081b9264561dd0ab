use automation_sdk::AutomationError;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Structured error body shared by every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub messages: Vec<String>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    messages: Vec<String>,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, messages: Vec<String>) -> Self {
        Self { status, messages }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, vec![message.into()])
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, vec!["Not Found".to_owned()])
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<AutomationError> for ApiError {
    fn from(e: AutomationError) -> Self {
        let status = match e {
            AutomationError::Validation { .. } => StatusCode::BAD_REQUEST,
            AutomationError::NotFound { .. } => StatusCode::NOT_FOUND,
            AutomationError::Forbidden => StatusCode::FORBIDDEN,
            AutomationError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AutomationError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.messages())
    }
}

/// Implement `From<DomainError>` so `?` works in handlers
impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        AutomationError::from(e).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::bad_request(e.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.status.as_u16(),
            messages: self.messages,
        };
        (self.status, Json(body)).into_response()
    }
}
