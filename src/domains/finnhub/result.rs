//! Success/failure envelope returned by the search service.

use serde::Serialize;

/// Category of a failed search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorType {
    NotFound,
    Unknown,
    InvalidQuery,
    ServiceUnavailable,
    Timeout,
    InvalidResponse,
}

/// Either data or an error message with its category, never both.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceResult<T> {
    is_success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_type: Option<ErrorType>,
}

impl<T> ServiceResult<T> {
    pub fn success(data: T) -> Self {
        Self {
            is_success: true,
            data: Some(data),
            error_message: None,
            error_type: None,
        }
    }

    pub fn failure(message: impl Into<String>, error_type: ErrorType) -> Self {
        Self {
            is_success: false,
            data: None,
            error_message: Some(message.into()),
            error_type: Some(error_type),
        }
    }

    pub fn is_success(&self) -> bool {
        self.is_success
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn error_type(&self) -> Option<ErrorType> {
        self.error_type
    }
}
