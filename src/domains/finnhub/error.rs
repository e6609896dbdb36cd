//! Typed failures surfaced by the FinnHub API client.

use std::time::Duration;
use thiserror::Error;

/// HTTP status reported when a transport failure produced no response.
pub const NO_RESPONSE_STATUS: u16 = 500;

/// Every way a symbol search call can fail below the service layer.
///
/// The set is closed: anything the client cannot classify is wrapped as
/// [`ApiClientError::Unexpected`].
#[derive(Debug, Clone, Error)]
pub enum ApiClientError {
    /// No active endpoint with the requested name; nothing was sent.
    #[error("Endpoint '{endpoint}' is not configured or not active")]
    EndpointNotConfigured { endpoint: String },

    /// Base URL or endpoint path could not form a valid request URI.
    #[error("Invalid provider configuration: {0}")]
    InvalidConfiguration(String),

    /// Non-2xx response or a transport failure.
    #[error("Provider request failed with HTTP {status}")]
    Http {
        query_id: String,
        status: u16,
        body: Option<String>,
    },

    /// The per-attempt deadline elapsed.
    #[error("Provider request timed out after {timeout:?}")]
    Timeout { query_id: String, timeout: Duration },

    /// The caller's cancellation token fired.
    #[error("Provider request was cancelled")]
    Cancelled { query_id: String },

    /// 2xx response whose body was not the expected JSON.
    #[error("Failed to deserialize provider response: {message}")]
    Deserialization {
        query_id: String,
        message: String,
        body: String,
    },

    /// Too many consecutive failures; the call was rejected without I/O.
    #[error("Provider circuit is open; retry in {retry_after:?}")]
    CircuitOpen {
        query_id: String,
        retry_after: Duration,
    },

    #[error("API client has been disposed")]
    Disposed,

    #[error("Unexpected API client failure: {message}")]
    Unexpected { query_id: String, message: String },
}

impl ApiClientError {
    /// Whether the retry policy may attempt the call again.
    ///
    /// Only non-success statuses, transport failures and timeouts qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Timeout { .. })
    }

    /// Whether the failure counts against the circuit breaker.
    pub fn is_circuit_failure(&self) -> bool {
        self.is_retryable()
    }

    /// Correlation id of the request that failed, when one was issued.
    pub fn query_id(&self) -> Option<&str> {
        match self {
            Self::Http { query_id, .. }
            | Self::Timeout { query_id, .. }
            | Self::Cancelled { query_id }
            | Self::Deserialization { query_id, .. }
            | Self::CircuitOpen { query_id, .. }
            | Self::Unexpected { query_id, .. } => Some(query_id),
            Self::EndpointNotConfigured { .. } | Self::InvalidConfiguration(_) | Self::Disposed => {
                None
            }
        }
    }

    /// HTTP status for [`ApiClientError::Http`].
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
