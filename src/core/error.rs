//! Error types and handling for the MCP server.
//!
//! Startup and serving failures from every layer are folded into one
//! crate-wide error so the binary can report them uniformly.

use thiserror::Error;

/// A specialized Result type for MCP server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the MCP server.
#[derive(Debug, Error)]
pub enum Error {
    /// The FinnHub client could not be built from the configuration.
    #[error("FinnHub client error: {0}")]
    Client(#[from] crate::domains::finnhub::ApiClientError),

    /// Error originating from the transport layer.
    #[error("Transport error: {0}")]
    Transport(#[from] super::transport::TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transport::TransportError;
    use crate::domains::finnhub::ApiClientError;

    #[test]
    fn test_wraps_layer_errors() {
        let err: Error = ApiClientError::InvalidConfiguration("empty base URL".into()).into();
        assert!(err.to_string().starts_with("FinnHub client error"));

        let err: Error = TransportError::init("stdin closed").into();
        assert!(err.to_string().contains("stdin closed"));
    }
}
