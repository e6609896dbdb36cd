//! Symbol search service.
//!
//! Classifies API client outcomes into a [`ServiceResult`], keeping "no
//! results" distinct from provider failures. Cancellation, configuration
//! defects and unclassified failures are not folded into the envelope; they
//! are returned as [`SearchServiceError`] for the caller to handle.

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use super::client::SymbolSearchClient;
use super::error::ApiClientError;
use super::models::SearchResponse;
use super::query::SearchQuery;
use super::result::{ErrorType, ServiceResult};

pub const NOT_FOUND_MESSAGE: &str = "No search symbol(s) found.";
pub const UNAVAILABLE_MESSAGE: &str = "Symbol search service is unavailable";
pub const TIMEOUT_MESSAGE: &str = "Request timed out";
pub const INVALID_RESPONSE_MESSAGE: &str = "Invalid response from service";
pub const UNKNOWN_MESSAGE: &str = "Symbol search failed unexpectedly";

/// Outcomes the service refuses to turn into a failure envelope.
#[derive(Debug, Clone, Error)]
pub enum SearchServiceError {
    #[error("Symbol search was cancelled")]
    Cancelled { query_id: String },

    #[error("Symbol search is misconfigured: {0}")]
    Configuration(String),

    #[error("Unexpected symbol search failure: {message}")]
    Unexpected {
        query_id: Option<String>,
        message: String,
    },
}

/// Application service for symbol search.
#[derive(Clone)]
pub struct SearchService {
    client: Arc<dyn SymbolSearchClient>,
}

impl SearchService {
    pub fn new(client: Arc<dyn SymbolSearchClient>) -> Self {
        Self { client }
    }

    /// Search for symbols matching `query`.
    #[instrument(skip_all, fields(query_id = %query.query_id(), query = %query.query()))]
    pub async fn search_symbols(
        &self,
        query: &SearchQuery,
        cancellation: &CancellationToken,
    ) -> Result<ServiceResult<SearchResponse>, SearchServiceError> {
        info!("Starting symbol search");

        let outcome = self.client.search_symbols(query, cancellation).await;
        Self::classify(query, outcome)
    }

    fn classify(
        query: &SearchQuery,
        outcome: Result<SearchResponse, ApiClientError>,
    ) -> Result<ServiceResult<SearchResponse>, SearchServiceError> {
        let error = match outcome {
            Ok(response) if response.has_results() => {
                info!(
                    "Found {} symbol(s) for '{}'",
                    response.total_count(),
                    query.query()
                );
                return Ok(ServiceResult::success(response));
            }
            Ok(_) => {
                info!("No symbols found for '{}'", query.query());
                return Ok(ServiceResult::failure(NOT_FOUND_MESSAGE, ErrorType::NotFound));
            }
            Err(e) => e,
        };

        let result = match error {
            ApiClientError::Http { status, .. } => {
                warn!("Provider unavailable for '{}' (HTTP {})", query.query(), status);
                ServiceResult::failure(UNAVAILABLE_MESSAGE, ErrorType::ServiceUnavailable)
            }
            ApiClientError::CircuitOpen { retry_after, .. } => {
                warn!(
                    "Provider circuit open for '{}' (retry in {:?})",
                    query.query(),
                    retry_after
                );
                ServiceResult::failure(UNAVAILABLE_MESSAGE, ErrorType::ServiceUnavailable)
            }
            ApiClientError::Timeout { .. } => {
                warn!("Symbol search timed out for '{}'", query.query());
                ServiceResult::failure(TIMEOUT_MESSAGE, ErrorType::Timeout)
            }
            ApiClientError::Deserialization { message, .. } => {
                error!("Invalid provider response for '{}': {}", query.query(), message);
                ServiceResult::failure(INVALID_RESPONSE_MESSAGE, ErrorType::InvalidResponse)
            }
            ApiClientError::Cancelled { query_id } => {
                warn!("Symbol search cancelled for '{}'", query.query());
                return Err(SearchServiceError::Cancelled { query_id });
            }
            e @ (ApiClientError::EndpointNotConfigured { .. }
            | ApiClientError::InvalidConfiguration(_)) => {
                error!("Symbol search misconfigured for '{}': {}", query.query(), e);
                return Err(SearchServiceError::Configuration(e.to_string()));
            }
            ApiClientError::Unexpected { query_id, message } => {
                error!("Unexpected failure for '{}': {}", query.query(), message);
                return Err(SearchServiceError::Unexpected {
                    query_id: Some(query_id),
                    message,
                });
            }
            e @ ApiClientError::Disposed => {
                error!("Symbol search failed for '{}': {}", query.query(), e);
                ServiceResult::failure(UNKNOWN_MESSAGE, ErrorType::Unknown)
            }
        };

        Ok(result)
    }
}
