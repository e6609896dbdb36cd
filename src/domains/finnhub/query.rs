//! Search query value object.
//!
//! A [`SearchQuery`] is built once per tool invocation from already-validated
//! input, handed to the API client, and dropped when the call completes.

use thiserror::Error;
use uuid::Uuid;

pub const DEFAULT_LIMIT: u32 = 10;
pub const MIN_LIMIT: u32 = 1;
pub const MAX_LIMIT: u32 = 100;
pub const MAX_QUERY_LENGTH: usize = 500;

const QUERY_ID_LENGTH: usize = 10;

/// Errors raised while assembling a [`SearchQuery`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("A search query is required")]
    MissingQuery,

    #[error("Invalid search query: {0}")]
    InvalidQuery(String),

    #[error("Limit {limit} is outside the allowed range 1-100")]
    LimitOutOfRange { limit: u32 },
}

impl QueryError {
    /// Name of the tool parameter this error refers to.
    pub fn parameter(&self) -> &'static str {
        match self {
            Self::MissingQuery | Self::InvalidQuery(_) => "query",
            Self::LimitOutOfRange { .. } => "limit",
        }
    }
}

/// Named inputs for [`SearchQuery::new`].
#[derive(Debug, Clone, Default)]
pub struct SearchQueryParams {
    pub query: Option<String>,
    pub exchange: Option<String>,
    pub limit: Option<u32>,
}

/// Immutable, validated symbol search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    query_id: String,
    query: String,
    exchange: Option<String>,
    limit: u32,
}

impl SearchQuery {
    /// Build a query from validated inputs, assigning a fresh correlation id.
    pub fn new(params: SearchQueryParams) -> Result<Self, QueryError> {
        let query = params.query.ok_or(QueryError::MissingQuery)?;

        let search_query = Self {
            query_id: new_query_id(),
            query,
            exchange: params.exchange,
            limit: params.limit.unwrap_or(DEFAULT_LIMIT),
        };
        search_query.validate()?;
        Ok(search_query)
    }

    /// Re-check the bounds the input validator already enforced.
    pub fn validate(&self) -> Result<(), QueryError> {
        let trimmed = self.query.trim();
        if trimmed.is_empty() {
            return Err(QueryError::InvalidQuery("query must not be blank".to_string()));
        }
        if trimmed.chars().count() > MAX_QUERY_LENGTH {
            return Err(QueryError::InvalidQuery(format!(
                "query must be at most {MAX_QUERY_LENGTH} characters"
            )));
        }
        if !(MIN_LIMIT..=MAX_LIMIT).contains(&self.limit) {
            return Err(QueryError::LimitOutOfRange { limit: self.limit });
        }
        Ok(())
    }

    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn exchange(&self) -> Option<&str> {
        self.exchange.as_deref()
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

/// Short hex correlation token used to follow one search through the logs.
fn new_query_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(QUERY_ID_LENGTH);
    id
}
