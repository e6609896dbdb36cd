//! FinnHub symbol search domain.
//!
//! Data flows leaf to root:
//! - `query` - validated, immutable [`SearchQuery`] with a correlation id
//! - `client` - HTTP call with retry and circuit breaker (`policy`), typed failures (`error`)
//! - `models` - provider DTOs and the normalized [`SearchResponse`]
//! - `service` - classifies client outcomes into a [`ServiceResult`]

pub mod client;
pub mod error;
pub mod models;
pub mod policy;
pub mod query;
pub mod result;
pub mod service;

pub use client::{FinnhubClient, SymbolSearchClient};
pub use error::ApiClientError;
pub use models::{DomainSymbol, ProviderSymbol, SearchResponse};
pub use policy::{CircuitBreaker, CircuitState, RetryPolicy};
pub use query::{QueryError, SearchQuery, SearchQueryParams};
pub use result::{ErrorType, ServiceResult};
pub use service::{SearchService, SearchServiceError};
