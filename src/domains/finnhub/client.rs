//! FinnHub HTTP API client.
//!
//! Turns a [`SearchQuery`] into a GET against the configured `search-symbol`
//! endpoint, runs it through the circuit breaker and retry policy, and maps
//! every outcome into either a [`SearchResponse`] or an [`ApiClientError`].
//!
//! API documentation: https://finnhub.io/docs/api/symbol-search

use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::error::{ApiClientError, NO_RESPONSE_STATUS};
use super::models::{DomainSymbol, ProviderSearchResponse, SearchResponse};
use super::policy::{CircuitBreaker, CircuitBreakerConfig, RetryPolicy};
use super::query::SearchQuery;
use crate::core::config::{EndpointConfig, FinnhubConfig, SEARCH_SYMBOL_ENDPOINT};

/// Header carrying the provider API key; keeps the key out of logged URIs.
pub const TOKEN_HEADER: &str = "X-Finnhub-Token";

const MAX_IDLE_PER_HOST: usize = 10;
/// Retires connections that sit idle this long. reqwest has no maximum
/// connection lifetime, so a connection in steady use is kept until the
/// server closes it.
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Anything that can answer a symbol search.
#[async_trait]
pub trait SymbolSearchClient: Send + Sync {
    async fn search_symbols(
        &self,
        query: &SearchQuery,
        cancellation: &CancellationToken,
    ) -> Result<SearchResponse, ApiClientError>;
}

/// Pooled HTTP client for the FinnHub API.
///
/// One instance is shared by all concurrent tool invocations, together with
/// its circuit breaker. Pooled connections are only recycled when idle (see
/// `POOL_IDLE_TIMEOUT`); DNS changes reach busy connections only after the
/// server drops them.
pub struct FinnhubClient {
    http: RwLock<Option<Client>>,
    options: FinnhubConfig,
    timeout: Duration,
    retry: RetryPolicy,
    breaker: Arc<CircuitBreaker>,
}

impl FinnhubClient {
    /// Create a client with the retry and circuit breaker settings from `options`.
    pub fn new(options: FinnhubConfig) -> Result<Self, ApiClientError> {
        let retry = RetryPolicy::from(&options.retry);
        let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig::from(
            &options.circuit_breaker,
        )));
        Self::with_policies(options, retry, breaker)
    }

    /// Create a client with explicit policies.
    ///
    /// Pass the same breaker to several clients to make them share one
    /// upstream's circuit state.
    pub fn with_policies(
        options: FinnhubConfig,
        retry: RetryPolicy,
        breaker: Arc<CircuitBreaker>,
    ) -> Result<Self, ApiClientError> {
        if options.base_url.trim().is_empty() {
            return Err(ApiClientError::InvalidConfiguration(
                "FinnHub base URL is empty".to_string(),
            ));
        }

        let timeout = options.timeout();
        let mut builder = Client::builder()
            .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT);
        if !timeout.is_zero() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| {
            ApiClientError::InvalidConfiguration(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            http: RwLock::new(Some(http)),
            options,
            timeout,
            retry,
            breaker,
        })
    }

    pub fn circuit_breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Release the connection pool. Calling this more than once is a no-op.
    pub fn dispose(&self) {
        let mut http = self.http.write().unwrap_or_else(PoisonError::into_inner);
        if http.take().is_some() {
            info!("FinnHub client disposed");
        } else {
            debug!("FinnHub client already disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.http
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    fn http_client(&self) -> Result<Client, ApiClientError> {
        self.http
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ApiClientError::Disposed)
    }

    fn resolve_endpoint(&self) -> Result<&EndpointConfig, ApiClientError> {
        self.options
            .active_endpoint(SEARCH_SYMBOL_ENDPOINT)
            .ok_or_else(|| {
                error!("No active '{}' endpoint configured", SEARCH_SYMBOL_ENDPOINT);
                ApiClientError::EndpointNotConfigured {
                    endpoint: SEARCH_SYMBOL_ENDPOINT.to_string(),
                }
            })
    }

    /// `{base_url}/{endpoint}?q={query}[&exchange={exchange}]`
    fn build_url(
        &self,
        endpoint: &EndpointConfig,
        query: &SearchQuery,
    ) -> Result<Url, ApiClientError> {
        let raw = format!(
            "{}/{}",
            self.options.base_url.trim_end_matches('/'),
            endpoint.url.trim_start_matches('/')
        );
        let mut url = Url::parse(&raw).map_err(|e| {
            ApiClientError::InvalidConfiguration(format!("Invalid endpoint URL '{}': {}", raw, e))
        })?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query.query());
            if let Some(exchange) = query.exchange() {
                pairs.append_pair("exchange", exchange);
            }
        }

        Ok(url)
    }

    /// Run attempts until one succeeds, a non-retryable error occurs, or the
    /// retry budget is spent.
    async fn send_with_retry(
        &self,
        http: &Client,
        url: &Url,
        query_id: &str,
        cancellation: &CancellationToken,
    ) -> Result<String, ApiClientError> {
        let mut attempt = 0;
        loop {
            let result = tokio::select! {
                biased;
                _ = cancellation.cancelled() => Err(cancelled(query_id)),
                result = self.send_once(http, url, query_id) => result,
            };

            match result {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.backoff(attempt);
                    warn!(
                        "Attempt {}/{} failed: {}; retrying in {:?}",
                        attempt,
                        self.retry.max_attempts(),
                        e,
                        delay
                    );
                    tokio::select! {
                        biased;
                        _ = cancellation.cancelled() => return Err(cancelled(query_id)),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// A single GET. The response and its body are dropped on every path.
    async fn send_once(
        &self,
        http: &Client,
        url: &Url,
        query_id: &str,
    ) -> Result<String, ApiClientError> {
        let mut request = http.get(url.clone());
        if let Some(api_key) = &self.options.api_key {
            request = request.header(TOKEN_HEADER, api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.map_transport_error(e, query_id))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e, query_id))?;

        if status.is_client_error() {
            warn!("FinnHub returned {}: {}", status, body);
        } else if !status.is_success() {
            error!("FinnHub returned {}: {}", status, body);
        }

        if !status.is_success() {
            return Err(ApiClientError::Http {
                query_id: query_id.to_string(),
                status: status.as_u16(),
                body: Some(body),
            });
        }

        debug!("FinnHub response received: {} bytes", body.len());
        Ok(body)
    }

    fn map_transport_error(&self, e: reqwest::Error, query_id: &str) -> ApiClientError {
        if e.is_timeout() {
            warn!("FinnHub request timed out after {:?}", self.timeout);
            ApiClientError::Timeout {
                query_id: query_id.to_string(),
                timeout: self.timeout,
            }
        } else if e.is_builder() {
            error!("Failed to build FinnHub request: {}", e);
            ApiClientError::Unexpected {
                query_id: query_id.to_string(),
                message: e.to_string(),
            }
        } else {
            warn!("FinnHub transport failure: {}", e);
            ApiClientError::Http {
                query_id: query_id.to_string(),
                status: e.status().map(|s| s.as_u16()).unwrap_or(NO_RESPONSE_STATUS),
                body: None,
            }
        }
    }

    fn parse_response(
        query: &SearchQuery,
        body: &str,
        started_at: Instant,
        timestamp: DateTime<Utc>,
    ) -> Result<SearchResponse, ApiClientError> {
        let parsed: ProviderSearchResponse = serde_json::from_str(body).map_err(|e| {
            error!("Failed to deserialize FinnHub response: {}", e);
            ApiClientError::Deserialization {
                query_id: query.query_id().to_string(),
                message: e.to_string(),
                body: body.to_string(),
            }
        })?;

        let symbols: Vec<DomainSymbol> = parsed
            .result
            .unwrap_or_default()
            .into_iter()
            .take(query.limit() as usize)
            .map(DomainSymbol::from)
            .collect();

        if symbols.is_empty() {
            info!("FinnHub returned no symbols");
        } else {
            info!(
                "FinnHub returned {} symbol(s) (provider count: {:?})",
                symbols.len(),
                parsed.count
            );
        }

        Ok(SearchResponse::new(
            query.query(),
            query.query_id(),
            symbols,
            started_at.elapsed(),
            timestamp,
        ))
    }
}

#[async_trait]
impl SymbolSearchClient for FinnhubClient {
    #[instrument(skip_all, fields(query_id = %query.query_id()))]
    async fn search_symbols(
        &self,
        query: &SearchQuery,
        cancellation: &CancellationToken,
    ) -> Result<SearchResponse, ApiClientError> {
        let started_at = Instant::now();
        let timestamp = Utc::now();

        let http = self.http_client()?;
        let endpoint = self.resolve_endpoint()?;
        let url = self.build_url(endpoint, query)?;

        if cancellation.is_cancelled() {
            warn!("Symbol search cancelled before the request was sent");
            return Err(cancelled(query.query_id()));
        }

        info!("Searching FinnHub symbols: GET {}", url);

        if let Err(retry_after) = self.breaker.try_acquire() {
            warn!("FinnHub circuit open; rejecting request for {:?}", retry_after);
            return Err(ApiClientError::CircuitOpen {
                query_id: query.query_id().to_string(),
                retry_after,
            });
        }

        let outcome = self
            .send_with_retry(&http, &url, query.query_id(), cancellation)
            .await
            .and_then(|body| Self::parse_response(query, &body, started_at, timestamp));

        match &outcome {
            Ok(_) => self.breaker.record_success(),
            Err(e) if e.is_circuit_failure() => self.breaker.record_failure(),
            Err(e) => {
                if matches!(e, ApiClientError::Cancelled { .. }) {
                    warn!("Symbol search cancelled by caller");
                }
                self.breaker.release_trial();
            }
        }

        outcome
    }
}

fn cancelled(query_id: &str) -> ApiClientError {
    ApiClientError::Cancelled {
        query_id: query_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::finnhub::policy::CircuitState;
    use crate::domains::finnhub::query::SearchQueryParams;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_options(base_url: &str) -> FinnhubConfig {
        FinnhubConfig {
            base_url: base_url.to_string(),
            api_key: Some("test-api-key".to_string()),
            timeout_seconds: 5,
            ..Default::default()
        }
    }

    fn empty_result() -> serde_json::Value {
        serde_json::json!({"count": 0, "result": []})
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    fn test_client(server: &MockServer) -> FinnhubClient {
        FinnhubClient::with_policies(
            test_options(&server.uri()),
            fast_retry(),
            Arc::new(CircuitBreaker::default()),
        )
        .unwrap()
    }

    fn query(text: &str) -> SearchQuery {
        SearchQuery::new(SearchQueryParams {
            query: Some(text.to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_successful_search_with_mock() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "AAPL"))
            .and(header(TOKEN_HEADER, "test-api-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 1,
                "result": [{
                    "description": "APPLE INC",
                    "displaySymbol": "AAPL",
                    "symbol": "AAPL",
                    "type": "Common Stock"
                }]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);
        let q = query("AAPL");
        let response = client
            .search_symbols(&q, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(response.total_count(), 1);
        assert!(response.has_results());
        assert_eq!(response.query_id(), q.query_id());
        assert_eq!(response.symbols()[0].description, "APPLE INC");
        assert_eq!(response.symbols()[0].security_type, "Common Stock");
        assert_eq!(client.circuit_breaker().state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_concurrent_calls_share_one_client() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(empty_result()))
            .expect(8)
            .mount(&mock_server)
            .await;

        let client = Arc::new(test_client(&mock_server));
        let calls = (0..8).map(|_| {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .search_symbols(&query("AAPL"), &CancellationToken::new())
                    .await
            })
        });

        for call in futures::future::join_all(calls).await {
            assert!(call.unwrap().is_ok());
        }
        assert_eq!(client.circuit_breaker().state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_exchange_is_forwarded() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "apple inc"))
            .and(query_param("exchange", "US"))
            .respond_with(ResponseTemplate::new(200).set_body_json(empty_result()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);
        let q = SearchQuery::new(SearchQueryParams {
            query: Some("apple inc".to_string()),
            exchange: Some("US".to_string()),
            limit: None,
        })
        .unwrap();

        let response = client
            .search_symbols(&q, &CancellationToken::new())
            .await
            .unwrap();
        assert!(!response.has_results());
    }

    #[tokio::test]
    async fn test_limit_truncates_results_in_order() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 3,
                "result": [{"symbol": "A"}, {"symbol": "B"}, {"symbol": "C"}]
            })))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);
        let q = SearchQuery::new(SearchQueryParams {
            query: Some("x".to_string()),
            exchange: None,
            limit: Some(2),
        })
        .unwrap();

        let response = client
            .search_symbols(&q, &CancellationToken::new())
            .await
            .unwrap();
        let symbols: Vec<_> = response.symbols().iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["A", "B"]);
        assert_eq!(response.total_count(), 2);
    }

    #[tokio::test]
    async fn test_missing_result_array_is_empty_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"count": 0})))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);
        let response = client
            .search_symbols(&query("AAPL"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.total_count(), 0);
    }

    #[tokio::test]
    async fn test_retries_exactly_three_times_on_503() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .expect(4)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);
        let err = client
            .search_symbols(&query("AAPL"), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            ApiClientError::Http { status, body, .. } => {
                assert_eq!(status, 503);
                assert_eq!(body.as_deref(), Some("unavailable"));
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_client_error_is_typed_http() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);
        let err = client
            .search_symbols(&query("AAPL"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn test_circuit_opens_after_three_failing_calls() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(12)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);
        let token = CancellationToken::new();
        for _ in 0..3 {
            let err = client.search_symbols(&query("AAPL"), &token).await.unwrap_err();
            assert_eq!(err.status(), Some(500));
        }
        assert_eq!(client.circuit_breaker().state(), CircuitState::Open);

        let err = client.search_symbols(&query("AAPL"), &token).await.unwrap_err();
        assert!(matches!(err, ApiClientError::CircuitOpen { .. }));
        // MockServer verifies on drop that no fourth batch of sends happened.
    }

    #[tokio::test]
    async fn test_deserialization_failure_keeps_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);
        let err = client
            .search_symbols(&query("AAPL"), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            ApiClientError::Deserialization { body, .. } => assert_eq!(body, "<html>oops</html>"),
            other => panic!("expected Deserialization error, got {other:?}"),
        }
        assert_eq!(client.circuit_breaker().consecutive_failures(), 0);
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_sends_nothing() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);
        let token = CancellationToken::new();
        token.cancel();

        let err = client.search_symbols(&query("AAPL"), &token).await.unwrap_err();
        assert!(matches!(err, ApiClientError::Cancelled { .. }));
    }

    #[tokio::test]
    async fn test_cancel_during_request_is_not_timeout() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server);
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });

        let err = client.search_symbols(&query("AAPL"), &token).await.unwrap_err();
        assert!(matches!(err, ApiClientError::Cancelled { .. }));
        assert_eq!(client.circuit_breaker().consecutive_failures(), 0);
    }

    #[tokio::test]
    async fn test_provider_hang_is_timeout() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"count": 0, "result": []}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let options = FinnhubConfig {
            timeout_seconds: 1,
            ..test_options(&mock_server.uri())
        };
        let client = FinnhubClient::with_policies(
            options,
            RetryPolicy {
                max_retries: 0,
                base_delay: Duration::from_millis(1),
            },
            Arc::new(CircuitBreaker::default()),
        )
        .unwrap();

        let err = client
            .search_symbols(&query("AAPL"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiClientError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_timeout_is_retried_then_surfaced() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .expect(4)
            .mount(&mock_server)
            .await;

        let options = FinnhubConfig {
            timeout_seconds: 1,
            ..test_options(&mock_server.uri())
        };
        let client =
            FinnhubClient::with_policies(options, fast_retry(), Arc::new(CircuitBreaker::default()))
                .unwrap();

        let err = client
            .search_symbols(&query("AAPL"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiClientError::Timeout { .. }));
        assert_eq!(client.circuit_breaker().consecutive_failures(), 1);
    }

    #[tokio::test]
    async fn test_cancel_during_backoff_stops_sending() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = FinnhubClient::with_policies(
            test_options(&mock_server.uri()),
            RetryPolicy {
                max_retries: 3,
                base_delay: Duration::from_secs(10),
            },
            Arc::new(CircuitBreaker::default()),
        )
        .unwrap();

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            canceller.cancel();
        });

        let started = Instant::now();
        let err = client.search_symbols(&query("AAPL"), &token).await.unwrap_err();
        assert!(matches!(err, ApiClientError::Cancelled { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(client.circuit_breaker().consecutive_failures(), 0);
    }

    fn tripping_client(server: &MockServer) -> FinnhubClient {
        FinnhubClient::with_policies(
            test_options(&server.uri()),
            RetryPolicy {
                max_retries: 0,
                base_delay: Duration::from_millis(1),
            },
            Arc::new(CircuitBreaker::new(CircuitBreakerConfig {
                failure_threshold: 1,
                cooldown: Duration::from_millis(100),
            })),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_circuit_reopens_then_closes_after_cooldown() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .expect(2)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "count": 1,
                "result": [{"symbol": "AAPL"}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = tripping_client(&mock_server);
        let token = CancellationToken::new();

        assert!(client.search_symbols(&query("AAPL"), &token).await.is_err());
        assert_eq!(client.circuit_breaker().state(), CircuitState::Open);
        let err = client.search_symbols(&query("AAPL"), &token).await.unwrap_err();
        assert!(matches!(err, ApiClientError::CircuitOpen { .. }));

        // Half-open trial call still fails: the circuit opens again.
        tokio::time::sleep(Duration::from_millis(150)).await;
        let err = client.search_symbols(&query("AAPL"), &token).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(client.circuit_breaker().state(), CircuitState::Open);

        tokio::time::sleep(Duration::from_millis(150)).await;
        let response = client.search_symbols(&query("AAPL"), &token).await.unwrap();
        assert!(response.has_results());
        assert_eq!(client.circuit_breaker().state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_unparsable_trial_keeps_circuit_half_open() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(empty_result()))
            .mount(&mock_server)
            .await;

        let client = tripping_client(&mock_server);
        let token = CancellationToken::new();

        assert!(client.search_symbols(&query("AAPL"), &token).await.is_err());
        tokio::time::sleep(Duration::from_millis(150)).await;

        let err = client.search_symbols(&query("AAPL"), &token).await.unwrap_err();
        assert!(matches!(err, ApiClientError::Deserialization { .. }));
        assert_eq!(client.circuit_breaker().state(), CircuitState::HalfOpen);

        // The released trial slot goes to the next caller.
        client.search_symbols(&query("AAPL"), &token).await.unwrap();
        assert_eq!(client.circuit_breaker().state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_connection_refused_maps_to_http_500() {
        // Nothing listens on port 9 (discard) in the test environment.
        let client = FinnhubClient::with_policies(
            test_options("http://127.0.0.1:9"),
            RetryPolicy {
                max_retries: 0,
                base_delay: Duration::from_millis(1),
            },
            Arc::new(CircuitBreaker::default()),
        )
        .unwrap();

        let err = client
            .search_symbols(&query("AAPL"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(NO_RESPONSE_STATUS));
    }

    #[tokio::test]
    async fn test_inactive_endpoint_fails_before_io() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let mut options = test_options(&mock_server.uri());
        for endpoint in &mut options.endpoints {
            endpoint.is_active = false;
        }
        let client = FinnhubClient::new(options).unwrap();

        let err = client
            .search_symbols(&query("AAPL"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiClientError::EndpointNotConfigured { .. }));
    }

    #[tokio::test]
    async fn test_dispose_is_idempotent_and_blocks_calls() {
        let client = FinnhubClient::new(test_options("http://127.0.0.1:9")).unwrap();
        assert!(!client.is_disposed());

        client.dispose();
        client.dispose();
        assert!(client.is_disposed());

        let err = client
            .search_symbols(&query("AAPL"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiClientError::Disposed));
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let result = FinnhubClient::new(FinnhubConfig {
            base_url: "  ".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(ApiClientError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_build_url_encodes_query() {
        let client = FinnhubClient::new(test_options("https://finnhub.io/api/v1/")).unwrap();
        let q = SearchQuery::new(SearchQueryParams {
            query: Some("apple inc".to_string()),
            exchange: Some("US".to_string()),
            limit: None,
        })
        .unwrap();
        let endpoint = client.resolve_endpoint().unwrap();
        let url = client.build_url(endpoint, &q).unwrap();
        assert_eq!(
            url.as_str(),
            "https://finnhub.io/api/v1/search?q=apple+inc&exchange=US"
        );
        assert!(!url.as_str().contains("test-api-key"));
    }
}
