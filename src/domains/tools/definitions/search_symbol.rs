//! FinnHub symbol search tool.
//!
//! Validates the raw arguments, builds a [`SearchQuery`], runs it through the
//! [`SearchService`], and renders the outcome as tool content. Validation
//! failures and cancellation become error blocks; configuration defects and
//! unclassified failures escape as [`ToolError`].

use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, JsonObject, Tool},
};
use schemars::JsonSchema;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::domains::finnhub::query::{DEFAULT_LIMIT, MAX_LIMIT, MIN_LIMIT};
use crate::domains::finnhub::{SearchQuery, SearchQueryParams, SearchService, SearchServiceError};
use crate::domains::tools::ToolError;
use crate::domains::tools::response::{json_success, operation_error, validation_error};
use crate::domains::tools::validation::{
    QUERY_MAX_LENGTH, QUERY_MIN_LENGTH, ValidationError, validate_and_get_exchange,
    validate_and_get_limit, validate_and_get_query,
};

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the symbol search tool.
///
/// Only used to publish the input schema; arguments are read through the
/// validators so malformed values get parameter-specific errors.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchSymbolParams {
    /// Free-text search (ticker, company name, ISIN, CUSIP).
    #[schemars(
        description = "Search text: letters, digits, spaces, '-', '_' and '.' only",
        length(min = 1, max = 500)
    )]
    pub query: String,

    /// Restrict results to one exchange code (e.g. "US").
    #[schemars(description = "Exchange code filter (optional)", length(min = 1, max = 50))]
    #[serde(default)]
    pub exchange: Option<String>,

    /// Maximum number of results (default: 10, max: 100).
    #[schemars(
        description = "Maximum number of results (default: 10, max: 100)",
        range(min = 1, max = 100)
    )]
    #[serde(default)]
    pub limit: Option<u32>,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Symbol search tool backed by the FinnHub `/search` endpoint.
pub struct SearchSymbolTool;

impl SearchSymbolTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "search-symbol";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Search FinnHub for stock symbols by ticker, company name, ISIN or CUSIP. Returns a result envelope whose `data` lists matching symbols, or `is_success: false` with error_type NotFound when nothing matches.";

    /// Run one invocation.
    #[instrument(skip_all, fields(tool = "search-symbol"))]
    pub async fn execute(
        args: &JsonObject,
        service: &SearchService,
        cancellation: &CancellationToken,
    ) -> Result<CallToolResult, ToolError> {
        let started = Instant::now();
        trace!("Invoked with {} argument(s)", args.len());

        let params = match Self::resolve_params(args) {
            Ok(params) => params,
            Err(e) => {
                warn!("Validation failed for '{}': {}", e.parameter(), e);
                return Ok(validation_error(e.parameter(), &e.to_string()));
            }
        };
        debug!(
            "Resolved parameters: query={:?}, exchange={:?}, limit={:?}",
            params.query, params.exchange, params.limit
        );

        let query = match SearchQuery::new(params) {
            Ok(query) => query,
            Err(e) => {
                warn!("Query rejected for '{}': {}", e.parameter(), e);
                return Ok(validation_error(e.parameter(), &e.to_string()));
            }
        };

        let outcome = service.search_symbols(&query, cancellation).await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(result) => {
                info!(
                    query_id = query.query_id(),
                    "Search completed in {:?} (success: {})",
                    elapsed,
                    result.is_success()
                );
                Ok(json_success(&result))
            }
            Err(SearchServiceError::Cancelled { query_id }) => {
                warn!(query_id = %query_id, "Search cancelled after {:?}", elapsed);
                Ok(operation_error("search", "The search operation was cancelled"))
            }
            Err(SearchServiceError::Configuration(message)) => {
                error!(query_id = query.query_id(), "Search misconfigured: {}", message);
                Err(ToolError::Configuration(message))
            }
            Err(e @ SearchServiceError::Unexpected { .. }) => {
                error!(query_id = query.query_id(), "Search failed after {:?}: {}", elapsed, e);
                Err(ToolError::execution_failed(e.to_string()))
            }
        }
    }

    fn resolve_params(args: &JsonObject) -> Result<SearchQueryParams, ValidationError> {
        let query = validate_and_get_query(args, "query", QUERY_MIN_LENGTH, QUERY_MAX_LENGTH)?;
        let exchange = validate_and_get_exchange(args, "exchange")?;
        let limit = validate_and_get_limit(args, "limit", DEFAULT_LIMIT, MIN_LIMIT, MAX_LIMIT)?;

        Ok(SearchQueryParams {
            query: Some(query),
            exchange,
            limit: Some(limit),
        })
    }

    /// HTTP handler for this tool (for HTTP transport).
    #[cfg(feature = "http")]
    pub async fn http_handler(
        arguments: serde_json::Value,
        service: Arc<SearchService>,
    ) -> Result<serde_json::Value, ToolError> {
        let args = match arguments {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => JsonObject::new(),
            other => {
                return Err(ToolError::invalid_arguments(format!(
                    "expected a JSON object, got {}",
                    other
                )));
            }
        };

        let result = Self::execute(&args, &service, &CancellationToken::new()).await?;

        let mut response = serde_json::json!({
            "content": result.content,
            "isError": result.is_error.unwrap_or(false)
        });

        if let (Some(structured), Some(object)) =
            (result.structured_content, response.as_object_mut())
        {
            object.insert("structuredContent".to_string(), structured);
        }

        Ok(response)
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<SearchSymbolParams>(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: Some("Search Symbol".into()),
        }
    }

    /// Create a ToolRoute for STDIO transport.
    pub fn create_route<S>(service: Arc<SearchService>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        ToolRoute::new_dyn(Self::to_tool(), move |ctx: ToolCallContext<'_, S>| {
            let args = ctx.arguments.clone().unwrap_or_default();
            let cancellation = ctx.request_context.ct.clone();
            let service = service.clone();
            async move {
                Self::execute(&args, &service, &cancellation)
                    .await
                    .map_err(McpError::from)
            }
            .boxed()
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
