//! MCP Server implementation and lifecycle management.
//!
//! This module contains the main server handler that implements the MCP
//! protocol by delegating tool calls to the routes built in
//! `domains/tools/router.rs`.

use rmcp::{
    ErrorData as McpError, ServerHandler, handler::server::tool::ToolRouter, model::*,
    tool_handler,
};
use std::sync::Arc;
use tracing::info;

use super::config::Config;
use super::error::Result as ServerResult;
use crate::domains::{
    finnhub::{CircuitState, FinnhubClient, SearchService},
    tools::build_tool_router,
};

#[cfg(feature = "http")]
use crate::domains::tools::ToolRegistry;

/// The main MCP server handler.
///
/// Cloned per connection; all clones share one FinnHub client, and with it
/// one connection pool and one circuit breaker.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Owner handle for disposal on shutdown.
    client: Arc<FinnhubClient>,

    /// Service behind the `search-symbol` tool.
    #[cfg_attr(not(feature = "http"), allow(dead_code))]
    search_service: Arc<SearchService>,

    /// Tool router for handling tool calls.
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    /// Create a new MCP server with the given configuration.
    pub fn new(config: Config) -> ServerResult<Self> {
        let config = Arc::new(config);

        let client = Arc::new(FinnhubClient::new(config.finnhub.clone())?);
        let search_service = Arc::new(SearchService::new(client.clone()));

        Ok(Self {
            tool_router: build_tool_router::<Self>(search_service.clone()),
            config,
            client,
            search_service,
        })
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Current state of the shared provider circuit breaker.
    pub fn circuit_state(&self) -> CircuitState {
        self.client.circuit_breaker().state()
    }

    /// Release the FinnHub connection pool. Safe to call more than once.
    pub fn shutdown(&self) {
        info!("Releasing FinnHub client");
        self.client.dispose();
    }

    // ========================================================================
    // HTTP Transport Support Methods
    // ========================================================================

    /// List all available tools (for HTTP transport).
    pub fn list_tools(&self) -> Vec<serde_json::Value> {
        self.tool_router
            .list_all()
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "title": t.title,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect()
    }

    /// Call a tool by name (for HTTP transport).
    #[cfg(feature = "http")]
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, McpError> {
        let registry = ToolRegistry::new(self.search_service.clone());
        registry
            .call_tool(name, arguments)
            .await
            .map_err(McpError::from)
    }
}

/// ServerHandler implementation with tool_handler macro for automatic tool routing.
#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "FinnHub symbol search. Call `search-symbol` with a `query` (ticker or company \
                 name), an optional `exchange` code and an optional `limit` (1-100)."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
