//! Tool Registry - central registration and dispatch for all tools.
//!
//! This module provides:
//! - A registry of all available tools
//! - HTTP dispatch for tool calls (when http feature is enabled)
//! - Tool metadata for listing

use std::sync::Arc;
#[cfg(feature = "http")]
use tracing::warn;

use rmcp::model::Tool;

use super::definitions::SearchSymbolTool;
use crate::domains::finnhub::SearchService;

#[cfg(feature = "http")]
use super::ToolError;

/// Tool registry - manages all available tools.
pub struct ToolRegistry {
    #[cfg_attr(not(feature = "http"), allow(dead_code))]
    search_service: Arc<SearchService>,
}

impl ToolRegistry {
    /// Create a new tool registry.
    pub fn new(search_service: Arc<SearchService>) -> Self {
        Self { search_service }
    }

    /// Get all tool names.
    pub fn tool_names(&self) -> Vec<&'static str> {
        vec![SearchSymbolTool::NAME]
    }

    /// Get all tools as Tool models (metadata).
    pub fn get_all_tools() -> Vec<Tool> {
        vec![SearchSymbolTool::to_tool()]
    }

    /// Dispatch an HTTP tool call to the appropriate handler.
    #[cfg(feature = "http")]
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        match name {
            SearchSymbolTool::NAME => {
                SearchSymbolTool::http_handler(arguments, self.search_service.clone()).await
            }
            _ => {
                warn!("Unknown tool requested: {}", name);
                Err(ToolError::not_found(name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::FinnhubConfig;
    use crate::domains::finnhub::FinnhubClient;

    fn test_registry() -> ToolRegistry {
        let client = FinnhubClient::new(FinnhubConfig::default()).unwrap();
        ToolRegistry::new(Arc::new(SearchService::new(Arc::new(client))))
    }

    #[test]
    fn test_registry_tool_names() {
        let names = test_registry().tool_names();
        assert_eq!(names, vec!["search-symbol"]);
    }

    #[test]
    fn test_get_all_tools() {
        let tools = ToolRegistry::get_all_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name.as_ref(), SearchSymbolTool::NAME);
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn test_registry_call_unknown() {
        let result = test_registry()
            .call_tool("unknown", serde_json::json!({}))
            .await;
        assert!(matches!(result, Err(ToolError::NotFound(name)) if name == "unknown"));
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn test_registry_call_rejects_non_object_arguments() {
        let result = test_registry()
            .call_tool("search-symbol", serde_json::json!(["AAPL"]))
            .await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn test_registry_call_validation_error() {
        let result = test_registry()
            .call_tool("search-symbol", serde_json::json!({ "query": "<b>" }))
            .await
            .unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(result["structuredContent"]["error"], "ValidationError");
    }
}
