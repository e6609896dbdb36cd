//! Tool Router - builds the rmcp ToolRouter.
//!
//! This module builds the ToolRouter for STDIO transport by delegating
//! to the tool definitions themselves. Each tool knows how to create its own route.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;

use super::definitions::SearchSymbolTool;
use crate::domains::finnhub::SearchService;

/// Build the tool router with all registered tools.
pub fn build_tool_router<S>(search_service: Arc<SearchService>) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    ToolRouter::new().with_route(SearchSymbolTool::create_route(search_service))
}
