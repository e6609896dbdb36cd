//! Tools domain module.
//!
//! Tools are executable functions that MCP clients call by name.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `validation.rs` - Argument extraction and sanitization
//! - `response.rs` - Success and error content blocks
//! - `router.rs` - Dynamic ToolRouter builder for STDIO transport
//! - `registry.rs` - Central tool registry and HTTP dispatch
//! - `error.rs` - Tool-specific error types

pub mod definitions;
mod error;
mod registry;
pub mod response;
pub mod router;
pub mod validation;

pub use error::ToolError;
pub use registry::ToolRegistry;
pub use router::build_tool_router;
