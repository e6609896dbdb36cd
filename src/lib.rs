//! FinnHub MCP Server Library
//!
//! This crate exposes FinnHub symbol search as a Model Context Protocol tool.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, the MCP server handler and transports
//! - **domains**: business logic organized by bounded contexts
//!   - **finnhub**: query model, API client with retry/circuit breaker, search service
//!   - **tools**: input validation and the `search-symbol` tool
//!
//! # Example
//!
//! ```rust,no_run
//! use finnhub_mcp_server::{core::McpServer, core::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config)?;
//!     // Start the server...
//!     server.shutdown();
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
