//! Domains module containing business logic organized by bounded contexts.
//!
//! - **finnhub**: symbol search against the FinnHub REST API
//! - **tools**: MCP tool surface that validates input and calls into `finnhub`

pub mod finnhub;
pub mod tools;
