//! Tool definitions module.
//!
//! This module exports all available tool definitions.
//! Each tool is defined in its own file for better maintainability.

pub mod search_symbol;

pub use search_symbol::{SearchSymbolParams, SearchSymbolTool};
