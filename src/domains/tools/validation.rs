//! Input validation for tool arguments.
//!
//! Tool calls arrive as an untyped JSON object. These functions pull single
//! parameters out of it, sanitize them, and enforce length bounds and
//! character allowlists. This is the only place caller strings are screened
//! for injection-style content.

use std::sync::LazyLock;

use regex::Regex;
use rmcp::model::JsonObject;
use serde_json::Value;
use thiserror::Error;

/// Letters, digits, space, `-`, `_` and `.` only.
static QUERY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9 \-_.]{1,500}$").expect("valid query regex"));

/// Uppercase letters, digits, `-` and `_` only.
static EXCHANGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9\-_]{1,50}$").expect("valid exchange regex"));

pub const QUERY_MIN_LENGTH: usize = 1;
pub const QUERY_MAX_LENGTH: usize = 500;
pub const EXCHANGE_MAX_LENGTH: usize = 50;

/// A tool argument that violates its documented constraints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Parameter '{parameter}' is required")]
    MissingParameter { parameter: String },

    #[error("Parameter '{parameter}' must be between {min} and {max} characters (got {actual})")]
    InvalidLength {
        parameter: String,
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("Parameter '{parameter}' contains invalid characters")]
    InvalidCharacters { parameter: String },

    #[error("Parameter '{parameter}' must be between {min} and {max} (got {value})")]
    OutOfRange {
        parameter: String,
        min: i64,
        max: i64,
        value: i64,
    },
}

impl ValidationError {
    /// Name of the offending parameter.
    pub fn parameter(&self) -> &str {
        match self {
            Self::MissingParameter { parameter }
            | Self::InvalidLength { parameter, .. }
            | Self::InvalidCharacters { parameter }
            | Self::OutOfRange { parameter, .. } => parameter,
        }
    }
}

/// Textual form of an argument; absent, null, blank, and structured values
/// count as missing.
fn text_argument(args: &JsonObject, name: &str) -> Option<String> {
    let text = match args.get(name)? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    if text.trim().is_empty() { None } else { Some(text) }
}

fn check_length(
    parameter: &str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual < min || actual > max {
        return Err(ValidationError::InvalidLength {
            parameter: parameter.to_string(),
            min,
            max,
            actual,
        });
    }
    Ok(())
}

/// Required free-text parameter, trimmed and checked against the allowlist.
pub fn validate_and_get_query(
    args: &JsonObject,
    parameter: &str,
    min: usize,
    max: usize,
) -> Result<String, ValidationError> {
    let raw = text_argument(args, parameter).ok_or_else(|| ValidationError::MissingParameter {
        parameter: parameter.to_string(),
    })?;

    let value = raw.trim();
    check_length(parameter, value, min, max)?;

    if !QUERY_PATTERN.is_match(value) {
        return Err(ValidationError::InvalidCharacters {
            parameter: parameter.to_string(),
        });
    }

    Ok(value.to_string())
}

/// Optional exchange code, trimmed and uppercased. Missing or blank is `Ok(None)`.
pub fn validate_and_get_exchange(
    args: &JsonObject,
    parameter: &str,
) -> Result<Option<String>, ValidationError> {
    let Some(raw) = text_argument(args, parameter) else {
        return Ok(None);
    };

    let value = raw.trim().to_uppercase();
    check_length(parameter, &value, 1, EXCHANGE_MAX_LENGTH)?;

    if !EXCHANGE_PATTERN.is_match(&value) {
        return Err(ValidationError::InvalidCharacters {
            parameter: parameter.to_string(),
        });
    }

    Ok(Some(value))
}

/// Optional integer limit. Missing or unparsable input yields `default`;
/// a parsed value outside `[min, max]` is an error.
pub fn validate_and_get_limit(
    args: &JsonObject,
    parameter: &str,
    default: u32,
    min: u32,
    max: u32,
) -> Result<u32, ValidationError> {
    let parsed = match args.get(parameter) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    let Some(value) = parsed else {
        return Ok(default);
    };

    if value < i64::from(min) || value > i64::from(max) {
        return Err(ValidationError::OutOfRange {
            parameter: parameter.to_string(),
            min: i64::from(min),
            max: i64::from(max),
            value,
        });
    }

    // In range of a u32 by the check above.
    Ok(value as u32)
}
