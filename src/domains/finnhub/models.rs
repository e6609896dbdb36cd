//! Provider DTOs and the normalized domain model for symbol search.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::time::Duration;

/// Identifies where search results came from.
pub const SOURCE: &str = "FinnHub";

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from the provider `/search` endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ProviderSearchResponse {
    #[serde(default)]
    pub count: Option<i64>,
    #[serde(default)]
    pub result: Option<Vec<ProviderSymbol>>,
}

/// Individual search result item, exactly as the provider sent it.
///
/// Every field is optional; the wire format may use camelCase or snake_case.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderSymbol {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "displaySymbol", alias = "display_symbol")]
    pub display_symbol: Option<String>,
    /// Security type (e.g., "Common Stock", "ETF")
    #[serde(default, rename = "type")]
    pub security_type: Option<String>,
}

// ============================================================================
// Domain Model
// ============================================================================

/// A symbol with every field populated; missing provider values become `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainSymbol {
    pub symbol: String,
    pub description: String,
    pub display_symbol: String,
    #[serde(rename = "type")]
    pub security_type: String,
}

impl From<ProviderSymbol> for DomainSymbol {
    fn from(raw: ProviderSymbol) -> Self {
        let symbol = raw.symbol.unwrap_or_default();
        let display_symbol = raw.display_symbol.unwrap_or_else(|| symbol.clone());
        Self {
            description: raw.description.unwrap_or_default(),
            security_type: raw.security_type.unwrap_or_default(),
            display_symbol,
            symbol,
        }
    }
}

/// Outcome of one successful provider round-trip.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    query: String,
    query_id: String,
    symbols: Vec<DomainSymbol>,
    total_count: usize,
    has_results: bool,
    #[serde(serialize_with = "serialize_duration_ms")]
    search_duration: Duration,
    search_timestamp: DateTime<Utc>,
    source: &'static str,
    is_from_cache: bool,
}

impl SearchResponse {
    pub fn new(
        query: impl Into<String>,
        query_id: impl Into<String>,
        symbols: Vec<DomainSymbol>,
        search_duration: Duration,
        search_timestamp: DateTime<Utc>,
    ) -> Self {
        let total_count = symbols.len();
        Self {
            query: query.into(),
            query_id: query_id.into(),
            symbols,
            total_count,
            has_results: total_count > 0,
            search_duration,
            search_timestamp,
            source: SOURCE,
            is_from_cache: false,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    pub fn symbols(&self) -> &[DomainSymbol] {
        &self.symbols
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn has_results(&self) -> bool {
        self.has_results
    }

    pub fn search_duration(&self) -> Duration {
        self.search_duration
    }

    pub fn search_timestamp(&self) -> DateTime<Utc> {
        self.search_timestamp
    }

    pub fn source(&self) -> &str {
        self.source
    }

    pub fn is_from_cache(&self) -> bool {
        self.is_from_cache
    }
}

fn serialize_duration_ms<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}
