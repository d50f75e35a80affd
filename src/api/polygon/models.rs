use serde::Deserialize;
use thiserror::Error;

/// One aggregate bar as returned by the aggregates endpoint.
///
/// The endpoint also sends open/high/low/volume fields; only the bar start
/// (`t`, epoch millis) and close (`c`) are kept.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AggregateBar {
    #[serde(rename = "t")]
    pub timestamp_ms: i64,
    #[serde(rename = "c")]
    pub close: f64,
}

/// Body of GET /v2/aggs/ticker/{ticker}/range/...
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatesResponse {
    pub status: Option<String>,
    pub ticker: Option<String>,
    pub results_count: Option<u64>,
    pub results: Option<Vec<AggregateBar>>,
    pub error: Option<String>,
    pub message: Option<String>,
}

/// Error payload sent with non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: Option<String>,
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn describe(&self) -> Option<String> {
        self.error.clone().or_else(|| self.message.clone())
    }
}

/// Errors from the Polygon aggregates API
#[derive(Debug, Clone, Error)]
pub enum PolygonError {
    /// 401/403, the API key was rejected
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// 404
    #[error("Not Found: {0}")]
    NotFound(String),
    /// 429
    #[error("Rate Limited: {0}")]
    RateLimited(String),
    /// 5xx
    #[error("Server Error ({0}): {1}")]
    ServerError(u16, String),
    /// Other non-2xx statuses
    #[error("HTTP Error ({0}): {1}")]
    HttpError(u16, String),
    #[error("Request timed out")]
    Timeout,
    #[error("Request Error: {0}")]
    RequestError(String),
    #[error("Deserialization Error: {0}")]
    DeserializationError(String),
    /// 200 response whose body reports `"status": "ERROR"`
    #[error("Rejected: {0}")]
    Rejected(String),
}
