use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::{debug, info, warn};

use super::models::{AggregateBar, AggregatesResponse, ErrorResponse, PolygonError};
use crate::api::{BarQuery, MarketDataProvider};

/// Polygon.io aggregates (bars) API client
pub struct PolygonClient {
    http_client: HttpClient,
    api_key: String,
    base_url: String,
}

impl PolygonClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.polygon.io";
    /// Largest page the aggregates endpoint will return
    const RESULT_LIMIT: &'static str = "50000";

    /// Create a client. `base_url` is normally `DEFAULT_BASE_URL`; tests point it
    /// at a local server.
    pub fn new(
        api_key: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, PolygonError> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PolygonError::RequestError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Endpoint URL without the query string, safe to log
    fn aggregates_url(&self, query: &BarQuery) -> String {
        format!(
            "{}/v2/aggs/ticker/{}/range/{}/{}/{}/{}",
            self.base_url,
            query.ticker,
            query.multiplier,
            query.timespan.as_str(),
            query.from.timestamp_millis(),
            query.to.timestamp_millis(),
        )
    }

    /// Parse error response based on HTTP status code
    async fn handle_error_response(
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> PolygonError {
        let status_code = status.as_u16();
        let body_text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body_text)
            .ok()
            .and_then(|err| err.describe())
            .unwrap_or(body_text);

        match status_code {
            401 | 403 => PolygonError::Forbidden(message),
            404 => PolygonError::NotFound(message),
            429 => {
                warn!("Rate limited by Polygon: {}", message);
                PolygonError::RateLimited(message)
            }
            500..=599 => {
                warn!("Polygon server error {}: {}", status_code, message);
                PolygonError::ServerError(status_code, message)
            }
            _ => PolygonError::HttpError(status_code, message),
        }
    }

    /// GET /v2/aggs/ticker/{ticker}/range/{multiplier}/{timespan}/{from}/{to}
    ///
    /// `from` and `to` are sent as epoch milliseconds so short windows are not
    /// widened to whole calendar days. Bars come back sorted ascending and
    /// split-adjusted.
    ///
    /// # Returns
    /// * `Ok(Vec<AggregateBar>)` - Bars in the window, possibly empty
    /// * `Err(PolygonError)` - Status-specific error
    pub async fn get_aggregates(&self, query: &BarQuery) -> Result<Vec<AggregateBar>, PolygonError> {
        let url = self.aggregates_url(query);
        info!("Fetching from URL: {}", url);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("sort", "asc"),
                ("limit", Self::RESULT_LIMIT),
                ("adjusted", "true"),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PolygonError::Timeout
                } else {
                    PolygonError::RequestError(format!("Request failed: {}", e.without_url()))
                }
            })?;

        let status = response.status();
        debug!("Response status code: {}", status);

        if !status.is_success() {
            return Err(Self::handle_error_response(status, response).await);
        }

        let body = response.json::<AggregatesResponse>().await.map_err(|e| {
            if e.is_timeout() {
                PolygonError::Timeout
            } else {
                PolygonError::DeserializationError(format!(
                    "Failed to parse response: {}",
                    e.without_url()
                ))
            }
        })?;

        if body.status.as_deref() == Some("ERROR") {
            let message = body
                .error
                .or(body.message)
                .unwrap_or_else(|| "Unknown error".to_string());
            return Err(PolygonError::Rejected(message));
        }

        let results = body.results.unwrap_or_default();
        debug!(
            "Polygon API Response Status: {:?}, ticker: {:?}, resultsCount: {:?}, bars: {}",
            body.status,
            body.ticker,
            body.results_count,
            results.len()
        );

        Ok(results)
    }
}

#[async_trait]
impl MarketDataProvider for PolygonClient {
    async fn fetch_bars(&self, query: &BarQuery) -> Result<Vec<AggregateBar>, PolygonError> {
        self.get_aggregates(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Timespan;
    use axum::http::{StatusCode, Uri};
    use axum::Router;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Serve one canned response for every path, recording request URIs
    async fn serve_canned(
        status: StatusCode,
        body: serde_json::Value,
    ) -> (String, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        let app = Router::new().fallback(move |uri: Uri| {
            let recorder = recorder.clone();
            let body = body.clone();
            async move {
                recorder.lock().unwrap().push(uri.to_string());
                (status, axum::Json(body))
            }
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), seen)
    }

    fn client(base_url: String) -> PolygonClient {
        PolygonClient::new("test-key".to_string(), base_url, Duration::from_secs(5))
            .unwrap()
    }

    fn day_query(ticker: &str) -> BarQuery {
        BarQuery {
            ticker: ticker.to_string(),
            multiplier: 5,
            timespan: Timespan::Minute,
            from: Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
            to: Utc.timestamp_millis_opt(1_700_086_400_000).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_get_aggregates_builds_request() {
        let (base_url, seen) = serve_canned(
            StatusCode::OK,
            json!({
                "status": "OK",
                "ticker": "AAPL",
                "resultsCount": 2,
                "results": [
                    {"t": 1_700_000_000_000i64, "c": 189.5, "o": 189.0},
                    {"t": 1_700_000_300_000i64, "c": 190.25, "o": 189.5}
                ]
            }),
        )
        .await;

        let bars = client(base_url).get_aggregates(&day_query("AAPL")).await.unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, 190.25);

        let uris = seen.lock().unwrap();
        assert_eq!(uris.len(), 1);
        let uri = &uris[0];
        assert!(
            uri.starts_with("/v2/aggs/ticker/AAPL/range/5/minute/1700000000000/1700086400000?"),
            "{}",
            uri
        );
        for param in ["apiKey=test-key", "sort=asc", "limit=50000", "adjusted=true"] {
            assert!(uri.contains(param), "missing {} in {}", param, uri);
        }
    }

    #[tokio::test]
    async fn test_missing_results_is_empty() {
        let (base_url, _) = serve_canned(
            StatusCode::OK,
            json!({"status": "OK", "ticker": "AAPL", "resultsCount": 0}),
        )
        .await;

        let bars = client(base_url).get_aggregates(&day_query("AAPL")).await.unwrap();
        assert!(bars.is_empty());
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases = [
            (StatusCode::UNAUTHORIZED, "forbidden"),
            (StatusCode::FORBIDDEN, "forbidden"),
            (StatusCode::NOT_FOUND, "not_found"),
            (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            (StatusCode::BAD_GATEWAY, "server"),
            (StatusCode::BAD_REQUEST, "http"),
        ];

        for (status, expected) in cases {
            let (base_url, _) = serve_canned(
                status,
                json!({"status": "ERROR", "error": "Unknown API Key"}),
            )
            .await;

            let err = client(base_url).get_aggregates(&day_query("AAPL")).await.unwrap_err();
            let kind = match &err {
                PolygonError::Forbidden(msg) => {
                    assert_eq!(msg, "Unknown API Key");
                    "forbidden"
                }
                PolygonError::NotFound(_) => "not_found",
                PolygonError::RateLimited(_) => "rate_limited",
                PolygonError::ServerError(502, _) => "server",
                PolygonError::HttpError(400, _) => "http",
                other => panic!("unexpected error for {}: {:?}", status, other),
            };
            assert_eq!(kind, expected, "{}", status);
        }
    }

    #[tokio::test]
    async fn test_error_status_in_body_is_rejected() {
        let (base_url, _) = serve_canned(
            StatusCode::OK,
            json!({"status": "ERROR", "error": "Your plan doesn't include this data timeframe."}),
        )
        .await;

        let err = client(base_url).get_aggregates(&day_query("AAPL")).await.unwrap_err();
        assert!(matches!(err, PolygonError::Rejected(ref msg) if msg.contains("plan")));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let (base_url, _) = serve_canned(StatusCode::OK, json!({"results": "nope"})).await;

        let err = client(base_url).get_aggregates(&day_query("AAPL")).await.unwrap_err();
        assert!(matches!(err, PolygonError::DeserializationError(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(format!("http://{}", addr))
            .get_aggregates(&day_query("AAPL"))
            .await
            .unwrap_err();
        assert!(matches!(err, PolygonError::RequestError(_)));
    }
}
