use std::time::Duration;

use tracing::info;

use crate::api::polygon::PolygonError;
use crate::api::{BarQuery, MarketDataProvider};
use crate::models::{GraphRequest, RenderedImage};
use crate::services::{chart_service, series_service};
use crate::utils::clock::Clock;
use crate::utils::errors::ServiceError;

/// Fetch bars for a validated request and render them.
///
/// The provider call is bounded by `timeout`; running out of time is a
/// provider error, the same as a transport timeout inside the client.
pub async fn generate_graph(
    provider: &dyn MarketDataProvider,
    clock: &dyn Clock,
    request: &GraphRequest,
    timeout: Duration,
) -> Result<RenderedImage, ServiceError> {
    let query = BarQuery::for_request(request, clock.now());
    info!(
        "Fetching {} x {} bars for {} ({})",
        query.multiplier,
        query.timespan.as_str(),
        query.ticker,
        request.duration.as_str()
    );

    let raw = tokio::time::timeout(timeout, provider.fetch_bars(&query))
        .await
        .map_err(|_| PolygonError::Timeout)??;
    info!("Results count: {}", raw.len());

    let series = series_service::build_series(raw)?;
    if series.is_empty() {
        info!("No bars for {} in window, rendering blank graph", request.ticker);
    }
    chart_service::render_spark_graph(series, request.size).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::polygon::AggregateBar;
    use crate::models::{GraphDuration, ImageSize};
    use crate::services::chart_service::tests::png_dimensions;
    use crate::utils::clock::FixedClock;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    struct SlowProvider;

    #[async_trait]
    impl MarketDataProvider for SlowProvider {
        async fn fetch_bars(&self, _query: &BarQuery) -> Result<Vec<AggregateBar>, PolygonError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
    }

    struct EmptyProvider;

    #[async_trait]
    impl MarketDataProvider for EmptyProvider {
        async fn fetch_bars(&self, _query: &BarQuery) -> Result<Vec<AggregateBar>, PolygonError> {
            Ok(Vec::new())
        }
    }

    fn request() -> GraphRequest {
        GraphRequest {
            ticker: "AAPL".to_string(),
            duration: GraphDuration::Day,
            size: ImageSize { width: 320, height: 160 },
        }
    }

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 3, 15, 16, 0, 0).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_timeout() {
        let err = generate_graph(&SlowProvider, &clock(), &request(), Duration::from_secs(30))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::ProviderError(PolygonError::Timeout)));
        assert_eq!(err.status_code().as_u16(), 500);
    }

    #[tokio::test]
    async fn test_empty_data_renders_blank_graph() {
        let image = generate_graph(&EmptyProvider, &clock(), &request(), Duration::from_secs(30))
            .await
            .unwrap();

        assert_eq!(png_dimensions(&image.bytes), (320, 160));
    }
}
