//! Outbound market data access

pub mod polygon;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{GraphRequest, Timespan};
use polygon::{AggregateBar, PolygonError};

/// A fully resolved request for price bars
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarQuery {
    pub ticker: String,
    pub multiplier: u32,
    pub timespan: Timespan,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl BarQuery {
    /// Resolve the window for `request` ending at `now`
    pub fn for_request(request: &GraphRequest, now: DateTime<Utc>) -> Self {
        let resolution = request.duration.resolution();
        Self {
            ticker: request.ticker.clone(),
            multiplier: resolution.multiplier,
            timespan: resolution.timespan,
            from: now - request.duration.window(),
            to: now,
        }
    }
}

/// Anything that can answer a `BarQuery` with raw aggregate bars
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_bars(&self, query: &BarQuery) -> Result<Vec<AggregateBar>, PolygonError>;
}
