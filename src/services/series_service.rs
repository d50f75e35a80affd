use chrono::{TimeZone, Utc};

use crate::api::polygon::{AggregateBar, PolygonError};
use crate::models::{Bar, Series};
use crate::utils::errors::ServiceError;

/// Turn raw provider bars into a `Series`.
///
/// Bars are sorted by timestamp; when two share a timestamp the one that came
/// later in the provider response wins. An empty list gives an empty series.
pub fn build_series(raw: Vec<AggregateBar>) -> Result<Series, ServiceError> {
    let mut bars = raw
        .into_iter()
        .map(to_bar)
        .collect::<Result<Vec<Bar>, PolygonError>>()?;

    // Stable, so equal timestamps keep provider order
    bars.sort_by_key(|bar| bar.timestamp);

    let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match deduped.last_mut() {
            Some(last) if last.timestamp == bar.timestamp => *last = bar,
            _ => deduped.push(bar),
        }
    }

    Ok(Series::from_ordered(deduped))
}

fn to_bar(raw: AggregateBar) -> Result<Bar, PolygonError> {
    let timestamp = Utc
        .timestamp_millis_opt(raw.timestamp_ms)
        .single()
        .ok_or_else(|| {
            PolygonError::DeserializationError(format!("Invalid bar timestamp: {}", raw.timestamp_ms))
        })?;

    if !raw.close.is_finite() {
        return Err(PolygonError::DeserializationError(format!(
            "Invalid close price at {}",
            raw.timestamp_ms
        )));
    }

    Ok(Bar {
        timestamp,
        close_price: raw.close,
    })
}
