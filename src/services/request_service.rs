use serde::Deserialize;

use crate::models::graph::{MAX_DIMENSION, MIN_DIMENSION};
use crate::models::{GraphDuration, GraphRequest, ImageSize};
use crate::utils::errors::ServiceError;

const MAX_TICKER_LEN: usize = 32;

/// Raw query parameters as they arrive on the request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphQuery {
    pub ticker: Option<String>,
    pub duration: Option<String>,
    pub size: Option<String>,
}

/// Validate every parameter before anything touches the network
pub fn validate_request(query: &GraphQuery) -> Result<GraphRequest, ServiceError> {
    Ok(GraphRequest {
        ticker: parse_ticker(query.ticker.as_deref())?,
        duration: parse_duration(query.duration.as_deref())?,
        size: parse_size(query.size.as_deref())?,
    })
}

/// Upper-case the ticker. Letters, digits and `.` `-` `:` are accepted
/// (e.g. `BRK.B`, `X:BTCUSD`).
pub fn parse_ticker(raw: Option<&str>) -> Result<String, ServiceError> {
    let ticker = raw.map(str::trim).unwrap_or_default().to_uppercase();

    if ticker.is_empty() {
        return Err(ServiceError::invalid("ticker", "Missing required parameter: ticker"));
    }

    let well_formed = ticker.len() <= MAX_TICKER_LEN
        && ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':'));
    if !well_formed {
        return Err(ServiceError::invalid("ticker", format!("Invalid ticker: {}", ticker)));
    }

    Ok(ticker)
}

/// The default applies only when the parameter is absent
pub fn parse_duration(raw: Option<&str>) -> Result<GraphDuration, ServiceError> {
    match raw {
        None => Ok(GraphDuration::default()),
        Some(value) => GraphDuration::parse(value).ok_or_else(|| {
            ServiceError::invalid(
                "duration",
                format!(
                    "Invalid duration: {}. Supported: {}",
                    value,
                    GraphDuration::SUPPORTED
                ),
            )
        }),
    }
}

/// Parse `WIDTHxHEIGHT`, both within [100, 2000]
pub fn parse_size(raw: Option<&str>) -> Result<ImageSize, ServiceError> {
    let Some(value) = raw else {
        return Ok(ImageSize::default());
    };

    let size = value
        .trim()
        .split_once('x')
        .and_then(|(w, h)| Some(ImageSize {
            width: parse_dimension(w)?,
            height: parse_dimension(h)?,
        }))
        .ok_or_else(|| {
            ServiceError::invalid("size", "Invalid size format. Use WIDTHxHEIGHT (e.g., 480x480)")
        })?;

    if !size.in_bounds() {
        return Err(ServiceError::invalid(
            "size",
            format!(
                "Size must be between {min}x{min} and {max}x{max}",
                min = MIN_DIMENSION,
                max = MAX_DIMENSION
            ),
        ));
    }

    Ok(size)
}

/// Plain decimal digits only. Values too large for `u32` saturate so they
/// fail the bounds check rather than the format check.
fn parse_dimension(raw: &str) -> Option<u32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value = raw.parse::<u64>().unwrap_or(u64::MAX);
    Some(u32::try_from(value).unwrap_or(u32::MAX))
}
