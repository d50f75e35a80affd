//! Graph request models

use chrono::Duration;

/// Smallest accepted width or height in pixels
pub const MIN_DIMENSION: u32 = 100;
/// Largest accepted width or height in pixels
pub const MAX_DIMENSION: u32 = 2000;

/// Time window covered by the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphDuration {
    Hour,
    #[default]
    Day,
    Week,
    Month,
}

/// Unit of a provider bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timespan {
    Minute,
    Hour,
    Day,
}

impl Timespan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timespan::Minute => "minute",
            Timespan::Hour => "hour",
            Timespan::Day => "day",
        }
    }
}

/// Bar size requested from the provider, e.g. 5 x minute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub multiplier: u32,
    pub timespan: Timespan,
}

impl GraphDuration {
    pub const SUPPORTED: &'static str = "hour, day, week, month";

    /// Parse a duration name, ignoring case
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "hour" => Some(GraphDuration::Hour),
            "day" => Some(GraphDuration::Day),
            "week" => Some(GraphDuration::Week),
            "month" => Some(GraphDuration::Month),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GraphDuration::Hour => "hour",
            GraphDuration::Day => "day",
            GraphDuration::Week => "week",
            GraphDuration::Month => "month",
        }
    }

    /// Length of the window ending at request time
    pub fn window(&self) -> Duration {
        match self {
            GraphDuration::Hour => Duration::hours(1),
            GraphDuration::Day => Duration::days(1),
            GraphDuration::Week => Duration::weeks(1),
            GraphDuration::Month => Duration::days(30),
        }
    }

    /// Bar resolution used for this window
    pub fn resolution(&self) -> Resolution {
        let (multiplier, timespan) = match self {
            GraphDuration::Hour => (1, Timespan::Minute),
            GraphDuration::Day => (5, Timespan::Minute),
            GraphDuration::Week => (1, Timespan::Hour),
            GraphDuration::Month => (1, Timespan::Day),
        };
        Resolution { multiplier, timespan }
    }
}

/// Output image dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ImageSize {
    fn default() -> Self {
        Self {
            width: 480,
            height: 480,
        }
    }
}

impl ImageSize {
    pub fn in_bounds(&self) -> bool {
        let range = MIN_DIMENSION..=MAX_DIMENSION;
        range.contains(&self.width) && range.contains(&self.height)
    }
}

/// A validated spark graph request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphRequest {
    pub ticker: String,
    pub duration: GraphDuration,
    pub size: ImageSize,
}
