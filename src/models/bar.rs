//! Price bar models

use chrono::{DateTime, Utc};

/// A single closing price observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub close_price: f64,
}

/// Bars ordered by ascending timestamp with no duplicate timestamps.
///
/// Only `services::series_service` builds one, so the ordering holds for
/// every instance handed to the renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    bars: Vec<Bar>,
}

impl Series {
    /// Wrap bars that are already sorted and de-duplicated
    pub(crate) fn from_ordered(bars: Vec<Bar>) -> Self {
        debug_assert!(bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        Self { bars }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Lowest and highest close, or `None` for an empty series
    pub fn price_range(&self) -> Option<(f64, f64)> {
        let first = self.bars.first()?.close_price;
        Some(self.bars.iter().fold((first, first), |(lo, hi), bar| {
            (lo.min(bar.close_price), hi.max(bar.close_price))
        }))
    }
}
